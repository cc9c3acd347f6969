//! Ordered URL query parameters.

use std::fmt;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Query parameters, emitted in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`, replacing an existing value in place.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some(pair) => pair.1 = value,
            None => self.pairs.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `application/x-www-form-urlencoded` form (no leading `?`).
    pub fn encode(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.iter())
            .finish()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Everything except RFC 3986 unreserved characters.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode `input` for use as a single path segment.
pub fn encode_path_segment(input: &str) -> String {
    utf8_percent_encode(input, PATH_SEGMENT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_insertion_order() {
        let mut q = Query::new();
        q.set("stdout", "1");
        q.set("stderr", "1");
        q.set("tail", "all");
        assert_eq!(q.encode(), "stdout=1&stderr=1&tail=all");
    }

    #[test]
    fn set_replaces_in_place() {
        let mut q = Query::new();
        q.set("a", "1");
        q.set("b", "2");
        q.set("a", "3");
        assert_eq!(q.to_string(), "a=3&b=2");
        assert_eq!(q.len(), 2);
        assert_eq!(q.get("a"), Some("3"));
    }

    #[test]
    fn encodes_reserved_query_characters() {
        let mut q = Query::new();
        q.set("since", "1700000000.5");
        q.set("k", "a b&c=d");
        assert_eq!(q.encode(), "since=1700000000.5&k=a+b%26c%3Dd");
    }

    #[test]
    fn path_segments_escape_separators() {
        assert_eq!(encode_path_segment("my-container_1.2~x"), "my-container_1.2~x");
        assert_eq!(encode_path_segment("a b"), "a%20b");
        assert_eq!(encode_path_segment("µ"), "%C2%B5");
        assert_eq!(encode_path_segment("my/container"), "my%2Fcontainer");
    }

    #[test]
    fn empty_value_still_emitted() {
        let mut q = Query::new();
        q.set("tail", "");
        assert!(q.contains("tail"));
        assert_eq!(q.encode(), "tail=");
    }
}
