use chrono::{DateTime, FixedOffset, Local};

use crate::error::{ClientError, Result};
use crate::query::Query;
use crate::timestamp::resolve_timestamp;

/// Options for a container log request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogsOptions {
    /// Include the container's stdout.
    pub show_stdout: bool,
    /// Include the container's stderr.
    pub show_stderr: bool,
    /// Only entries at or after this time (duration, date/time or Unix timestamp).
    pub since: Option<String>,
    /// Only entries before this time.
    pub until: Option<String>,
    /// Prefix every line with its timestamp.
    pub timestamps: bool,
    /// Include extra attributes supplied by the log driver.
    pub details: bool,
    /// Keep the stream open and deliver new output as it is produced.
    pub follow: bool,
    /// Number of lines from the end, or `all`.
    pub tail: String,
}

impl Default for LogsOptions {
    fn default() -> Self {
        Self {
            show_stdout: false,
            show_stderr: false,
            since: None,
            until: None,
            timestamps: false,
            details: false,
            follow: false,
            tail: "all".to_string(),
        }
    }
}

impl LogsOptions {
    /// Check `since`/`until` against the local clock without building a request.
    pub fn validate(&self) -> Result<()> {
        self.to_query(&Local::now().fixed_offset()).map(drop)
    }

    /// Build the request query, resolving `since`/`until` against `now`.
    ///
    /// `tail` is always present; flags appear only when enabled.
    pub fn to_query(&self, now: &DateTime<FixedOffset>) -> Result<Query> {
        let mut query = Query::new();
        if self.show_stdout {
            query.set("stdout", "1");
        }
        if self.show_stderr {
            query.set("stderr", "1");
        }
        if let Some(since) = non_empty(&self.since) {
            let ts = resolve_timestamp(since, now).map_err(|source| {
                ClientError::InvalidTimestamp {
                    field: "since",
                    source,
                }
            })?;
            query.set("since", ts);
        }
        if let Some(until) = non_empty(&self.until) {
            let ts = resolve_timestamp(until, now).map_err(|source| {
                ClientError::InvalidTimestamp {
                    field: "until",
                    source,
                }
            })?;
            query.set("until", ts);
        }
        if self.timestamps {
            query.set("timestamps", "1");
        }
        if self.details {
            query.set("details", "1");
        }
        if self.follow {
            query.set("follow", "1");
        }
        query.set("tail", self.tail.as_str());
        Ok(query)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-01-02T03:04:05+00:00").unwrap()
    }

    #[test]
    fn stdout_stderr_tail_all() {
        let opts = LogsOptions {
            show_stdout: true,
            show_stderr: true,
            tail: "all".into(),
            ..LogsOptions::default()
        };
        assert_eq!(
            opts.to_query(&now()).unwrap().encode(),
            "stdout=1&stderr=1&tail=all"
        );
    }

    #[test]
    fn tail_always_present() {
        let unset = LogsOptions::default();
        assert_eq!(unset.to_query(&now()).unwrap().encode(), "tail=all");

        let set = LogsOptions {
            tail: "25".into(),
            ..LogsOptions::default()
        };
        assert_eq!(set.to_query(&now()).unwrap().get("tail"), Some("25"));

        let empty = LogsOptions {
            tail: String::new(),
            ..LogsOptions::default()
        };
        assert!(empty.to_query(&now()).unwrap().contains("tail"));
    }

    #[test]
    fn each_flag_maps_to_one_parameter() {
        let flags: [(&str, fn(&mut LogsOptions)); 5] = [
            ("stdout", |o| o.show_stdout = true),
            ("stderr", |o| o.show_stderr = true),
            ("timestamps", |o| o.timestamps = true),
            ("details", |o| o.details = true),
            ("follow", |o| o.follow = true),
        ];

        for (key, enable) in flags {
            let mut opts = LogsOptions::default();
            let query = opts.to_query(&now()).unwrap();
            assert!(!query.contains(key), "{key} should be absent when off");

            enable(&mut opts);
            let query = opts.to_query(&now()).unwrap();
            assert_eq!(query.get(key), Some("1"), "{key} should be 1 when on");
            assert_eq!(query.len(), 2, "only {key} and tail expected");
        }
    }

    #[test]
    fn all_parameters_in_wire_order() {
        let opts = LogsOptions {
            show_stdout: true,
            show_stderr: true,
            since: Some("10m".into()),
            until: Some("1700000000".into()),
            timestamps: true,
            details: true,
            follow: true,
            tail: "5".into(),
        };
        let since = (now().timestamp() - 600).to_string();
        assert_eq!(
            opts.to_query(&now()).unwrap().encode(),
            format!(
                "stdout=1&stderr=1&since={since}&until=1700000000&timestamps=1&details=1&follow=1&tail=5"
            )
        );
    }

    #[test]
    fn empty_since_is_ignored() {
        let opts = LogsOptions {
            since: Some(String::new()),
            ..LogsOptions::default()
        };
        assert!(!opts.to_query(&now()).unwrap().contains("since"));
    }

    #[test]
    fn invalid_since_and_until_name_the_field() {
        let opts = LogsOptions {
            since: Some("not-a-time".into()),
            ..LogsOptions::default()
        };
        match opts.to_query(&now()) {
            Err(ClientError::InvalidTimestamp { field, .. }) => assert_eq!(field, "since"),
            other => panic!("unexpected: {other:?}"),
        }

        let opts = LogsOptions {
            until: Some("soon".into()),
            ..LogsOptions::default()
        };
        match opts.to_query(&now()) {
            Err(ClientError::InvalidTimestamp { field, .. }) => assert_eq!(field, "until"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn validate_checks_both_bounds() {
        assert!(LogsOptions::default().validate().is_ok());

        let opts = LogsOptions {
            since: Some("1h".into()),
            until: Some("2024-99-99".into()),
            ..LogsOptions::default()
        };
        assert!(matches!(
            opts.validate(),
            Err(ClientError::InvalidTimestamp { field: "until", .. })
        ));
    }
}
