use ctlogs_transport::{Endpoint, TransportError};

/// Environment variables consulted by [`ClientConfig::from_env`], highest
/// precedence first.
pub const HOST_VARS: [&str; 2] = ["CTLOGS_HOST", "DOCKER_HOST"];
pub const API_VERSION_VARS: [&str; 2] = ["CTLOGS_API_VERSION", "DOCKER_API_VERSION"];

/// Connection settings for a [`DaemonClient`](crate::DaemonClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub endpoint: Endpoint,
    /// API version prefix (`1.43`), without the leading `v`. `None` lets the
    /// daemon pick its default.
    pub api_version: Option<String>,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: Endpoint::default(),
            api_version: None,
            user_agent: default_user_agent(),
        }
    }
}

impl ClientConfig {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            ..Self::default()
        }
    }

    /// Build a config from the process environment.
    pub fn from_env() -> Result<Self, TransportError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, TransportError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |vars: &[&str]| {
            vars.iter()
                .filter_map(|key| lookup(*key))
                .find(|value| !value.trim().is_empty())
        };

        let mut config = Self::default();
        if let Some(host) = first(&HOST_VARS) {
            config.endpoint = Endpoint::parse(&host)?;
        }
        if let Some(version) = first(&API_VERSION_VARS) {
            config = config.with_api_version(version);
        }
        Ok(config)
    }

    /// Set the API version, tolerating a leading `v`.
    pub fn with_api_version(mut self, version: impl AsRef<str>) -> Self {
        let version = version.as_ref().trim();
        let version = version.strip_prefix('v').unwrap_or(version);
        self.api_version = (!version.is_empty()).then(|| version.to_string());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

fn default_user_agent() -> String {
    format!("ctlogs/{}", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_to_local_socket() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(
            config.endpoint,
            Endpoint::Unix(PathBuf::from("/var/run/docker.sock"))
        );
        assert_eq!(config.api_version, None);
        assert!(config.user_agent.starts_with("ctlogs/"));
    }

    #[test]
    fn ctlogs_vars_take_precedence() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("DOCKER_HOST", "tcp://10.0.0.1:2375"),
            ("CTLOGS_HOST", "unix:///tmp/ct.sock"),
            ("DOCKER_API_VERSION", "1.41"),
            ("CTLOGS_API_VERSION", "v1.43"),
        ]))
        .unwrap();
        assert_eq!(config.endpoint, Endpoint::Unix(PathBuf::from("/tmp/ct.sock")));
        assert_eq!(config.api_version.as_deref(), Some("1.43"));
    }

    #[test]
    fn empty_values_fall_through() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("CTLOGS_HOST", ""),
            ("DOCKER_HOST", "tcp://127.0.0.1:2376"),
        ]))
        .unwrap();
        assert_eq!(
            config.endpoint,
            Endpoint::Tcp {
                host: "127.0.0.1".into(),
                port: 2376
            }
        );
    }

    #[test]
    fn bad_host_is_an_error() {
        let err = ClientConfig::from_lookup(lookup(&[("DOCKER_HOST", "ssh://box")])).unwrap_err();
        assert!(matches!(err, TransportError::InvalidEndpoint { .. }));
    }

    #[test]
    fn blank_api_version_clears_it() {
        let config = ClientConfig::default().with_api_version("1.40").with_api_version(" ");
        assert_eq!(config.api_version, None);
    }
}
