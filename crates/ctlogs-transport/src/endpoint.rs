use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Result, TransportError};

/// Default TCP port for a plaintext daemon listener.
pub const DEFAULT_TCP_PORT: u16 = 2375;

/// Where the container daemon listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Filesystem-path Unix domain socket.
    Unix(PathBuf),
    /// Plain TCP (no TLS).
    Tcp { host: String, port: u16 },
}

impl Endpoint {
    /// Socket path used when nothing else is configured.
    pub const DEFAULT_UNIX_SOCKET: &'static str = "/var/run/docker.sock";

    /// Maximum socket path length.
    /// Unix `sockaddr_un.sun_path` is typically 108 bytes on Linux, 104 on macOS.
    #[cfg(target_os = "linux")]
    pub const MAX_PATH_LEN: usize = 108;
    #[cfg(not(target_os = "linux"))]
    pub const MAX_PATH_LEN: usize = 104;

    /// Parse an endpoint string.
    ///
    /// Accepted forms:
    /// - `unix:///var/run/docker.sock`
    /// - `tcp://127.0.0.1:2375`, `http://localhost:2375`, `tcp://[::1]:2375`
    /// - a bare absolute socket path (`/run/user/1000/docker.sock`)
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(TransportError::invalid(input, "endpoint must not be empty"));
        }

        if let Some(path) = trimmed.strip_prefix("unix://") {
            return Self::unix(input, path);
        }
        if trimmed.starts_with('/') {
            return Self::unix(input, trimmed);
        }

        let authority = trimmed
            .strip_prefix("tcp://")
            .or_else(|| trimmed.strip_prefix("http://"));
        let Some(authority) = authority else {
            let scheme = trimmed.split("://").next().unwrap_or(trimmed);
            return Err(TransportError::invalid(
                input,
                format!("unsupported scheme {scheme:?} (expected unix, tcp or http)"),
            ));
        };

        // A trailing slash is tolerated; any other base path is not.
        let authority = authority.strip_suffix('/').unwrap_or(authority);
        if authority.contains('/') {
            return Err(TransportError::invalid(input, "base paths are not supported"));
        }

        let (host, port) = split_host_port(input, authority)?;
        Ok(Self::Tcp { host, port })
    }

    fn unix(input: &str, path: &str) -> Result<Self> {
        if path.is_empty() || !path.starts_with('/') {
            return Err(TransportError::invalid(
                input,
                "unix socket path must be absolute",
            ));
        }

        let path = PathBuf::from(path);
        let len = path.as_os_str().len();
        if len >= Self::MAX_PATH_LEN {
            return Err(TransportError::PathTooLong {
                path,
                len,
                max: Self::MAX_PATH_LEN,
            });
        }
        Ok(Self::Unix(path))
    }

    /// Value for the HTTP `Host` header.
    ///
    /// Unix sockets have no authority, so the daemon convention `docker` is used.
    pub fn host_header(&self) -> String {
        match self {
            Self::Unix(_) => "docker".to_string(),
            Self::Tcp { host, port } if host.contains(':') => format!("[{host}]:{port}"),
            Self::Tcp { host, port } => format!("{host}:{port}"),
        }
    }

    /// The socket path for Unix endpoints.
    pub fn socket_path(&self) -> Option<&Path> {
        match self {
            Self::Unix(path) => Some(path),
            Self::Tcp { .. } => None,
        }
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        match self {
            Self::Unix(_) => "unix-domain-socket",
            Self::Tcp { .. } => "tcp",
        }
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::Unix(PathBuf::from(Self::DEFAULT_UNIX_SOCKET))
    }
}

impl FromStr for Endpoint {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unix(path) => write!(f, "unix://{}", path.display()),
            Self::Tcp { .. } => write!(f, "tcp://{}", self.host_header()),
        }
    }
}

fn split_host_port(input: &str, authority: &str) -> Result<(String, u16)> {
    let (host, port) = if let Some(rest) = authority.strip_prefix('[') {
        let Some((host, tail)) = rest.split_once(']') else {
            return Err(TransportError::invalid(input, "unterminated IPv6 address"));
        };
        let port = match tail {
            "" => None,
            tail => match tail.strip_prefix(':') {
                Some(port) => Some(port),
                None => return Err(TransportError::invalid(input, "malformed port")),
            },
        };
        (host, port)
    } else {
        match authority.rsplit_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (authority, None),
        }
    };

    if host.is_empty() {
        return Err(TransportError::invalid(input, "missing host"));
    }

    let port = match port {
        Some(port) => port
            .parse::<u16>()
            .map_err(|_| TransportError::invalid(input, format!("invalid port {port:?}")))?,
        None => DEFAULT_TCP_PORT,
    };

    Ok((host.to_string(), port))
}
