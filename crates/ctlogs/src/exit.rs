use std::fmt;
use std::io;

use ctlogs_client::{ClientError, StreamCancelled};
use ctlogs_frame::FrameError;
use ctlogs_transport::TransportError;

// Exit code constants aligned with rsfulmen/DDR-0002 semantics.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const HEALTH_CHECK_FAILED: i32 = 30;
pub const NOT_FOUND: i32 = 44;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;
pub const CANCELLED: i32 = 130;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    if StreamCancelled::is(&err) {
        return CliError::new(CANCELLED, format!("{context}: {err}"));
    }
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::NotFound | io::ErrorKind::ConnectionRefused => TRANSPORT_ERROR,
        // Reader went away (`ctlogs logs c1 | head`).
        io::ErrorKind::BrokenPipe => SUCCESS,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Connect { source, .. } | TransportError::Io(source) => {
            io_error(context, source)
        }
        TransportError::InvalidEndpoint { .. } | TransportError::PathTooLong { .. } => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::PayloadTooLarge { .. }
        | FrameError::InvalidStreamType(_)
        | FrameError::Truncated { .. } => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        FrameError::Daemon(_) | FrameError::ConnectionClosed => {
            CliError::new(FAILURE, format!("{context}: {err}"))
        }
    }
}

pub fn client_error(context: &str, err: ClientError) -> CliError {
    match err {
        ClientError::InvalidTimestamp { .. } => CliError::new(USAGE, format!("{context}: {err}")),
        ClientError::Transport(err) => transport_error(context, err),
        ClientError::Protocol(_) | ClientError::Json(_) => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        ClientError::NotFound { .. } => CliError::new(NOT_FOUND, format!("{context}: {err}")),
        ClientError::Status { status, .. } if status == 401 || status == 403 => {
            CliError::new(PERMISSION_DENIED, format!("{context}: {err}"))
        }
        ClientError::Status { .. } => CliError::new(FAILURE, format!("{context}: {err}")),
        ClientError::Copy(err) => frame_error(context, err),
        ClientError::Cancelled => CliError::new(CANCELLED, format!("{context}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_44() {
        let err = client_error(
            "logs failed",
            ClientError::NotFound {
                kind: "container",
                id: "c1".into(),
            },
        );
        assert_eq!(err.code, NOT_FOUND);
        assert_eq!(err.message, "logs failed: No such container: c1");
    }

    #[test]
    fn missing_socket_is_transport_error() {
        let err = client_error(
            "ping failed",
            ClientError::Transport(TransportError::Connect {
                endpoint: "unix:///nope.sock".into(),
                source: io::Error::from(io::ErrorKind::NotFound),
            }),
        );
        assert_eq!(err.code, TRANSPORT_ERROR);
    }

    #[test]
    fn denied_socket_is_permission_error() {
        let err = transport_error(
            "connect failed",
            TransportError::Connect {
                endpoint: "unix:///var/run/docker.sock".into(),
                source: io::Error::from(io::ErrorKind::PermissionDenied),
            },
        );
        assert_eq!(err.code, PERMISSION_DENIED);
    }

    #[test]
    fn cancellation_paths_map_to_130() {
        assert_eq!(client_error("x", ClientError::Cancelled).code, CANCELLED);
        let aborted = ClientError::Copy(FrameError::Io(io::Error::new(
            io::ErrorKind::ConnectionAborted,
            StreamCancelled,
        )));
        assert_eq!(client_error("x", aborted).code, CANCELLED);

        let reset = ClientError::Copy(FrameError::Io(io::Error::from(
            io::ErrorKind::ConnectionAborted,
        )));
        assert_eq!(client_error("x", reset).code, INTERNAL);
    }

    #[test]
    fn daemon_status_codes() {
        let forbidden = ClientError::Status {
            status: 403,
            message: "denied".into(),
        };
        assert_eq!(client_error("x", forbidden).code, PERMISSION_DENIED);

        let broken = ClientError::Status {
            status: 500,
            message: "boom".into(),
        };
        assert_eq!(client_error("x", broken).code, FAILURE);
    }
}
