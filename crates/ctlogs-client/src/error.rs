use crate::http::HttpError;
use crate::timestamp::TimestampError;

/// Errors that can occur in client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// A `since`/`until` value could not be resolved. Raised before any
    /// network activity.
    #[error("invalid value for \"{field}\": {source}")]
    InvalidTimestamp {
        field: &'static str,
        #[source]
        source: TimestampError,
    },

    /// Connecting to the daemon failed.
    #[error("transport error: {0}")]
    Transport(#[from] ctlogs_transport::TransportError),

    /// The daemon's response could not be read or parsed as HTTP.
    #[error("protocol error: {0}")]
    Protocol(#[from] HttpError),

    /// The daemon answered 404 for a named resource.
    #[error("No such {kind}: {id}")]
    NotFound { kind: &'static str, id: String },

    /// The daemon answered with any other non-2xx status.
    #[error("daemon returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Transferring or demultiplexing the log stream failed.
    #[error("copy failed: {0}")]
    Copy(#[from] ctlogs_frame::FrameError),

    /// A JSON response body could not be decoded.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The caller's cancellation token fired.
    #[error("operation cancelled")]
    Cancelled,
}

impl ClientError {
    /// True for failures of the request itself: transport, protocol or
    /// a non-2xx status (including [`ClientError::NotFound`]).
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Protocol(_) | Self::NotFound { .. } | Self::Status { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// HTTP status carried by the error, if the daemon answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::NotFound { .. } => Some(404),
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
