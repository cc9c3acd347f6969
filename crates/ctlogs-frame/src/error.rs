/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The frame header names a stream type outside 0..=3.
    #[error("unrecognized stream type {0} in frame header")]
    InvalidStreamType(u8),

    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The stream ended in the middle of a frame.
    #[error("stream ended mid-frame ({buffered} bytes buffered)")]
    Truncated { buffered: usize },

    /// The daemon reported an error on the system-error stream.
    #[error("error from daemon in stream: {0}")]
    Daemon(String),

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The destination accepted no bytes.
    #[error("connection closed (write returned zero)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
