//! Stream type tags carried in the first header byte.

use std::fmt;

use crate::error::FrameError;

/// Which output stream a frame belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StdStream {
    Stdin = 0,
    Stdout = 1,
    Stderr = 2,
    /// Daemon-side failure; the payload is an error message.
    Systemerr = 3,
}

impl StdStream {
    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            StdStream::Stdin => "stdin",
            StdStream::Stdout => "stdout",
            StdStream::Stderr => "stderr",
            StdStream::Systemerr => "systemerr",
        }
    }

    /// Returns true for streams whose payload belongs in the stdout sink.
    pub fn is_stdout_like(self) -> bool {
        matches!(self, StdStream::Stdin | StdStream::Stdout)
    }
}

impl TryFrom<u8> for StdStream {
    type Error = FrameError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(StdStream::Stdin),
            1 => Ok(StdStream::Stdout),
            2 => Ok(StdStream::Stderr),
            3 => Ok(StdStream::Systemerr),
            other => Err(FrameError::InvalidStreamType(other)),
        }
    }
}

impl fmt::Display for StdStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
