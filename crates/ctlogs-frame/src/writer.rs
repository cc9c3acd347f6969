use std::io::{ErrorKind, Write};

use bytes::BytesMut;

use crate::codec::encode_frame;
use crate::error::{FrameError, Result};
use crate::stream::StdStream;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Multiplexes writes onto a shared stream by framing each one.
///
/// Every `write` becomes exactly one frame tagged with this writer's
/// stream type. Two writers (stdout, stderr) over clones of the same
/// destination produce the format [`std_copy`](crate::std_copy) reads.
pub struct StdWriter<T> {
    inner: T,
    stream: StdStream,
    buf: BytesMut,
}

impl<T: Write> StdWriter<T> {
    /// Create a writer that tags frames with `stream`.
    pub fn new(inner: T, stream: StdStream) -> Self {
        Self {
            inner,
            stream,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Encode and send one frame (blocking).
    pub fn send(&mut self, payload: &[u8]) -> Result<()> {
        self.buf.clear();
        encode_frame(self.stream, payload, &mut self.buf)?;

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        Ok(())
    }

    /// The stream type stamped on every frame.
    pub fn stream(&self) -> StdStream {
        self.stream
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Write> Write for StdWriter<T> {
    /// Returns the payload length on success; header bytes are not counted.
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.send(buf).map_err(|err| match err {
            FrameError::Io(io) => io,
            FrameError::ConnectionClosed => std::io::Error::from(ErrorKind::WriteZero),
            other => std::io::Error::new(ErrorKind::InvalidInput, other),
        })?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}
