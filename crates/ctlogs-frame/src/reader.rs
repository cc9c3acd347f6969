use std::io::{ErrorKind, Read, Write};

use bytes::BytesMut;
use tracing::trace;

use crate::codec::{decode_frame, Frame, FrameConfig};
use crate::error::{FrameError, Result};
use crate::stream::StdStream;

const INITIAL_BUFFER_CAPACITY: usize = 32 * 1024;
const READ_CHUNK_SIZE: usize = 32 * 1024;

/// Reads complete frames from any `Read` stream.
///
/// Partial reads are buffered internally; callers only see complete frames.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Read the next complete frame (blocking).
    ///
    /// Returns `Ok(None)` when EOF falls on a frame boundary and
    /// `Err(FrameError::Truncated)` when it falls inside a frame.
    pub fn read_frame(&mut self) -> Result<Option<Frame>> {
        loop {
            if let Some(frame) = decode_frame(&mut self.buf, self.config.max_payload_size)? {
                return Ok(Some(frame));
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                if self.buf.is_empty() {
                    return Ok(None);
                }
                return Err(FrameError::Truncated {
                    buffered: self.buf.len(),
                });
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

/// Demultiplex `src` into `stdout` and `stderr` until EOF.
///
/// Stdin frames are written to `stdout`. A system-error frame stops the
/// copy with [`FrameError::Daemon`]. Returns the number of payload bytes
/// written across both sinks.
pub fn std_copy<R, O, E>(stdout: &mut O, stderr: &mut E, src: R) -> Result<u64>
where
    R: Read,
    O: Write + ?Sized,
    E: Write + ?Sized,
{
    demux(src, |stream, payload| {
        if stream.is_stdout_like() {
            stdout.write_all(payload)
        } else {
            stderr.write_all(payload)
        }
    })
}

/// Demultiplex `src` into a single writer, preserving frame order.
///
/// Stream identity is discarded; use [`std_copy`] to keep it.
pub fn copy_merged<R, W>(dst: &mut W, src: R) -> Result<u64>
where
    R: Read,
    W: Write + ?Sized,
{
    demux(src, |_, payload| dst.write_all(payload))
}

fn demux<R, F>(src: R, mut sink: F) -> Result<u64>
where
    R: Read,
    F: FnMut(StdStream, &[u8]) -> std::io::Result<()>,
{
    let mut reader = FrameReader::new(src);
    let mut written = 0u64;

    while let Some(frame) = reader.read_frame()? {
        if frame.stream == StdStream::Systemerr {
            return Err(FrameError::Daemon(
                String::from_utf8_lossy(&frame.payload).into_owned(),
            ));
        }
        trace!(stream = %frame.stream, len = frame.payload.len(), "demuxed frame");
        sink(frame.stream, &frame.payload)?;
        written += frame.payload.len() as u64;
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::{BufMut, BytesMut};

    use super::*;
    use crate::codec::encode_frame;

    fn wire(frames: &[(StdStream, &[u8])]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        for (stream, payload) in frames {
            encode_frame(*stream, payload, &mut buf).unwrap();
        }
        buf.to_vec()
    }

    #[test]
    fn read_single_frame() {
        let bytes = wire(&[(StdStream::Stdout, b"hello")]);

        let mut reader = FrameReader::new(Cursor::new(bytes));
        let frame = reader.read_frame().unwrap().unwrap();

        assert_eq!(frame.stream, StdStream::Stdout);
        assert_eq!(frame.payload.as_ref(), b"hello");
        assert!(reader.read_frame().unwrap().is_none());
    }

    #[test]
    fn read_frame_with_large_payload() {
        let payload = vec![0xAB; 64 * 1024];
        let bytes = wire(&[(StdStream::Stderr, &payload)]);

        let mut reader = FrameReader::new(Cursor::new(bytes));
        let frame = reader.read_frame().unwrap().unwrap();

        assert_eq!(frame.stream, StdStream::Stderr);
        assert_eq!(frame.payload.as_ref(), payload.as_slice());
    }

    #[test]
    fn partial_read_handling() {
        let byte_reader = ByteByByteReader {
            bytes: wire(&[(StdStream::Stdout, b"slow")]),
            pos: 0,
        };
        let mut reader = FrameReader::new(byte_reader);

        let frame = reader.read_frame().unwrap().unwrap();
        assert_eq!(frame.payload.as_ref(), b"slow");
    }

    #[test]
    fn empty_stream_is_clean_eof() {
        let mut reader = FrameReader::new(Cursor::new(Vec::<u8>::new()));
        assert!(reader.read_frame().unwrap().is_none());
    }

    #[test]
    fn eof_mid_frame_is_truncated() {
        let mut partial = BytesMut::new();
        partial.put_u8(2);
        partial.put_slice(&[0, 0, 0]);
        partial.put_u32(16);
        partial.put_slice(b"only-part");

        let mut reader = FrameReader::new(Cursor::new(partial.to_vec()));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::Truncated { buffered: 17 }));
    }

    #[test]
    fn interrupted_read_retries() {
        let reader = InterruptedThenData {
            interrupted: false,
            inner: Cursor::new(wire(&[(StdStream::Stdout, b"ok")])),
        };
        let mut framed = FrameReader::new(reader);
        let frame = framed.read_frame().unwrap().unwrap();
        assert_eq!(frame.payload.as_ref(), b"ok");
    }

    #[test]
    fn std_copy_splits_streams() {
        let bytes = wire(&[
            (StdStream::Stdout, b"out-1 "),
            (StdStream::Stderr, b"err-1 "),
            (StdStream::Stdin, b"in-1 "),
            (StdStream::Stdout, b"out-2"),
        ]);

        let mut out = Vec::new();
        let mut err = Vec::new();
        let written = std_copy(&mut out, &mut err, Cursor::new(bytes)).unwrap();

        assert_eq!(out, b"out-1 in-1 out-2");
        assert_eq!(err, b"err-1 ");
        assert_eq!(written, 22);
    }

    #[test]
    fn copy_merged_preserves_frame_order() {
        let mut bytes = vec![1u8, 0, 0, 0, 0, 0, 0, 5];
        bytes.extend_from_slice(b"hello");
        bytes.extend_from_slice(&[2, 0, 0, 0, 0, 0, 0, 3]);
        bytes.extend_from_slice(b"bye");

        let mut merged = Vec::new();
        copy_merged(&mut merged, Cursor::new(bytes)).unwrap();
        assert_eq!(merged, b"hellobye");
    }

    #[test]
    fn systemerr_frame_stops_copy() {
        let bytes = wire(&[
            (StdStream::Stdout, b"before"),
            (StdStream::Systemerr, b"log driver failed"),
            (StdStream::Stdout, b"after"),
        ]);

        let mut out = Vec::new();
        let mut err = Vec::new();
        let result = std_copy(&mut out, &mut err, Cursor::new(bytes));

        match result {
            Err(FrameError::Daemon(msg)) => assert_eq!(msg, "log driver failed"),
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(out, b"before");
    }

    #[test]
    fn sink_failure_propagates() {
        let bytes = wire(&[(StdStream::Stdout, b"data")]);
        let mut out = FailingWriter;
        let mut err = Vec::new();
        let result = std_copy(&mut out, &mut err, Cursor::new(bytes));
        assert!(matches!(result, Err(FrameError::Io(_))));
    }

    #[derive(Debug)]
    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }

            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    struct InterruptedThenData {
        interrupted: bool,
        inner: Cursor<Vec<u8>>,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.inner.read(buf)
        }
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("sink closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
