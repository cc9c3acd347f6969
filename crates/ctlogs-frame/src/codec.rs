use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};
use crate::stream::StdStream;

/// Frame header: stream type (1) + reserved (3) + length (4) = 8 bytes.
pub const HEADER_SIZE: usize = 8;

/// Offset of the stream type byte in the header.
const STREAM_TYPE_INDEX: usize = 0;

/// Offset of the big-endian payload length in the header.
const SIZE_INDEX: usize = 4;

/// Default maximum payload size: 16 MiB.
///
/// The daemon emits frames of at most 32 KiB, so anything near this limit
/// means the stream is not framed at all.
pub const DEFAULT_MAX_PAYLOAD: usize = 16 * 1024 * 1024;

/// A demultiplexed chunk of container output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The stream this chunk belongs to.
    pub stream: StdStream,
    /// The chunk payload.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(stream: StdStream, payload: impl Into<Bytes>) -> Self {
        Self {
            stream,
            payload: payload.into(),
        }
    }

    /// The total wire size of this frame (header + payload).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────┬──────────────┬──────────────┬────────────────┐
/// │ Type (1B)│ Reserved (3B)│ Length (4B BE)│ Payload        │
/// │ 0..=3    │ 0x00 0x00 0x00│              │ (Length bytes) │
/// └──────────┴──────────────┴──────────────┴────────────────┘
/// ```
pub fn encode_frame(stream: StdStream, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > u32::MAX as usize {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: u32::MAX as usize,
        });
    }
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_u8(stream as u8);
    dst.put_slice(&[0, 0, 0]);
    dst.put_u32(payload.len() as u32);
    dst.put_slice(payload);
    Ok(())
}

/// Decode a frame from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer. The reserved
/// header bytes are not checked.
pub fn decode_frame(src: &mut BytesMut, max_payload: usize) -> Result<Option<Frame>> {
    if src.len() < HEADER_SIZE {
        return Ok(None); // Need more data
    }

    let stream = StdStream::try_from(src[STREAM_TYPE_INDEX])?;
    let mut size = [0u8; 4];
    size.copy_from_slice(&src[SIZE_INDEX..HEADER_SIZE]);
    let payload_len = u32::from_be_bytes(size) as usize;

    if payload_len > max_payload {
        return Err(FrameError::PayloadTooLarge {
            size: payload_len,
            max: max_payload,
        });
    }

    let total = HEADER_SIZE + payload_len;
    if src.len() < total {
        src.reserve(total - src.len());
        return Ok(None); // Need more data
    }

    src.advance(HEADER_SIZE);
    let payload = src.split_to(payload_len).freeze();

    Ok(Some(Frame { stream, payload }))
}

/// Configuration for frame decoding.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. Default: 16 MiB.
    pub max_payload_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let mut buf = BytesMut::new();
        encode_frame(StdStream::Stdout, b"hello", &mut buf).unwrap();

        assert_eq!(&buf[..HEADER_SIZE], &[1, 0, 0, 0, 0, 0, 0, 5]);
        assert_eq!(&buf[HEADER_SIZE..], b"hello");
    }

    #[test]
    fn test_decode_known_bytes() {
        let mut buf = BytesMut::from(&[2u8, 0, 0, 0, 0, 0, 0, 3, b'b', b'y', b'e'][..]);
        let frame = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD)
            .unwrap()
            .unwrap();

        assert_eq!(frame.stream, StdStream::Stderr);
        assert_eq!(frame.payload.as_ref(), b"bye");
        assert!(buf.is_empty());
    }

    #[test]
    fn test_length_is_big_endian() {
        let payload = vec![b'x'; 0x0102];
        let mut buf = BytesMut::new();
        encode_frame(StdStream::Stdout, &payload, &mut buf).unwrap();
        assert_eq!(&buf[4..8], &[0, 0, 0x01, 0x02]);
    }

    #[test]
    fn test_decode_incomplete_header() {
        let mut buf = BytesMut::from(&[1u8, 0x00, 0x00][..]);
        let result = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap();
        assert!(result.is_none());
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn test_decode_incomplete_payload() {
        let mut buf = BytesMut::new();
        encode_frame(StdStream::Stdout, b"hello", &mut buf).unwrap();
        buf.truncate(HEADER_SIZE + 2); // Truncate payload

        let result = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_decode_invalid_stream_type() {
        let mut buf = BytesMut::from(&[0x09u8, 0, 0, 0, 0, 0, 0, 0][..]);
        let result = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD);
        assert!(matches!(result, Err(FrameError::InvalidStreamType(9))));
    }

    #[test]
    fn test_decode_payload_too_large() {
        let mut buf = BytesMut::new();
        buf.put_u8(1);
        buf.put_slice(&[0, 0, 0]);
        buf.put_u32(1024 * 1024 * 32); // 32 MiB

        let result = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD);
        assert!(matches!(result, Err(FrameError::PayloadTooLarge { .. })));
    }

    #[test]
    fn test_multiple_frames_keep_order() {
        let mut buf = BytesMut::new();
        encode_frame(StdStream::Stderr, b"first", &mut buf).unwrap();
        encode_frame(StdStream::Stdout, b"second", &mut buf).unwrap();

        let f1 = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD)
            .unwrap()
            .unwrap();
        assert_eq!(f1.stream, StdStream::Stderr);
        assert_eq!(f1.payload.as_ref(), b"first");

        let f2 = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD)
            .unwrap()
            .unwrap();
        assert_eq!(f2.stream, StdStream::Stdout);
        assert_eq!(f2.payload.as_ref(), b"second");

        assert!(buf.is_empty());
    }

    #[test]
    fn test_empty_payload() {
        let mut buf = BytesMut::new();
        encode_frame(StdStream::Stdin, b"", &mut buf).unwrap();

        let frame = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD)
            .unwrap()
            .unwrap();
        assert_eq!(frame.stream, StdStream::Stdin);
        assert!(frame.payload.is_empty());
    }

    #[test]
    fn test_frame_wire_size() {
        let frame = Frame::new(StdStream::Stdout, Bytes::from_static(b"test"));
        assert_eq!(frame.wire_size(), HEADER_SIZE + 4);
    }
}
