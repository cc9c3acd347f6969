//! Async demultiplexing on top of `tokio_util::codec`.

use bytes::BytesMut;
use futures_util::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::{Decoder, Encoder, FramedRead};
use tracing::trace;

use crate::codec::{decode_frame, encode_frame, Frame, FrameConfig};
use crate::error::{FrameError, Result};
use crate::stream::StdStream;

/// `tokio_util` codec for the multiplexed stream format.
#[derive(Debug, Clone, Default)]
pub struct StdCodec {
    config: FrameConfig,
}

impl StdCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FrameConfig) -> Self {
        Self { config }
    }
}

impl Decoder for StdCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>> {
        decode_frame(src, self.config.max_payload_size)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Frame>> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None if src.is_empty() => Ok(None),
            None => Err(FrameError::Truncated {
                buffered: src.len(),
            }),
        }
    }
}

impl Encoder<Frame> for StdCodec {
    type Error = FrameError;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<()> {
        encode_frame(frame.stream, &frame.payload, dst)
    }
}

/// Async counterpart of [`std_copy`](crate::std_copy).
///
/// Both writers are flushed after every frame so interactive consumers
/// see follow-mode output as it arrives.
pub async fn std_copy_async<R, O, E>(stdout: &mut O, stderr: &mut E, src: R) -> Result<u64>
where
    R: AsyncRead + Unpin,
    O: AsyncWrite + Unpin + ?Sized,
    E: AsyncWrite + Unpin + ?Sized,
{
    let mut frames = FramedRead::new(src, StdCodec::new());
    let mut written = 0u64;

    while let Some(frame) = frames.next().await {
        let frame = frame?;
        match frame.stream {
            StdStream::Systemerr => return Err(daemon_error(&frame)),
            stream if stream.is_stdout_like() => {
                stdout.write_all(&frame.payload).await?;
                stdout.flush().await?;
            }
            _ => {
                stderr.write_all(&frame.payload).await?;
                stderr.flush().await?;
            }
        }
        trace!(stream = %frame.stream, len = frame.payload.len(), "demuxed frame");
        written += frame.payload.len() as u64;
    }

    Ok(written)
}

/// Async counterpart of [`copy_merged`](crate::copy_merged).
pub async fn copy_merged_async<R, W>(dst: &mut W, src: R) -> Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut frames = FramedRead::new(src, StdCodec::new());
    let mut written = 0u64;

    while let Some(frame) = frames.next().await {
        let frame = frame?;
        if frame.stream == StdStream::Systemerr {
            return Err(daemon_error(&frame));
        }
        dst.write_all(&frame.payload).await?;
        written += frame.payload.len() as u64;
    }

    dst.flush().await?;
    Ok(written)
}

fn daemon_error(frame: &Frame) -> FrameError {
    FrameError::Daemon(String::from_utf8_lossy(&frame.payload).into_owned())
}
