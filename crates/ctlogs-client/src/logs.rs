use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use ctlogs_frame::{copy_merged_async, FrameError};
use futures_core::Stream;
use tokio_util::io::StreamReader;
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};
use tracing::debug;

use crate::client::{DaemonClient, Resource};
use crate::error::{ClientError, Result};
use crate::http::Body;
use crate::options::LogsOptions;

/// Error carried by the `io::Error` a cancelled [`LogStream`] yields.
#[derive(Debug, Clone, Copy, thiserror::Error)]
#[error("log stream cancelled")]
pub struct StreamCancelled;

impl StreamCancelled {
    fn into_io(self) -> io::Error {
        io::Error::new(io::ErrorKind::ConnectionAborted, self)
    }

    /// True if `err` is the error a cancelled [`LogStream`] yields.
    pub fn is(err: &io::Error) -> bool {
        err.get_ref().is_some_and(|inner| inner.is::<StreamCancelled>())
    }
}

/// Live log body of a container.
///
/// Yields raw TTY output or multiplexed frames, depending on how the
/// container was created. Finite unless the request used `follow`.
/// Dropping it closes the connection. Once the token passed to
/// [`DaemonClient::container_logs`] is cancelled the next poll yields an
/// [`io::ErrorKind::ConnectionAborted`] error wrapping [`StreamCancelled`]
/// and the stream ends.
pub struct LogStream {
    body: Body,
    cancelled: Pin<Box<WaitForCancellationFutureOwned>>,
    done: bool,
}

impl LogStream {
    fn new(body: Body, cancel: CancellationToken) -> Self {
        Self {
            body,
            cancelled: Box::pin(cancel.cancelled_owned()),
            done: false,
        }
    }

    /// Adapt into an `AsyncRead`.
    pub fn into_reader(self) -> StreamReader<Self, Bytes> {
        StreamReader::new(self)
    }
}

impl Stream for LogStream {
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }

        if this.cancelled.as_mut().poll(cx).is_ready() {
            this.done = true;
            return Poll::Ready(Some(Err(StreamCancelled.into_io())));
        }

        match Pin::new(&mut this.body).poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => Poll::Ready(Some(Ok(chunk))),
            Poll::Ready(Some(Err(err))) => {
                this.done = true;
                Poll::Ready(Some(Err(err.into())))
            }
            Poll::Ready(None) => {
                this.done = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl DaemonClient {
    /// Open `GET /containers/{id}/logs`.
    ///
    /// `since`/`until` are resolved against the local clock first; an
    /// invalid value fails with [`ClientError::InvalidTimestamp`] without
    /// touching the network. No retries.
    pub async fn container_logs(
        &self,
        container: &str,
        options: &LogsOptions,
        cancel: &CancellationToken,
    ) -> Result<LogStream> {
        let query = options.to_query(&chrono::Local::now().fixed_offset())?;
        let path = self.container_path(container, "logs");
        let resource = Resource {
            kind: "container",
            id: container,
        };

        let response = self.get(&path, query, Some(resource), cancel).await?;
        Ok(LogStream::new(response.body, cancel.clone()))
    }

    /// Fetch a container's logs as one string.
    ///
    /// TTY output is copied verbatim. Otherwise stdout and stderr payloads
    /// are merged in frame order. Invalid UTF-8 is replaced with U+FFFD.
    /// Nothing is returned on failure.
    pub async fn container_logs_string(
        &self,
        container: &str,
        options: &LogsOptions,
        cancel: &CancellationToken,
    ) -> Result<String> {
        options.validate()?;

        let info = self.container_inspect(container, cancel).await?;
        let tty = info.tty();
        let stream = self.container_logs(container, options, cancel).await?;

        let mut buf = Vec::new();
        let copied = if tty {
            let mut reader = stream.into_reader();
            tokio::io::copy(&mut reader, &mut buf)
                .await
                .map_err(FrameError::from)
        } else {
            copy_merged_async(&mut buf, stream.into_reader()).await
        };

        match copied {
            Ok(bytes) => {
                debug!(container, tty, bytes, "collected container logs");
                Ok(String::from_utf8_lossy(&buf).into_owned())
            }
            Err(_) if cancel.is_cancelled() => Err(ClientError::Cancelled),
            Err(err) => Err(ClientError::Copy(err)),
        }
    }
}
