use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tracing::debug;

use crate::endpoint::Endpoint;
use crate::error::{Result, TransportError};

/// A connected daemon stream implementing `AsyncRead + AsyncWrite`.
///
/// This is the fundamental I/O type returned by [`connect`].
/// On Unix, this may wrap a Unix domain socket stream; otherwise a TCP stream.
pub struct DaemonStream {
    inner: DaemonStreamInner,
}

enum DaemonStreamInner {
    #[cfg(unix)]
    Unix(tokio::net::UnixStream),
    Tcp(tokio::net::TcpStream),
}

/// Connect to the daemon endpoint.
pub async fn connect(endpoint: &Endpoint) -> Result<DaemonStream> {
    let stream = match endpoint {
        #[cfg(unix)]
        Endpoint::Unix(path) => {
            let stream = tokio::net::UnixStream::connect(path).await.map_err(|e| {
                TransportError::Connect {
                    endpoint: endpoint.to_string(),
                    source: e,
                }
            })?;
            DaemonStream::from_unix(stream)
        }
        #[cfg(not(unix))]
        Endpoint::Unix(_) => {
            return Err(TransportError::Connect {
                endpoint: endpoint.to_string(),
                source: io::Error::new(
                    io::ErrorKind::Unsupported,
                    "unix domain sockets are not available on this platform",
                ),
            });
        }
        Endpoint::Tcp { host, port } => {
            let stream = tokio::net::TcpStream::connect((host.as_str(), *port))
                .await
                .map_err(|e| TransportError::Connect {
                    endpoint: endpoint.to_string(),
                    source: e,
                })?;
            stream.set_nodelay(true)?;
            DaemonStream::from_tcp(stream)
        }
    };

    debug!(%endpoint, transport = endpoint.transport_name(), "connected to daemon");
    Ok(stream)
}

impl DaemonStream {
    /// Create a DaemonStream from a Unix domain socket stream.
    #[cfg(unix)]
    pub fn from_unix(stream: tokio::net::UnixStream) -> Self {
        Self {
            inner: DaemonStreamInner::Unix(stream),
        }
    }

    /// Create a DaemonStream from a TCP stream.
    pub fn from_tcp(stream: tokio::net::TcpStream) -> Self {
        Self {
            inner: DaemonStreamInner::Tcp(stream),
        }
    }
}

impl AsyncRead for DaemonStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match &mut self.get_mut().inner {
            #[cfg(unix)]
            DaemonStreamInner::Unix(stream) => Pin::new(stream).poll_read(cx, buf),
            DaemonStreamInner::Tcp(stream) => Pin::new(stream).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for DaemonStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match &mut self.get_mut().inner {
            #[cfg(unix)]
            DaemonStreamInner::Unix(stream) => Pin::new(stream).poll_write(cx, buf),
            DaemonStreamInner::Tcp(stream) => Pin::new(stream).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut self.get_mut().inner {
            #[cfg(unix)]
            DaemonStreamInner::Unix(stream) => Pin::new(stream).poll_flush(cx),
            DaemonStreamInner::Tcp(stream) => Pin::new(stream).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut self.get_mut().inner {
            #[cfg(unix)]
            DaemonStreamInner::Unix(stream) => Pin::new(stream).poll_shutdown(cx),
            DaemonStreamInner::Tcp(stream) => Pin::new(stream).poll_shutdown(cx),
        }
    }
}

impl std::fmt::Debug for DaemonStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            #[cfg(unix)]
            DaemonStreamInner::Unix(_) => f
                .debug_struct("DaemonStream")
                .field("type", &"unix")
                .finish(),
            DaemonStreamInner::Tcp(_) => f
                .debug_struct("DaemonStream")
                .field("type", &"tcp")
                .finish(),
        }
    }
}
