//! HTTP/1.1 exchange with the daemon over a [`DaemonStream`].
//!
//! One request per connection, driven by `hyper`'s connection-level client.
//! The connection task lives as long as the response [`Body`]; dropping the
//! body closes the socket.

use std::io;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use bytes::{Bytes, BytesMut};
use ctlogs_transport::DaemonStream;
use futures_core::Stream;
use futures_util::StreamExt;
use http::{HeaderMap, Method};
use http_body_util::{BodyStream, Empty};
use hyper::body::Incoming;
use hyper::client::conn::http1;
use hyper::ext::ReasonPhrase;
use hyper_util::rt::TokioIo;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::query::Query;

/// Errors raised while exchanging HTTP messages.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// The request could not be assembled (bad header name or value).
    #[error("invalid request: {0}")]
    Request(#[from] http::Error),

    /// The connection failed or the response violated HTTP/1.1.
    #[error("http error: {0}")]
    Hyper(#[from] hyper::Error),

    /// A bounded body read hit its limit.
    #[error("response body exceeds {0} bytes")]
    BodyTooLarge(usize),
}

impl HttpError {
    /// True when the connection closed before the response was complete.
    pub fn is_incomplete(&self) -> bool {
        matches!(self, Self::Hyper(err) if err.is_incomplete_message())
    }
}

impl From<HttpError> for io::Error {
    fn from(err: HttpError) -> Self {
        if err.is_incomplete() {
            io::Error::new(io::ErrorKind::UnexpectedEof, err)
        } else {
            io::Error::other(err)
        }
    }
}

/// An outgoing request without a body.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub query: Query,
    pub headers: Vec<(String, String)>,
}

impl Request {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            query: Query::new(),
            headers: Vec::new(),
        }
    }

    pub fn with_query(mut self, query: Query) -> Self {
        self.query = query;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Path plus encoded query, as sent on the request line.
    pub fn target(&self) -> String {
        if self.query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query.encode())
        }
    }

    fn to_http(&self) -> Result<http::Request<Empty<Bytes>>, HttpError> {
        let mut builder = http::Request::builder()
            .method(self.method.clone())
            .uri(self.target());
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        Ok(builder.body(Empty::new())?)
    }
}

/// Status line and headers of a response.
#[derive(Debug, Clone)]
pub struct ResponseHead {
    pub status: u16,
    pub reason: String,
    pub headers: HeaderMap,
}

impl ResponseHead {
    fn from_parts(parts: &http::response::Parts) -> Self {
        // hyper only records the reason phrase when it differs from the
        // canonical one.
        let reason = parts
            .extensions
            .get::<ReasonPhrase>()
            .map(|phrase| String::from_utf8_lossy(phrase.as_bytes()).into_owned())
            .or_else(|| parts.status.canonical_reason().map(str::to_string))
            .unwrap_or_default();

        Self {
            status: parts.status.as_u16(),
            reason,
            headers: parts.headers.clone(),
        }
    }

    /// Case-insensitive header lookup (first value).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A response whose body has not been read yet.
pub struct Response {
    pub head: ResponseHead,
    pub body: Body,
}

impl Response {
    /// Read the whole body, failing past `limit` bytes.
    pub async fn read_to_end(mut self, limit: usize) -> Result<Bytes, HttpError> {
        let mut out = BytesMut::new();
        while let Some(chunk) = self.body.next().await {
            let chunk = chunk?;
            if out.len() + chunk.len() > limit {
                return Err(HttpError::BodyTooLarge(limit));
            }
            out.extend_from_slice(&chunk);
        }
        Ok(out.freeze())
    }
}

/// Lazily-read response body. Dropping it closes the connection.
pub struct Body {
    frames: BodyStream<Incoming>,
    connection: JoinHandle<()>,
    finished: bool,
}

impl Stream for Body {
    type Item = Result<Bytes, HttpError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }

        loop {
            match ready!(Pin::new(&mut this.frames).poll_next(cx)) {
                Some(Ok(frame)) => match frame.into_data() {
                    Ok(data) if data.is_empty() => continue,
                    Ok(data) => return Poll::Ready(Some(Ok(data))),
                    // Trailers carry nothing the log readers use.
                    Err(_) => continue,
                },
                Some(Err(err)) => {
                    this.finished = true;
                    return Poll::Ready(Some(Err(err.into())));
                }
                None => {
                    this.finished = true;
                    return Poll::Ready(None);
                }
            }
        }
    }
}

impl Drop for Body {
    fn drop(&mut self) {
        self.connection.abort();
    }
}

/// Write `request` on a fresh connection and wait for the response head.
pub async fn send(stream: DaemonStream, request: &Request) -> Result<Response, HttpError> {
    let request = request.to_http()?;
    let (mut sender, connection) = http1::Builder::new()
        .title_case_headers(true)
        .handshake::<_, Empty<Bytes>>(TokioIo::new(stream))
        .await?;

    let connection = tokio::spawn(async move {
        if let Err(err) = connection.await {
            debug!(error = %err, "daemon connection ended with error");
        }
    });

    let response = match sender.send_request(request).await {
        Ok(response) => response,
        Err(err) => {
            connection.abort();
            return Err(err.into());
        }
    };

    let (parts, body) = response.into_parts();
    Ok(Response {
        head: ResponseHead::from_parts(&parts),
        body: Body {
            frames: BodyStream::new(body),
            connection,
            finished: false,
        },
    })
}
