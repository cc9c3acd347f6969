use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::http::{self, Request, Response};
use crate::inspect::ContainerInspect;
use crate::query::{encode_path_segment, Query};

/// Upper bound for error and JSON bodies read into memory.
pub const MAX_BUFFERED_BODY: usize = 64 * 1024;

/// Upper bound for inspect documents, which can be large for busy containers.
const MAX_INSPECT_BODY: usize = 4 * 1024 * 1024;

/// Result of a successful [`DaemonClient::ping`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PingInfo {
    /// `Api-Version` response header.
    pub api_version: Option<String>,
    /// `Ostype` response header.
    pub os_type: Option<String>,
}

/// Client for the container daemon's REST API.
///
/// Holds only configuration; every request opens its own connection.
#[derive(Debug, Clone, Default)]
pub struct DaemonClient {
    config: ClientConfig,
}

/// A named resource a request targets, used to classify 404s.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Resource<'a> {
    pub kind: &'static str,
    pub id: &'a str,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl DaemonClient {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Client configured from `CTLOGS_HOST`/`DOCKER_HOST` and friends.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(ClientConfig::from_env()?))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// `path` prefixed with `/v{api_version}` when a version is configured.
    pub fn api_path(&self, path: &str) -> String {
        match &self.config.api_version {
            Some(version) => format!("/v{version}{path}"),
            None => path.to_string(),
        }
    }

    pub(crate) fn container_path(&self, id: &str, action: &str) -> String {
        self.api_path(&format!("/containers/{}/{action}", encode_path_segment(id)))
    }

    /// Check daemon liveness with `GET /_ping`.
    pub async fn ping(&self, cancel: &CancellationToken) -> Result<PingInfo> {
        let response = self.get("/_ping", Query::new(), None, cancel).await?;
        let info = PingInfo {
            api_version: response.head.header("api-version").map(str::to_string),
            os_type: response.head.header("ostype").map(str::to_string),
        };
        read_body(response, MAX_BUFFERED_BODY, cancel).await?;
        Ok(info)
    }

    /// Fetch `GET /containers/{id}/json`.
    pub async fn container_inspect(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<ContainerInspect> {
        let path = self.container_path(id, "json");
        let resource = Resource {
            kind: "container",
            id,
        };
        let response = self.get(&path, Query::new(), Some(resource), cancel).await?;
        let body = read_body(response, MAX_INSPECT_BODY, cancel).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Issue a GET and return the response once a 2xx head arrives.
    ///
    /// Non-2xx responses are turned into [`ClientError::NotFound`] or
    /// [`ClientError::Status`].
    pub(crate) async fn get(
        &self,
        path: &str,
        query: Query,
        resource: Option<Resource<'_>>,
        cancel: &CancellationToken,
    ) -> Result<Response> {
        let request = Request::get(path)
            .with_query(query)
            .header("Host", self.config.endpoint.host_header())
            .header("User-Agent", self.config.user_agent.as_str());

        debug!(
            endpoint = %self.config.endpoint,
            target = %request.target(),
            "sending request"
        );

        let exchange = async {
            let stream = ctlogs_transport::connect(&self.config.endpoint).await?;
            Ok::<_, ClientError>(http::send(stream, &request).await?)
        };

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ClientError::Cancelled),
            response = exchange => response?,
        };

        let status = response.head.status;
        debug!(status, reason = %response.head.reason, "daemon responded");
        if response.head.is_success() {
            return Ok(response);
        }

        let reason = response.head.reason.clone();
        let body = match read_body(response, MAX_BUFFERED_BODY, cancel).await {
            Ok(body) => body,
            Err(ClientError::Cancelled) => return Err(ClientError::Cancelled),
            Err(_) => bytes::Bytes::new(),
        };
        let mut message = error_message(&body);
        if message.is_empty() {
            message = reason;
        }
        warn!(status, target = %request.target(), %message, "daemon returned error");

        match resource {
            Some(resource) if status == 404 => Err(ClientError::NotFound {
                kind: resource.kind,
                id: resource.id.to_string(),
            }),
            _ => Err(ClientError::Status { status, message }),
        }
    }
}

/// Read a bounded body, racing the cancellation token.
async fn read_body(
    response: Response,
    limit: usize,
    cancel: &CancellationToken,
) -> Result<bytes::Bytes> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ClientError::Cancelled),
        body = response.read_to_end(limit) => Ok(body?),
    }
}

/// The daemon's `{"message": ...}`, else the trimmed body text.
fn error_message(body: &[u8]) -> String {
    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(parsed) => parsed.message,
        Err(_) => String::from_utf8_lossy(body).trim().to_string(),
    }
}
