//! Container log retrieval over the daemon REST API.
//!
//! [`DaemonClient::container_logs`] returns the live log body as a
//! [`LogStream`]; callers that need stdout and stderr separated feed it to
//! [`ctlogs_frame::std_copy_async`]. [`DaemonClient::container_logs_string`]
//! buffers everything into one string, demultiplexing when the container
//! has no TTY.
//!
//! Every network operation takes a [`CancellationToken`]; cancelling it
//! unblocks in-flight connects, requests and stream reads.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod inspect;
pub mod logs;
pub mod options;
pub mod query;
pub mod timestamp;

pub use client::{DaemonClient, PingInfo};
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use inspect::{ContainerConfig, ContainerInspect, ContainerState};
pub use logs::{LogStream, StreamCancelled};
pub use options::LogsOptions;
pub use query::Query;
pub use timestamp::{resolve_timestamp, TimestampError};

pub use tokio_util::sync::CancellationToken;
