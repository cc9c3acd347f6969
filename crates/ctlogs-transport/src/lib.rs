//! Container daemon transport.
//!
//! Resolves a daemon endpoint (`unix:///var/run/docker.sock`,
//! `tcp://host:2375`, ...) and opens an async byte stream to it:
//! - Unix domain sockets (Linux/macOS)
//! - TCP
//!
//! This is the lowest layer of ctlogs. The HTTP client builds on the
//! [`DaemonStream`] type provided here.

pub mod endpoint;
pub mod error;
pub mod stream;

pub use endpoint::Endpoint;
pub use error::{Result, TransportError};
pub use stream::{connect, DaemonStream};
