//! Container log retrieval and stream demultiplexing.
//!
//! ctlogs fetches a container's logs from the daemon REST API and splits
//! the daemon's multiplexed stdout/stderr stream back into its parts.
//!
//! # Crate Structure
//!
//! - [`transport`]: daemon endpoints and async connections (Unix socket, TCP)
//! - [`frame`]: the 8-byte-header stream format, sync and async demultiplexing
//! - [`client`]: log requests, inspect and ping (behind `client` feature)
//!
//! ```no_run
//! # async fn run() -> Result<(), ctlogs::client::ClientError> {
//! use ctlogs::client::{CancellationToken, DaemonClient, LogsOptions};
//!
//! let client = DaemonClient::from_env()?;
//! let options = LogsOptions {
//!     show_stdout: true,
//!     show_stderr: true,
//!     ..LogsOptions::default()
//! };
//! let text = client
//!     .container_logs_string("web", &options, &CancellationToken::new())
//!     .await?;
//! print!("{text}");
//! # Ok(())
//! # }
//! ```

/// Re-export transport types.
pub mod transport {
    pub use ctlogs_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use ctlogs_frame::*;
}

/// Re-export client types (requires `client` feature).
#[cfg(feature = "client")]
pub mod client {
    pub use ctlogs_client::*;
}
