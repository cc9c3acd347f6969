use clap::{Args, Subcommand};
use ctlogs_client::{ClientConfig, DaemonClient, LogsOptions};
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

use crate::exit::{io_error, transport_error, CliError, CliResult, INTERNAL};
use crate::output::OutputFormat;

pub mod doctor;
pub mod inspect;
pub mod logs;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch or follow a container's logs.
    Logs(LogsArgs),
    /// Show TTY mode, image and state of a container.
    Inspect(InspectArgs),
    /// Check endpoint configuration and daemon reachability.
    Doctor(DoctorArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat, conn: &ConnectionArgs) -> CliResult<i32> {
    match command {
        Command::Logs(args) => logs::run(args, format, conn),
        Command::Inspect(args) => inspect::run(args, format, conn),
        Command::Doctor(args) => doctor::run(args, format, conn),
        Command::Version(args) => version::run(args),
    }
}

/// Daemon connection flags shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Daemon endpoint (unix:///path, tcp://host:port). Overrides CTLOGS_HOST and DOCKER_HOST.
    #[arg(long, value_name = "ENDPOINT", global = true)]
    pub host: Option<String>,

    /// API version to request (e.g. 1.43). Overrides CTLOGS_API_VERSION and DOCKER_API_VERSION.
    #[arg(long, value_name = "VERSION", global = true)]
    pub api_version: Option<String>,
}

impl ConnectionArgs {
    /// Environment config with command-line overrides applied.
    pub fn config(&self) -> CliResult<ClientConfig> {
        ClientConfig::from_lookup(|key| match key {
            "CTLOGS_HOST" if self.host.is_some() => self.host.clone(),
            "CTLOGS_API_VERSION" if self.api_version.is_some() => self.api_version.clone(),
            _ => std::env::var(key).ok(),
        })
        .map_err(|err| transport_error("invalid daemon endpoint", err))
    }

    pub fn client(&self) -> CliResult<DaemonClient> {
        Ok(DaemonClient::new(self.config()?))
    }
}

#[derive(Args, Debug)]
pub struct LogsArgs {
    /// Container name or ID.
    pub container: String,
    /// Keep streaming new output until interrupted.
    #[arg(long, short = 'f')]
    pub follow: bool,
    /// Prefix each line with its timestamp.
    #[arg(long, short = 't')]
    pub timestamps: bool,
    /// Include extra attributes supplied by the log driver.
    #[arg(long)]
    pub details: bool,
    /// Show logs since a timestamp (2024-01-02T15:04:05Z) or relative duration (10m).
    #[arg(long, value_name = "TIME")]
    pub since: Option<String>,
    /// Show logs before a timestamp or relative duration.
    #[arg(long, value_name = "TIME")]
    pub until: Option<String>,
    /// Number of lines from the end, or "all".
    #[arg(long, short = 'n', default_value = "all")]
    pub tail: String,
    /// Omit the container's stdout.
    #[arg(long, conflicts_with = "no_stderr")]
    pub no_stdout: bool,
    /// Omit the container's stderr.
    #[arg(long)]
    pub no_stderr: bool,
    /// Collect everything into one buffer before printing.
    #[arg(long)]
    pub merged: bool,
}

impl LogsArgs {
    pub fn options(&self) -> LogsOptions {
        LogsOptions {
            show_stdout: !self.no_stdout,
            show_stderr: !self.no_stderr,
            since: self.since.clone(),
            until: self.until.clone(),
            timestamps: self.timestamps,
            details: self.details,
            follow: self.follow,
            tail: self.tail.clone(),
        }
    }
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Container name or ID.
    pub container: String,
}

#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Maximum time to wait for the daemon ping (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub(crate) fn runtime() -> CliResult<Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| io_error("runtime setup failed", err))
}

/// Token cancelled by Ctrl-C.
pub(crate) fn cancel_on_ctrlc() -> CliResult<CancellationToken> {
    let token = CancellationToken::new();
    let handle = token.clone();
    ctrlc::set_handler(move || handle.cancel()).map_err(|err| {
        CliError::new(INTERNAL, format!("signal handler setup failed: {err}"))
    })?;
    Ok(token)
}
