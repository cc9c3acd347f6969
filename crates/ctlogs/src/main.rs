mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::{Command, ConnectionArgs};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "ctlogs", version, about = "Container log retrieval CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format, &cli.connection);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_logs_subcommand() {
        let cli = Cli::try_parse_from([
            "ctlogs",
            "--host",
            "unix:///tmp/d.sock",
            "logs",
            "web",
            "--follow",
            "--since",
            "10m",
            "--tail",
            "20",
        ])
        .expect("logs args should parse");

        assert_eq!(cli.connection.host.as_deref(), Some("unix:///tmp/d.sock"));
        match cli.command {
            Command::Logs(args) => {
                assert_eq!(args.container, "web");
                let opts = args.options();
                assert!(opts.follow);
                assert!(opts.show_stdout && opts.show_stderr);
                assert_eq!(opts.since.as_deref(), Some("10m"));
                assert_eq!(opts.tail, "20");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_disabling_both_streams() {
        let err = Cli::try_parse_from(["ctlogs", "logs", "web", "--no-stdout", "--no-stderr"])
            .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "ctlogs",
            "inspect",
            "web",
            "--format",
            "json",
            "--api-version",
            "1.41",
        ])
        .expect("inspect args should parse");
        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert_eq!(cli.connection.api_version.as_deref(), Some("1.41"));
        assert!(matches!(cli.command, Command::Inspect(_)));
    }

    #[test]
    fn logs_requires_container() {
        let err = Cli::try_parse_from(["ctlogs", "logs"]).expect_err("missing container");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }
}
