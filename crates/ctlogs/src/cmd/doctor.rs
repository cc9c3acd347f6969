use std::time::Duration;

use ctlogs_client::{CancellationToken, ClientConfig, DaemonClient};
use ctlogs_transport::Endpoint;
use serde::Serialize;

use crate::cmd::{runtime, ConnectionArgs, DoctorArgs};
use crate::exit::{CliError, CliResult, HEALTH_CHECK_FAILED, SUCCESS, USAGE};
use crate::output::OutputFormat;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Pass,
    Fail,
    Info,
    Skip,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    name: String,
    status: CheckStatus,
    detail: String,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DoctorOutput {
    schema_id: &'static str,
    checks: Vec<CheckResult>,
    overall: &'static str,
}

pub fn run(args: DoctorArgs, format: OutputFormat, conn: &ConnectionArgs) -> CliResult<i32> {
    let timeout = parse_timeout(&args.timeout)?;

    let mut checks = Vec::new();
    match conn.config() {
        Ok(config) => {
            checks.push(endpoint_check(&config));
            checks.push(socket_check(&config.endpoint));
            checks.push(ping_check(config, timeout)?);
        }
        Err(err) => {
            checks.push(CheckResult::new("endpoint", CheckStatus::Fail, err.message));
            checks.push(CheckResult::new(
                "daemon_ping",
                CheckStatus::Skip,
                "no usable endpoint",
            ));
        }
    }
    checks.push(compiled_features_check());

    let has_fail = checks.iter().any(|c| c.status == CheckStatus::Fail);
    let overall = if has_fail { "fail" } else { "pass" };

    let output = DoctorOutput {
        schema_id: "https://schemas.3leaps.dev/ctlogs/cli/v1/doctor-report.schema.json",
        checks,
        overall,
    };

    print_doctor(&output, format);

    if has_fail {
        Ok(HEALTH_CHECK_FAILED)
    } else {
        Ok(SUCCESS)
    }
}

fn endpoint_check(config: &ClientConfig) -> CheckResult {
    let version = config.api_version.as_deref().unwrap_or("daemon default");
    CheckResult::new(
        "endpoint",
        CheckStatus::Pass,
        format!("{} (api {version})", config.endpoint),
    )
}

fn socket_check(endpoint: &Endpoint) -> CheckResult {
    let Some(path) = endpoint.socket_path() else {
        return CheckResult::new("socket_present", CheckStatus::Skip, "tcp endpoint");
    };

    match std::fs::metadata(path) {
        Ok(_) => CheckResult::new(
            "socket_present",
            CheckStatus::Pass,
            format!("{} exists", path.display()),
        ),
        Err(err) => CheckResult::new(
            "socket_present",
            CheckStatus::Fail,
            format!("{}: {err}", path.display()),
        ),
    }
}

fn ping_check(config: ClientConfig, timeout: Duration) -> CliResult<CheckResult> {
    let client = DaemonClient::new(config);
    let cancel = CancellationToken::new();
    let rt = runtime()?;

    let outcome = rt.block_on(async {
        tokio::time::timeout(timeout, client.ping(&cancel)).await
    });

    Ok(match outcome {
        Ok(Ok(info)) => CheckResult::new(
            "daemon_ping",
            CheckStatus::Pass,
            format!(
                "daemon reachable (api {}, os {})",
                info.api_version.as_deref().unwrap_or("unknown"),
                info.os_type.as_deref().unwrap_or("unknown")
            ),
        ),
        Ok(Err(err)) => CheckResult::new("daemon_ping", CheckStatus::Fail, err.to_string()),
        Err(_) => CheckResult::new(
            "daemon_ping",
            CheckStatus::Fail,
            format!("no response within {timeout:?}"),
        ),
    })
}

fn compiled_features_check() -> CheckResult {
    let mut features = Vec::new();
    if cfg!(feature = "client") {
        features.push("client");
    }
    if cfg!(feature = "cli") {
        features.push("cli");
    }
    CheckResult::new("compiled_features", CheckStatus::Info, features.join(", "))
}

fn print_doctor(output: &DoctorOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(output).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("ctlogs doctor\n");
            for c in &output.checks {
                println!(
                    "  [{:>4}] {:<18} {}",
                    status_text(c.status),
                    c.name,
                    c.detail
                );
            }
            if output.overall == "pass" {
                println!("\n  Result: all checks passed");
            } else {
                println!("\n  Result: one or more checks failed");
            }
        }
        OutputFormat::Raw => {
            println!("{}", output.overall);
        }
    }
}

fn status_text(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::Pass => "PASS",
        CheckStatus::Fail => "FAIL",
        CheckStatus::Info => "INFO",
        CheckStatus::Skip => "SKIP",
    }
}

fn parse_timeout(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "timeout must not be empty"));
    }

    let (number, millis) = match input.strip_suffix("ms") {
        Some(num) => (num, true),
        None => (input.strip_suffix('s').unwrap_or(input), false),
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid timeout value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "timeout must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}
