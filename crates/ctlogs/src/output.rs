use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use ctlogs_client::ContainerInspect;
use ctlogs_frame::Frame;
use serde::Serialize;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// One demultiplexed frame as a JSON line (`logs --format json`).
#[derive(Serialize)]
pub struct LogLine<'a> {
    pub stream: &'a str,
    pub text: String,
    pub size: usize,
}

impl<'a> LogLine<'a> {
    pub fn from_frame(frame: &'a Frame) -> Self {
        Self {
            stream: frame.stream.name(),
            text: String::from_utf8_lossy(&frame.payload).into_owned(),
            size: frame.payload.len(),
        }
    }

    pub fn tty(chunk: &[u8]) -> LogLine<'static> {
        LogLine {
            stream: "tty",
            text: String::from_utf8_lossy(chunk).into_owned(),
            size: chunk.len(),
        }
    }
}

#[derive(Serialize)]
struct InspectOutput<'a> {
    schema_id: &'a str,
    id: &'a str,
    name: &'a str,
    image: &'a str,
    tty: bool,
    status: &'a str,
    running: bool,
    exit_code: i64,
    started_at: &'a str,
}

impl<'a> InspectOutput<'a> {
    fn new(info: &'a ContainerInspect) -> Self {
        let state = info.state.as_ref();
        Self {
            schema_id: "https://schemas.3leaps.dev/ctlogs/cli/v1/container-inspect.schema.json",
            id: &info.id,
            name: info.name.trim_start_matches('/'),
            image: info.config.as_ref().map(|c| c.image.as_str()).unwrap_or(""),
            tty: info.tty(),
            status: state.map(|s| s.status.as_str()).unwrap_or("unknown"),
            running: state.is_some_and(|s| s.running),
            exit_code: state.map(|s| s.exit_code).unwrap_or_default(),
            started_at: state.map(|s| s.started_at.as_str()).unwrap_or(""),
        }
    }
}

pub fn print_inspect(info: &ContainerInspect, format: OutputFormat) {
    let out = InspectOutput::new(info);
    match format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["NAME", "IMAGE", "TTY", "STATUS", "EXIT"])
                .add_row(vec![
                    out.name.to_string(),
                    out.image.to_string(),
                    out.tty.to_string(),
                    out.status.to_string(),
                    out.exit_code.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("Container:");
            println!("  ID:       {}", out.id);
            println!("  Name:     {}", out.name);
            println!("  Image:    {}", out.image);
            println!("  TTY:      {}", out.tty);
            println!("  Status:   {} (running={})", out.status, out.running);
            println!("  Exit:     {}", out.exit_code);
            if !out.started_at.is_empty() {
                println!("  Started:  {}", out.started_at);
            }
        }
        OutputFormat::Raw => println!("{}", out.id),
    }
}

pub fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use ctlogs_client::{ContainerConfig, ContainerState};
    use ctlogs_frame::StdStream;

    use super::*;

    #[test]
    fn log_line_names_stream() {
        let frame = Frame {
            stream: StdStream::Stderr,
            payload: Bytes::from_static(b"oops\n"),
        };
        let json = serde_json::to_string(&LogLine::from_frame(&frame))
            .expect("log line should serialize");
        assert_eq!(json, r#"{"stream":"stderr","text":"oops\n","size":5}"#);
    }

    #[test]
    fn inspect_output_strips_leading_slash() {
        let info = ContainerInspect {
            id: "4f1c".into(),
            name: "/web".into(),
            config: Some(ContainerConfig {
                tty: true,
                image: "nginx".into(),
                open_stdin: false,
            }),
            state: Some(ContainerState {
                status: "exited".into(),
                running: false,
                exit_code: 2,
                started_at: String::new(),
            }),
        };
        let out = InspectOutput::new(&info);
        assert_eq!(out.name, "web");
        assert!(out.tty);
        assert_eq!(out.exit_code, 2);

        let json = serde_json::to_string(&out).expect("inspect output should serialize");
        assert!(json.contains("container-inspect.schema.json"));
    }
}
