use ctlogs_client::{ClientError, DaemonClient, LogStream};
use ctlogs_frame::{std_copy_async, FrameError, StdCodec, StdStream};
use futures_util::StreamExt;
use serde::Serialize;
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cmd::{cancel_on_ctrlc, runtime, ConnectionArgs, LogsArgs};
use crate::exit::{client_error, CliResult, CANCELLED, SUCCESS};
use crate::output::{print_json, print_raw, LogLine, OutputFormat};

#[derive(Serialize)]
struct MergedOutput<'a> {
    container: &'a str,
    logs: &'a str,
}

pub fn run(args: LogsArgs, format: OutputFormat, conn: &ConnectionArgs) -> CliResult<i32> {
    let client = conn.client()?;
    let cancel = cancel_on_ctrlc()?;
    let rt = runtime()?;

    let result = rt.block_on(async {
        if args.merged {
            print_merged(&client, &args, format, &cancel).await
        } else {
            stream_logs(&client, &args, format, &cancel).await
        }
    });

    match result {
        Ok(()) => Ok(SUCCESS),
        // Ctrl-C is the normal way to stop `--follow`.
        Err(_) if cancel.is_cancelled() => Ok(CANCELLED),
        Err(err) => Err(client_error("logs failed", err)),
    }
}

async fn print_merged(
    client: &DaemonClient,
    args: &LogsArgs,
    format: OutputFormat,
    cancel: &CancellationToken,
) -> Result<(), ClientError> {
    let text = client
        .container_logs_string(&args.container, &args.options(), cancel)
        .await?;

    match format {
        OutputFormat::Json => print_json(&MergedOutput {
            container: &args.container,
            logs: &text,
        }),
        _ => print_raw(text.as_bytes()),
    }
    Ok(())
}

async fn stream_logs(
    client: &DaemonClient,
    args: &LogsArgs,
    format: OutputFormat,
    cancel: &CancellationToken,
) -> Result<(), ClientError> {
    let options = args.options();
    options.validate()?;
    let tty = client.container_inspect(&args.container, cancel).await?.tty();
    let stream = client
        .container_logs(&args.container, &options, cancel)
        .await?;
    debug!(container = %args.container, tty, follow = args.follow, "streaming logs");

    let copied = match (tty, format) {
        (true, OutputFormat::Json) => tty_lines(stream).await,
        (true, _) => {
            let mut reader = stream.into_reader();
            let mut stdout = tokio::io::stdout();
            tokio::io::copy(&mut reader, &mut stdout)
                .await
                .map(|_| ())
                .map_err(FrameError::from)
        }
        (false, OutputFormat::Json) => frame_lines(stream).await,
        (false, _) => {
            let mut stdout = tokio::io::stdout();
            let mut stderr = tokio::io::stderr();
            std_copy_async(&mut stdout, &mut stderr, stream.into_reader())
                .await
                .map(|_| ())
        }
    };

    copied.map_err(ClientError::Copy)
}

/// Raw TTY chunks as JSON lines.
async fn tty_lines(mut stream: LogStream) -> Result<(), FrameError> {
    while let Some(chunk) = stream.next().await {
        print_json(&LogLine::tty(&chunk?));
    }
    Ok(())
}

/// Demultiplexed frames as JSON lines, one per frame.
async fn frame_lines(stream: LogStream) -> Result<(), FrameError> {
    let mut frames = FramedRead::new(stream.into_reader(), StdCodec::new());
    while let Some(frame) = frames.next().await {
        let frame = frame?;
        if frame.stream == StdStream::Systemerr {
            return Err(FrameError::Daemon(
                String::from_utf8_lossy(&frame.payload).into_owned(),
            ));
        }
        print_json(&LogLine::from_frame(&frame));
    }
    Ok(())
}
