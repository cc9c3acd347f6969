use crate::cmd::{cancel_on_ctrlc, runtime, ConnectionArgs, InspectArgs};
use crate::exit::{client_error, CliResult, SUCCESS};
use crate::output::{print_inspect, OutputFormat};

pub fn run(args: InspectArgs, format: OutputFormat, conn: &ConnectionArgs) -> CliResult<i32> {
    let client = conn.client()?;
    let cancel = cancel_on_ctrlc()?;
    let rt = runtime()?;

    let info = rt
        .block_on(client.container_inspect(&args.container, &cancel))
        .map_err(|err| client_error("inspect failed", err))?;

    print_inspect(&info, format);
    Ok(SUCCESS)
}
