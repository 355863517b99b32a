use crate::cmd::{block_on, device, SendArgs};
use crate::exit::{session_error, CliError, CliResult, SUCCESS};
use crate::output::{print_reply, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    block_on(async {
        let session = device::connect(&args.device).await?;
        let reply = session
            .send_bytes(&args.data)
            .await
            .map_err(|err| session_error("send failed", err))?;
        print_reply(&args.device.port, &args.data, &reply, format);
        Ok::<_, CliError>(SUCCESS)
    })?
}
