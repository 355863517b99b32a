use crate::cmd::{block_on, device, AlphabetArgs};
use crate::exit::{session_error, CliError, CliResult, SUCCESS};
use crate::output::{print_alphabet, OutputFormat};

pub fn run(args: AlphabetArgs, format: OutputFormat) -> CliResult<i32> {
    block_on(async {
        let session = device::connect(&args.device).await?;
        let changed = match &args.set {
            Some(alphabet) => session.set_alphabet(alphabet).await,
            None => session.random_alphabet().await.map(|_| ()),
        };
        changed.map_err(|err| session_error("alphabet change failed", err))?;

        print_alphabet(&args.device.port, &session.alphabet(), format);
        Ok::<_, CliError>(SUCCESS)
    })?
}
