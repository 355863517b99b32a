use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};

use crate::exit::{io_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod alphabet;
pub mod codec;
pub mod device;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize the device, send one request and print the reply.
    Send(SendArgs),
    /// Change the alphabet used on the wire.
    Alphabet(AlphabetArgs),
    /// Encode text offline under an alphabet.
    Encode(CodecArgs),
    /// Decode text offline under an alphabet.
    Decode(CodecArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Send(args) => send::run(args, format),
        Command::Alphabet(args) => alphabet::run(args, format),
        Command::Encode(args) => codec::encode(args, format),
        Command::Decode(args) => codec::decode(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Options for subcommands that talk to a device.
#[derive(Args, Debug)]
pub struct DeviceArgs {
    /// Serial device path, or tcp://host:port for a network bridge.
    #[arg(long, short = 'p', env = "KMBOX_PORT")]
    pub port: String,
    /// Serial baud rate.
    #[arg(long, env = "KMBOX_BAUD", default_value = "115200")]
    pub baud: u32,
    /// JSON file with initialization lines.
    #[arg(long, value_name = "FILE", env = "KMBOX_INIT_FILE")]
    pub init_file: Option<PathBuf>,
    /// Pause between initialization lines (e.g. 10ms). Overrides the init file.
    #[arg(long)]
    pub line_delay: Option<String>,
    /// Maximum time to wait for a reply (e.g. 2s, 500ms).
    #[arg(long, default_value = "2s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub device: DeviceArgs,
    /// Text to send as a reply request.
    #[arg(long, short = 'd')]
    pub data: String,
}

#[derive(Args, Debug)]
pub struct AlphabetArgs {
    #[command(flatten)]
    pub device: DeviceArgs,
    /// Switch to this 64-character alphabet.
    #[arg(long, conflicts_with = "random", required_unless_present = "random")]
    pub set: Option<String>,
    /// Switch to a randomly generated alphabet.
    #[arg(long)]
    pub random: bool,
}

#[derive(Args, Debug)]
pub struct CodecArgs {
    /// Input text.
    pub input: String,
    /// 64-character alphabet. Default: the device's power-on alphabet.
    #[arg(long)]
    pub alphabet: Option<String>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Run `future` to completion on a fresh single-threaded runtime.
pub fn block_on<F: Future>(future: F) -> CliResult<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| io_error("failed to start runtime", err))?;
    Ok(runtime.block_on(future))
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert_eq!(parse_duration("  ").unwrap_err().code, USAGE);
    }
}
