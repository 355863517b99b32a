use kmbox_frame::Alphabet;

use crate::cmd::CodecArgs;
use crate::exit::{codec_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_codec, OutputFormat};

pub fn encode(args: CodecArgs, format: OutputFormat) -> CliResult<i32> {
    let alphabet = resolve_alphabet(args.alphabet.as_deref())?;
    let encoded = kmbox_frame::encode(args.input.as_bytes(), &alphabet);
    print_codec("encode", &args.input, encoded.as_bytes(), &alphabet, format);
    Ok(SUCCESS)
}

pub fn decode(args: CodecArgs, format: OutputFormat) -> CliResult<i32> {
    let alphabet = resolve_alphabet(args.alphabet.as_deref())?;
    let decoded = kmbox_frame::decode(&args.input, &alphabet)
        .map_err(|err| codec_error("decode failed", err))?;
    print_codec("decode", &args.input, &decoded, &alphabet, format);
    Ok(SUCCESS)
}

fn resolve_alphabet(text: Option<&str>) -> CliResult<Alphabet> {
    match text {
        Some(text) => Alphabet::new(text)
            .map_err(|err| CliError::new(USAGE, format!("invalid alphabet: {err}"))),
        None => Ok(Alphabet::default()),
    }
}
