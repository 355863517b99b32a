//! Base64 over a substitution alphabet.
//!
//! Encoding packs the input bits into 6-bit groups left to right, zero-pads
//! the final group and appends one `=` per two bits of padding. Decoding
//! translates every symbol back to the RFC 4648 alphabet and hands the
//! result to a conventional base64 decoder.

use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;

use crate::alphabet::{Alphabet, STANDARD_ALPHABET};
use crate::error::CodecError;

/// Padding symbol.
pub const PADDING: char = '=';

/// Padding is stripped before decoding, and the device is not required to
/// zero the unused bits of its last symbol.
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &base64::alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::RequireNone)
        .with_decode_allow_trailing_bits(true),
);

/// Encode bytes under `alphabet`.
///
/// Empty input encodes to an empty string.
pub fn encode(data: &[u8], alphabet: &Alphabet) -> String {
    let mut out = String::with_capacity(data.len().div_ceil(3) * 4);
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;

    for &byte in data {
        acc = (acc << 8) | u32::from(byte);
        bits += 8;
        while bits >= 6 {
            bits -= 6;
            out.push(alphabet.symbol((acc >> bits) as u8));
        }
        acc &= (1 << bits) - 1;
    }

    if bits > 0 {
        let pad_bits = 6 - bits;
        out.push(alphabet.symbol((acc << pad_bits) as u8));
        for _ in 0..pad_bits / 2 {
            out.push(PADDING);
        }
    }

    out
}

/// Decode text produced under `alphabet`.
///
/// Trailing `=` is ignored. If the last decoded byte is `0x00` it is
/// dropped; this also strips a genuine trailing NUL from the payload.
pub fn decode(text: &str, alphabet: &Alphabet) -> Result<Vec<u8>, CodecError> {
    let body = text.trim_end_matches(PADDING);

    let mut standard = Vec::with_capacity(body.len());
    for (position, symbol) in body.chars().enumerate() {
        let value = alphabet
            .value_of(symbol)
            .ok_or(CodecError::UnknownSymbol { symbol, position })?;
        standard.push(STANDARD_ALPHABET[value as usize]);
    }

    let mut bytes = STANDARD_LENIENT.decode(&standard)?;
    if bytes.last() == Some(&0) {
        bytes.pop();
    }
    Ok(bytes)
}

/// Decode text produced under `alphabet` and require the result to be UTF-8.
pub fn decode_to_string(text: &str, alphabet: &Alphabet) -> Result<String, CodecError> {
    let bytes = decode(text, alphabet)?;
    Ok(String::from_utf8(bytes)?)
}
