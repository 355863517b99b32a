//! Reply framing and substitution-alphabet base64 for the kmbox protocol.
//!
//! The device wraps every reply payload between two literal markers:
//! - start: `@=!@NKM0SPITER]!@`
//! - end: `@=!@NKM1SPITER]!@`
//!
//! Payloads and free-form command arguments are base64 over a 64-symbol
//! [`Alphabet`] that client and device can swap at runtime.

pub mod alphabet;
pub mod codec;
pub mod error;
#[cfg(feature = "async")]
pub mod framed;
pub mod scanner;

pub use alphabet::{Alphabet, ALPHABET_LEN, DEFAULT_ALPHABET, RANDOM_CANDIDATES, RESERVED};
pub use codec::{decode, decode_to_string, encode, PADDING};
pub use error::{AlphabetError, CodecError, FrameError, Result};
#[cfg(feature = "async")]
pub use framed::ReplyCodec;
pub use scanner::{
    wrap_reply, FrameScanner, ScanState, ScannerConfig, DEFAULT_MAX_PAYLOAD, END_MARKER,
    START_MARKER,
};
