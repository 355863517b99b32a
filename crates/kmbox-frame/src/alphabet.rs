//! The 64-symbol substitution table used by the custom base64 codec.

use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::AlphabetError;

/// Number of symbols in an alphabet.
pub const ALPHABET_LEN: usize = 64;

/// Alphabet the device boots with.
pub const DEFAULT_ALPHABET: &str =
    "QWERTYUIOPASDFGHJKLZXCVBNMqwertyuiopasdfghjklzxcvbnm0123456789+/";

/// The RFC 4648 alphabet, indexed by 6-bit value.
pub const STANDARD_ALPHABET: &[u8; ALPHABET_LEN] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Characters no alphabet may contain: the reply markers start with `@`,
/// and `=` is padding.
pub const RESERVED: [char; 2] = ['@', '='];

/// Pool that random alphabets are drawn from.
pub const RANDOM_CANDIDATES: &str = "QWERTYUIOPASDFGHJKLZXCVBNMqwertyuiopasdfghjklzxcvbnm\
1234567890-[];,./<>?:\"{}_+|!#$%^&*()~";

const NO_VALUE: u8 = u8::MAX;

/// A validated 64-character substitution alphabet.
///
/// Every symbol is a printable ASCII character (space included) other
/// than `@`, `=`, `'` and `\`, and no symbol repeats.
#[derive(Clone, PartialEq, Eq)]
pub struct Alphabet {
    symbols: [u8; ALPHABET_LEN],
    values: [u8; 128],
}

impl Alphabet {
    /// Validate and build an alphabet.
    pub fn new(text: &str) -> Result<Self, AlphabetError> {
        let len = text.chars().count();
        if len != ALPHABET_LEN {
            return Err(AlphabetError::WrongLength {
                len,
                expected: ALPHABET_LEN,
            });
        }

        let mut symbols = [0u8; ALPHABET_LEN];
        let mut seen = [false; 128];
        for (slot, ch) in symbols.iter_mut().zip(text.chars()) {
            if RESERVED.contains(&ch) {
                return Err(AlphabetError::Reserved(ch));
            }
            if !is_quotable(ch) {
                return Err(AlphabetError::Unquotable(ch));
            }
            let byte = ch as u8;
            if seen[byte as usize] {
                return Err(AlphabetError::Duplicate(ch));
            }
            seen[byte as usize] = true;
            *slot = byte;
        }

        Ok(Self::from_symbols(symbols))
    }

    /// Draw a uniformly random alphabet from [`RANDOM_CANDIDATES`].
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut pool: Vec<u8> = RANDOM_CANDIDATES.bytes().collect();
        pool.shuffle(rng);

        let mut symbols = [0u8; ALPHABET_LEN];
        symbols.copy_from_slice(&pool[..ALPHABET_LEN]);
        Self::from_symbols(symbols)
    }

    fn from_symbols(symbols: [u8; ALPHABET_LEN]) -> Self {
        let mut values = [NO_VALUE; 128];
        for (value, &symbol) in symbols.iter().enumerate() {
            values[symbol as usize] = value as u8;
        }
        Self { symbols, values }
    }

    /// Symbol for a 6-bit value. Only the low six bits are used.
    pub fn symbol(&self, value: u8) -> char {
        self.symbols[(value & 0x3F) as usize] as char
    }

    /// 6-bit value for a symbol, if the symbol belongs to this alphabet.
    pub fn value_of(&self, symbol: char) -> Option<u8> {
        let byte = u8::try_from(symbol).ok()?;
        match self.values.get(byte as usize) {
            Some(&NO_VALUE) | None => None,
            Some(&value) => Some(value),
        }
    }

    /// The alphabet as a 64-character string.
    pub fn as_str(&self) -> &str {
        // Symbols are validated ASCII, so this never fails.
        std::str::from_utf8(&self.symbols).unwrap_or_default()
    }
}

fn is_quotable(ch: char) -> bool {
    (ch == ' ' || ch.is_ascii_graphic()) && ch != '\'' && ch != '\\'
}

impl Default for Alphabet {
    fn default() -> Self {
        let mut symbols = [0u8; ALPHABET_LEN];
        symbols.copy_from_slice(DEFAULT_ALPHABET.as_bytes());
        Self::from_symbols(symbols)
    }
}

impl FromStr for Alphabet {
    type Err = AlphabetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Alphabet").field(&self.as_str()).finish()
    }
}
