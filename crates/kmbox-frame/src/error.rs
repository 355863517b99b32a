/// Reasons an alphabet is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AlphabetError {
    /// The alphabet does not have exactly 64 characters.
    #[error("alphabet must be {expected} characters long, got {len}")]
    WrongLength { len: usize, expected: usize },

    /// A character appears more than once.
    #[error("alphabet contains duplicate character {0:?}")]
    Duplicate(char),

    /// `@` or `=` appears; both are reserved by the protocol.
    #[error("alphabet cannot contain reserved character {0:?}")]
    Reserved(char),

    /// The character cannot travel inside a single-quoted command literal.
    #[error("alphabet cannot contain {0:?} (not a quotable printable ASCII character)")]
    Unquotable(char),
}

/// Errors raised while decoding substitution-alphabet base64.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// A symbol has no mapping in the alphabet in use.
    #[error("symbol {symbol:?} at position {position} is not in the current alphabet")]
    UnknownSymbol { symbol: char, position: usize },

    /// The translated body is not valid base64.
    #[error("malformed encoded body: {0}")]
    Malformed(#[from] base64::DecodeError),

    /// The decoded bytes are not valid UTF-8.
    #[error("decoded text is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

/// Errors raised while locating a reply frame in the byte stream.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The end marker arrived before any start marker.
    #[error("end marker observed before start marker")]
    EndBeforeStart,

    /// A second start marker arrived before the end marker.
    #[error("start marker repeated before end marker")]
    DuplicateStart,

    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// Start and end markers must be non-empty and distinct.
    #[error("invalid frame markers: {0}")]
    InvalidMarkers(&'static str),

    /// An I/O error occurred while reading frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FrameError>;
