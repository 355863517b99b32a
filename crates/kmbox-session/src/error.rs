use std::path::PathBuf;

/// Errors that can occur in session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The initialization sequence has not completed.
    #[error("session not initialized")]
    NotInitialized,

    /// The alphabet was rejected before anything was sent.
    #[error("invalid alphabet: {0}")]
    Validation(#[from] kmbox_frame::AlphabetError),

    /// The command cannot be rendered on the wire.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// The reply payload could not be decoded.
    #[error("codec error: {0}")]
    Codec(#[from] kmbox_frame::CodecError),

    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] kmbox_transport::TransportError),

    /// No reply arrived in time.
    #[error("no reply within {0:?}")]
    Timeout(std::time::Duration),

    /// The reply framing was malformed.
    #[error("protocol error: {0}")]
    Protocol(#[from] kmbox_frame::FrameError),

    /// Another request already holds the session.
    #[error("another request is already in flight")]
    Busy,

    /// The initialization script file could not be read.
    #[error("failed to read init script {path}: {source}")]
    InitScript {
        path: PathBuf,
        source: std::io::Error,
    },

    /// JSON deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SessionError>;
