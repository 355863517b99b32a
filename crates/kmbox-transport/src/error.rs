use std::path::PathBuf;

/// Errors that can occur in transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the device at the specified path.
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An I/O error occurred while writing to the transport.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The read side of the transport reported an error.
    #[error("transport stream error: {0}")]
    Stream(String),

    /// The remote end closed the stream.
    #[error("transport closed")]
    Closed,

    /// The listener fell behind and incoming chunks were dropped.
    #[error("listener lagged, {0} chunks dropped")]
    Lagged(u64),

    /// The transport has been shut down.
    #[error("transport shut down")]
    Shutdown,
}

pub type Result<T> = std::result::Result<T, TransportError>;
