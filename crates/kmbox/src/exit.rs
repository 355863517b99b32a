use std::fmt;
use std::io;

use kmbox_frame::{CodecError, FrameError};
use kmbox_session::SessionError;
use kmbox_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::ConnectionRefused | io::ErrorKind::NotFound => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Open { source, .. } | TransportError::Io(source) => {
            io_error(context, source)
        }
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}

pub fn codec_error(context: &str, err: CodecError) -> CliError {
    CliError::new(DATA_INVALID, format!("{context}: {err}"))
}

pub fn session_error(context: &str, err: SessionError) -> CliError {
    match err {
        SessionError::Transport(err) => transport_error(context, err),
        SessionError::Protocol(err) => frame_error(context, err),
        SessionError::Codec(err) => codec_error(context, err),
        SessionError::Timeout(_) => CliError::new(TIMEOUT, format!("{context}: {err}")),
        SessionError::Validation(_) | SessionError::InvalidCommand(_) => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        SessionError::InitScript { source, .. } => io_error(context, source),
        SessionError::Json(_) => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        SessionError::NotInitialized | SessionError::Busy => {
            CliError::new(INTERNAL, format!("{context}: {err}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn timeout_maps_to_timeout_code() {
        let err = session_error("send failed", SessionError::Timeout(Duration::from_secs(2)));
        assert_eq!(err.code, TIMEOUT);
        assert!(err.message.starts_with("send failed: "));
    }

    #[test]
    fn protocol_errors_are_invalid_data() {
        let err = session_error("send failed", SessionError::Protocol(FrameError::EndBeforeStart));
        assert_eq!(err.code, DATA_INVALID);
    }

    #[test]
    fn bad_alphabet_is_usage_error() {
        let validation = kmbox_frame::Alphabet::new("short").unwrap_err();
        let err = session_error("alphabet rejected", SessionError::Validation(validation));
        assert_eq!(err.code, USAGE);
    }

    #[test]
    fn permission_denied_open_maps_through_io() {
        let err = transport_error(
            "open failed",
            TransportError::Open {
                path: "/dev/ttyACM0".into(),
                source: io::Error::from(io::ErrorKind::PermissionDenied),
            },
        );
        assert_eq!(err.code, PERMISSION_DENIED);
    }

    #[test]
    fn closed_stream_is_transport_error() {
        let err = transport_error("receive failed", TransportError::Closed);
        assert_eq!(err.code, TRANSPORT_ERROR);
    }
}
