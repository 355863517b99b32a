//! Client for kmbox devices.
//!
//! The device is driven over a serial line with plain-text function calls.
//! Free-form arguments and every reply travel as base64 over a swappable
//! 64-symbol alphabet, and replies are wrapped between fixed markers.
//!
//! # Crate Structure
//!
//! - [`transport`]: byte-stream transports (tokio streams, serial ports behind `serial`)
//! - [`frame`]: alphabet, codec and reply frame scanner
//! - [`session`]: command formatting, initialization and the request/reply session

/// Re-export transport types.
pub mod transport {
    pub use kmbox_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use kmbox_frame::*;
}

/// Re-export session types.
pub mod session {
    pub use kmbox_session::*;
}

pub use kmbox_session::{Command, InitScript, Session, SessionConfig, SessionError};
