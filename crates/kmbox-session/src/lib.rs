//! Command/response sessions for kmbox devices.
//!
//! A [`Session`] owns one transport and turns it into a request/reply
//! channel:
//! 1. replay an [`InitScript`] once to put the device in a known state
//! 2. send commands built with [`Command`], each answered by one framed reply
//! 3. swap the substitution alphabet when needed
//!
//! Only one operation is on the wire at a time.

pub mod command;
pub mod error;
pub mod init;
pub mod session;

pub use command::{Arg, Command, REPLY_REQUEST, SET_ALPHABET};
pub use error::{Result, SessionError};
pub use init::{InitScript, DEFAULT_LINE_DELAY};
pub use session::{Session, SessionConfig, DEFAULT_REPLY_TIMEOUT, LINE_TERMINATOR};
