//! Byte-stream transport abstraction for kmbox devices.
//!
//! The device speaks over a plain byte pipe with no message boundaries:
//! - any tokio `AsyncRead + AsyncWrite` stream ([`StreamTransport`])
//! - a serial port, behind the `serial` feature (`SerialTransport`)
//!
//! This is the lowest layer. Incoming bytes are fanned out to attached
//! [`Incoming`] listeners; everything above builds on the [`Transport`] trait.

pub mod error;
pub mod stream;
pub mod traits;

#[cfg(feature = "serial")]
pub mod serial;

pub use error::{Result, TransportError};
pub use stream::StreamTransport;
pub use traits::{EventHub, Incoming, Transport, TransportEvent, DEFAULT_EVENT_CAPACITY};

#[cfg(feature = "serial")]
pub use serial::SerialTransport;
