use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::broadcast;
use tracing::trace;

use crate::error::{Result, TransportError};

/// Default number of chunks buffered per listener before it is considered lagging.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Something that happened on the read side of a transport.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// A chunk of bytes arrived. No message boundaries are implied.
    Data(Bytes),
    /// The read side failed; the transport will not deliver further data.
    Error(String),
    /// The remote end closed the stream.
    Closed,
}

/// A byte-oriented duplex link to the device.
///
/// Writes go out as-is. Incoming bytes are broadcast to whichever
/// [`Incoming`] listeners are attached at the time they arrive; bytes that
/// arrive with nobody listening are discarded.
pub trait Transport: Send + Sync {
    /// Write the whole buffer or fail.
    fn write(&self, data: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Attach a listener to the incoming byte stream.
    ///
    /// The listener only sees data that arrives after this call. Dropping
    /// the returned handle detaches it.
    fn subscribe(&self) -> Incoming;

    /// Number of listeners currently attached.
    fn listener_count(&self) -> usize;
}

impl<T: Transport> Transport for Arc<T> {
    fn write(&self, data: &[u8]) -> impl Future<Output = Result<()>> + Send {
        (**self).write(data)
    }

    fn subscribe(&self) -> Incoming {
        (**self).subscribe()
    }

    fn listener_count(&self) -> usize {
        (**self).listener_count()
    }
}

/// A listener attached to a transport's incoming data.
pub struct Incoming {
    rx: broadcast::Receiver<TransportEvent>,
}

impl Incoming {
    /// Wait for the next chunk of incoming bytes.
    ///
    /// Read-side failures, stream closure and lag all surface as errors;
    /// once one has been returned the listener should be dropped.
    pub async fn recv(&mut self) -> Result<Bytes> {
        match self.rx.recv().await {
            Ok(TransportEvent::Data(chunk)) => Ok(chunk),
            Ok(TransportEvent::Error(message)) => Err(TransportError::Stream(message)),
            Ok(TransportEvent::Closed) => Err(TransportError::Closed),
            Err(broadcast::error::RecvError::Closed) => Err(TransportError::Shutdown),
            Err(broadcast::error::RecvError::Lagged(missed)) => Err(TransportError::Lagged(missed)),
        }
    }
}

impl std::fmt::Debug for Incoming {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Incoming")
            .field("queued", &self.rx.len())
            .finish()
    }
}

/// Fan-out point for incoming transport events.
///
/// Transport implementations publish everything their read side produces
/// here; [`Incoming`] handles are created from it.
#[derive(Debug, Clone)]
pub struct EventHub {
    tx: broadcast::Sender<TransportEvent>,
}

impl EventHub {
    /// Create a hub buffering up to `capacity` events per listener.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish an event, returning how many listeners received it.
    pub fn publish(&self, event: TransportEvent) -> usize {
        match self.tx.send(event) {
            Ok(listeners) => listeners,
            Err(broadcast::error::SendError(event)) => {
                if let TransportEvent::Data(chunk) = event {
                    trace!(len = chunk.len(), "discarding data with no listener attached");
                }
                0
            }
        }
    }

    /// Attach a new listener.
    pub fn subscribe(&self) -> Incoming {
        Incoming {
            rx: self.tx.subscribe(),
        }
    }

    /// Number of listeners currently attached.
    pub fn listener_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn listener_sees_only_data_published_after_subscribe() {
        let hub = EventHub::default();
        assert_eq!(hub.publish(TransportEvent::Data(Bytes::from_static(b"early"))), 0);

        let mut incoming = hub.subscribe();
        assert_eq!(hub.publish(TransportEvent::Data(Bytes::from_static(b"late"))), 1);

        let chunk = incoming.recv().await.unwrap();
        assert_eq!(chunk.as_ref(), b"late");
    }

    #[tokio::test]
    async fn dropping_listener_detaches_it() {
        let hub = EventHub::default();
        let incoming = hub.subscribe();
        assert_eq!(hub.listener_count(), 1);

        drop(incoming);
        assert_eq!(hub.listener_count(), 0);
    }

    #[tokio::test]
    async fn error_and_close_events_map_to_transport_errors() {
        let hub = EventHub::default();
        let mut incoming = hub.subscribe();

        hub.publish(TransportEvent::Error("parity error".to_string()));
        hub.publish(TransportEvent::Closed);

        let err = incoming.recv().await.unwrap_err();
        assert!(matches!(err, TransportError::Stream(ref msg) if msg == "parity error"));
        let err = incoming.recv().await.unwrap_err();
        assert!(matches!(err, TransportError::Closed));
    }

    #[tokio::test]
    async fn slow_listener_reports_lag() {
        let hub = EventHub::new(2);
        let mut incoming = hub.subscribe();

        for _ in 0..5 {
            hub.publish(TransportEvent::Data(Bytes::from_static(b"x")));
        }

        let err = incoming.recv().await.unwrap_err();
        assert!(matches!(err, TransportError::Lagged(3)));
    }

    #[tokio::test]
    async fn dropped_hub_reports_shutdown() {
        let hub = EventHub::default();
        let mut incoming = hub.subscribe();
        drop(hub);

        let err = incoming.recv().await.unwrap_err();
        assert!(matches!(err, TransportError::Shutdown));
    }
}
