use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, WriteHalf};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::{Result, TransportError};
use crate::traits::{EventHub, Incoming, Transport, TransportEvent, DEFAULT_EVENT_CAPACITY};

const READ_CHUNK_SIZE: usize = 4 * 1024;

/// Transport over any tokio byte stream.
///
/// A background task reads the stream and publishes every chunk to the
/// attached listeners. Must be created inside a tokio runtime.
pub struct StreamTransport<S> {
    writer: Mutex<WriteHalf<S>>,
    hub: EventHub,
    reader: JoinHandle<()>,
}

impl<S> StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    /// Wrap a stream with the default listener buffer capacity.
    pub fn new(stream: S) -> Self {
        Self::with_capacity(stream, DEFAULT_EVENT_CAPACITY)
    }

    /// Wrap a stream, buffering up to `capacity` chunks per listener.
    pub fn with_capacity(stream: S, capacity: usize) -> Self {
        let (mut read_half, write_half) = tokio::io::split(stream);
        let hub = EventHub::new(capacity);

        let publisher = hub.clone();
        let reader = tokio::spawn(async move {
            let mut buf = BytesMut::with_capacity(READ_CHUNK_SIZE);
            loop {
                buf.reserve(READ_CHUNK_SIZE);
                match read_half.read_buf(&mut buf).await {
                    Ok(0) => {
                        debug!("stream reached end of file");
                        publisher.publish(TransportEvent::Closed);
                        break;
                    }
                    Ok(n) => {
                        debug!(len = n, "received chunk");
                        publisher.publish(TransportEvent::Data(buf.split().freeze()));
                    }
                    Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(err) => {
                        debug!(%err, "stream read failed");
                        publisher.publish(TransportEvent::Error(err.to_string()));
                        break;
                    }
                }
            }
        });

        Self {
            writer: Mutex::new(write_half),
            hub,
            reader,
        }
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        "stream"
    }
}

impl<S> Transport for StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    async fn write(&self, data: &[u8]) -> Result<()> {
        let mut writer = self.writer.lock().await;
        writer.write_all(data).await.map_err(TransportError::Io)?;
        writer.flush().await.map_err(TransportError::Io)?;
        debug!(len = data.len(), "wrote bytes");
        Ok(())
    }

    fn subscribe(&self) -> Incoming {
        self.hub.subscribe()
    }

    fn listener_count(&self) -> usize {
        self.hub.listener_count()
    }
}

impl<S> Drop for StreamTransport<S> {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

impl<S> std::fmt::Debug for StreamTransport<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamTransport")
            .field("listeners", &self.hub.listener_count())
            .field("reader_finished", &self.reader.is_finished())
            .finish()
    }
}
