use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use bytes::Bytes;
use serialport::SerialPort;
use tracing::{debug, info, warn};

use crate::error::{Result, TransportError};
use crate::traits::{EventHub, Incoming, Transport, TransportEvent, DEFAULT_EVENT_CAPACITY};

const READ_CHUNK_SIZE: usize = 1024;

/// Serial-port transport.
///
/// Reads happen on a dedicated thread polling the port; writes run on the
/// tokio blocking pool so they never stall the async caller.
pub struct SerialTransport {
    path: PathBuf,
    baud_rate: u32,
    port: Arc<Mutex<Box<dyn SerialPort>>>,
    hub: EventHub,
    stop: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
}

impl SerialTransport {
    /// How long a single blocking read waits before re-checking for shutdown.
    pub const READ_POLL: Duration = Duration::from_millis(20);

    /// Open a serial device at `baud_rate` (8N1, no flow control).
    pub fn open(path: impl AsRef<Path>, baud_rate: u32) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let name = path.to_string_lossy().into_owned();

        let port = serialport::new(name, baud_rate)
            .timeout(Self::READ_POLL)
            .open()
            .map_err(|err| TransportError::Open {
                path: path.clone(),
                source: err.into(),
            })?;
        let read_port = port.try_clone().map_err(|err| TransportError::Open {
            path: path.clone(),
            source: err.into(),
        })?;

        let hub = EventHub::new(DEFAULT_EVENT_CAPACITY);
        let stop = Arc::new(AtomicBool::new(false));
        let reader = spawn_reader(read_port, hub.clone(), Arc::clone(&stop));

        info!(?path, baud_rate, "opened serial port");

        Ok(Self {
            path,
            baud_rate,
            port: Arc::new(Mutex::new(port)),
            hub,
            stop,
            reader: Some(reader),
        })
    }

    /// The device path this transport was opened on.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Configured baud rate.
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        "serial"
    }
}

fn spawn_reader(
    mut port: Box<dyn SerialPort>,
    hub: EventHub,
    stop: Arc<AtomicBool>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let mut buf = [0u8; READ_CHUNK_SIZE];
        while !stop.load(Ordering::Relaxed) {
            match port.read(&mut buf) {
                Ok(0) => continue,
                Ok(n) => {
                    debug!(len = n, "received chunk");
                    hub.publish(TransportEvent::Data(Bytes::copy_from_slice(&buf[..n])));
                }
                Err(err) if err.kind() == ErrorKind::TimedOut => continue,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    warn!(%err, "serial read failed");
                    hub.publish(TransportEvent::Error(err.to_string()));
                    break;
                }
            }
        }
        debug!("serial reader stopped");
    })
}

impl Transport for SerialTransport {
    async fn write(&self, data: &[u8]) -> Result<()> {
        let port = Arc::clone(&self.port);
        let data = data.to_vec();
        let len = data.len();

        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut port = port.lock().map_err(|_| TransportError::Shutdown)?;
            port.write_all(&data)?;
            port.flush()?;
            Ok(())
        })
        .await
        .map_err(|err| TransportError::Io(std::io::Error::other(err)))??;

        debug!(len, "wrote bytes");
        Ok(())
    }

    fn subscribe(&self) -> Incoming {
        self.hub.subscribe()
    }

    fn listener_count(&self) -> usize {
        self.hub.listener_count()
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
        debug!(path = ?self.path, "closed serial port");
    }
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("path", &self.path)
            .field("baud_rate", &self.baud_rate)
            .field("listeners", &self.hub.listener_count())
            .finish()
    }
}
