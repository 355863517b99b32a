use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use bytes::Bytes;
use kmbox_frame::{decode, Alphabet, FrameScanner, ScannerConfig};
use kmbox_transport::{Incoming, Transport};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::command::Command;
use crate::error::{Result, SessionError};
use crate::init::{self, InitScript};

/// Default time to wait for a reply frame.
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(2);

/// Terminator appended to every line written to the device.
pub const LINE_TERMINATOR: &str = "\r\n";

/// Session behavior configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long a request waits for its reply. `None` waits forever.
    pub reply_timeout: Option<Duration>,
    /// Reply markers and maximum payload size.
    pub scanner: ScannerConfig,
    /// Appended to every command line.
    pub line_terminator: String,
    /// Alphabet in effect when the session starts.
    pub alphabet: Alphabet,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reply_timeout: Some(DEFAULT_REPLY_TIMEOUT),
            scanner: ScannerConfig::default(),
            line_terminator: LINE_TERMINATOR.to_string(),
            alphabet: Alphabet::default(),
        }
    }
}

/// Command/response session over one transport.
///
/// At most one operation touches the wire at a time: a request, an
/// alphabet swap and the initialization replay all take the same slot,
/// and a second caller gets [`SessionError::Busy`] instead of queueing.
/// Each request decodes its reply with the alphabet that was current when
/// it was sent.
pub struct Session<T> {
    transport: T,
    config: SessionConfig,
    alphabet: RwLock<Arc<Alphabet>>,
    initialized: AtomicBool,
    in_flight: Mutex<()>,
}

impl<T: Transport> Session<T> {
    /// Create a session with default configuration.
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, SessionConfig::default())
    }

    /// Create a session with explicit configuration.
    pub fn with_config(transport: T, config: SessionConfig) -> Self {
        let alphabet = Arc::new(config.alphabet.clone());
        Self {
            transport,
            config,
            alphabet: RwLock::new(alphabet),
            initialized: AtomicBool::new(false),
            in_flight: Mutex::new(()),
        }
    }

    /// Whether the initialization replay has completed.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// The alphabet currently in effect.
    pub fn alphabet(&self) -> Arc<Alphabet> {
        let current = self.alphabet.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&current)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Replay `script` and mark the session ready.
    ///
    /// The session is not ready while the replay runs. If a line fails to
    /// write, the replay stops and the session stays not ready.
    pub async fn initialize(&self, script: &InitScript) -> Result<()> {
        let _slot = self.acquire_slot()?;
        self.initialized.store(false, Ordering::Release);

        init::replay(&self.transport, script, &self.config.line_terminator).await?;

        self.initialized.store(true, Ordering::Release);
        info!(lines = script.len(), "initialization complete");
        Ok(())
    }

    /// Send `text` as a reply request and return the decoded reply.
    pub async fn send_command(&self, text: &str) -> Result<String> {
        let bytes = self.send_bytes(text).await?;
        String::from_utf8(bytes).map_err(|err| SessionError::Codec(err.into()))
    }

    /// Like [`send_command`](Self::send_command) but returns raw reply bytes.
    pub async fn send_bytes(&self, text: &str) -> Result<Vec<u8>> {
        self.execute(&Command::reply_request(text)).await
    }

    /// Write `command` and wait for its framed reply.
    ///
    /// The incoming listener is attached before the command is written and
    /// is dropped on every exit path.
    pub async fn execute(&self, command: &Command) -> Result<Vec<u8>> {
        self.ensure_initialized()?;
        let _slot = self.acquire_slot()?;

        let alphabet = self.alphabet();
        let line = command.format(&alphabet)?;

        let mut incoming = self.transport.subscribe();
        self.write_line(&line).await?;
        debug!(function = command.name(), len = line.len(), "request sent");

        let scanner = FrameScanner::with_config(self.config.scanner.clone());
        let payload = match self.config.reply_timeout {
            Some(limit) => tokio::time::timeout(limit, await_reply(&mut incoming, scanner))
                .await
                .map_err(|_| {
                    warn!(function = command.name(), ?limit, "reply timed out");
                    SessionError::Timeout(limit)
                })??,
            None => await_reply(&mut incoming, scanner).await?,
        };
        drop(incoming);

        let text = String::from_utf8_lossy(&payload);
        let reply = decode(&text, &alphabet)?;
        debug!(len = reply.len(), "reply decoded");
        Ok(reply)
    }

    /// Validate `alphabet`, announce it to the device, then switch to it.
    ///
    /// Nothing is written if the session is not ready or the alphabet is
    /// invalid.
    pub async fn set_alphabet(&self, alphabet: &str) -> Result<()> {
        self.ensure_initialized()?;
        let next = Alphabet::new(alphabet)?;
        self.apply_alphabet(next).await
    }

    /// Switch to a random alphabet and return it.
    pub async fn random_alphabet(&self) -> Result<Arc<Alphabet>> {
        self.ensure_initialized()?;
        let next = Alphabet::random(&mut rand::thread_rng());
        self.apply_alphabet(next).await?;
        Ok(self.alphabet())
    }

    /// Announce an already validated alphabet to the device, then switch to it.
    ///
    /// The announcement is formatted while the old alphabet is still in
    /// effect; the switch happens only after the write succeeds.
    pub async fn apply_alphabet(&self, alphabet: Alphabet) -> Result<()> {
        self.ensure_initialized()?;
        let _slot = self.acquire_slot()?;

        let announce = Command::set_alphabet(&alphabet).format(&self.alphabet())?;
        let terminator = &self.config.line_terminator;
        let wire = format!("{terminator}{terminator}{announce}{terminator}{terminator}");
        self.transport.write(wire.as_bytes()).await?;

        let mut current = self.alphabet.write().unwrap_or_else(PoisonError::into_inner);
        *current = Arc::new(alphabet);
        info!("alphabet changed");
        Ok(())
    }

    async fn write_line(&self, line: &str) -> Result<()> {
        let mut wire = String::with_capacity(line.len() + self.config.line_terminator.len());
        wire.push_str(line);
        wire.push_str(&self.config.line_terminator);
        self.transport.write(wire.as_bytes()).await?;
        Ok(())
    }

    fn ensure_initialized(&self) -> Result<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(SessionError::NotInitialized)
        }
    }

    fn acquire_slot(&self) -> Result<MutexGuard<'_, ()>> {
        self.in_flight.try_lock().map_err(|_| SessionError::Busy)
    }
}

async fn await_reply(incoming: &mut Incoming, mut scanner: FrameScanner) -> Result<Bytes> {
    loop {
        let chunk = incoming.recv().await?;
        if let Some(payload) = scanner.push(&chunk)? {
            return Ok(payload);
        }
    }
}

impl<T> std::fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("initialized", &self.initialized.load(Ordering::Relaxed))
            .field("config", &self.config)
            .finish()
    }
}
