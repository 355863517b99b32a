use bytes::{Buf, Bytes, BytesMut};
use tracing::debug;

use crate::error::{FrameError, Result};

/// Marker the device emits before a reply payload.
pub const START_MARKER: &[u8] = b"@=!@NKM0SPITER]!@";

/// Marker the device emits after a reply payload.
pub const END_MARKER: &[u8] = b"@=!@NKM1SPITER]!@";

/// Default maximum payload size: 64 KiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 64 * 1024;

/// Where a scan currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Looking for the start marker; everything seen so far is noise.
    Watching,
    /// Start marker seen; accumulating payload until the end marker.
    Receiving,
    /// A payload has been emitted.
    Done,
}

/// Configuration for the frame scanner.
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    start_marker: Bytes,
    end_marker: Bytes,
    max_payload_size: usize,
}

impl ScannerConfig {
    /// Build a configuration with custom markers.
    pub fn new(
        start_marker: impl Into<Bytes>,
        end_marker: impl Into<Bytes>,
        max_payload_size: usize,
    ) -> Result<Self> {
        let start_marker = start_marker.into();
        let end_marker = end_marker.into();
        if start_marker.is_empty() || end_marker.is_empty() {
            return Err(FrameError::InvalidMarkers("markers must not be empty"));
        }
        if start_marker == end_marker {
            return Err(FrameError::InvalidMarkers("markers must differ"));
        }
        Ok(Self {
            start_marker,
            end_marker,
            max_payload_size,
        })
    }

    /// Replace the maximum payload size.
    pub fn with_max_payload_size(mut self, max_payload_size: usize) -> Self {
        self.max_payload_size = max_payload_size;
        self
    }

    pub fn start_marker(&self) -> &[u8] {
        &self.start_marker
    }

    pub fn end_marker(&self) -> &[u8] {
        &self.end_marker
    }

    pub fn max_payload_size(&self) -> usize {
        self.max_payload_size
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            start_marker: Bytes::from_static(START_MARKER),
            end_marker: Bytes::from_static(END_MARKER),
            max_payload_size: DEFAULT_MAX_PAYLOAD,
        }
    }
}

/// Incremental matcher for one marker-delimited reply.
///
/// Chunks are appended with [`push`](Self::push); marker containment is
/// always re-evaluated over the whole accumulated buffer, so markers split
/// across chunk boundaries are found. The scanner anchors on the first
/// start marker and the first end marker after it:
/// - an end marker with no start marker before it is [`FrameError::EndBeforeStart`]
/// - a second start marker before the end marker is [`FrameError::DuplicateStart`]
#[derive(Debug)]
pub struct FrameScanner {
    config: ScannerConfig,
    buf: BytesMut,
    state: ScanState,
}

impl FrameScanner {
    /// Create a scanner with the protocol's default markers.
    pub fn new() -> Self {
        Self::with_config(ScannerConfig::default())
    }

    /// Create a scanner with explicit configuration.
    pub fn with_config(config: ScannerConfig) -> Self {
        Self {
            config,
            buf: BytesMut::new(),
            state: ScanState::Watching,
        }
    }

    /// Current scan state.
    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Current scanner configuration.
    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Feed the next chunk.
    ///
    /// Returns `Ok(Some(payload))` exactly once, when the end marker is
    /// found. In [`ScanState::Done`] further chunks are retained but not
    /// scanned until [`reset`](Self::reset). After an error the scanner is
    /// left in `Done` with an empty buffer.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Option<Bytes>> {
        self.buf.extend_from_slice(chunk);
        match self.scan() {
            Ok(found) => Ok(found),
            Err(err) => {
                self.buf.clear();
                self.state = ScanState::Done;
                Err(err)
            }
        }
    }

    /// Start watching for the next frame, keeping any bytes received after
    /// the previous end marker.
    pub fn reset(&mut self) {
        self.state = ScanState::Watching;
    }

    /// Bytes currently buffered.
    pub fn buffered(&self) -> &[u8] {
        &self.buf
    }

    fn scan(&mut self) -> Result<Option<Bytes>> {
        if self.state == ScanState::Done {
            return Ok(None);
        }

        if self.state == ScanState::Watching {
            let start = find(&self.buf, &self.config.start_marker);
            let end = find(&self.buf, &self.config.end_marker);
            match (start, end) {
                (None, Some(_)) => return Err(FrameError::EndBeforeStart),
                (Some(start), Some(end)) if end < start => return Err(FrameError::EndBeforeStart),
                (Some(start), _) => {
                    if start > 0 {
                        debug!(discarded = start, "skipped noise before start marker");
                    }
                    self.buf.advance(start + self.config.start_marker.len());
                    self.state = ScanState::Receiving;
                }
                (None, None) => {
                    self.trim_noise();
                    return Ok(None);
                }
            }
        }

        let end = find(&self.buf, &self.config.end_marker);
        let body_len = end.unwrap_or(self.buf.len());
        if find(&self.buf[..body_len], &self.config.start_marker).is_some() {
            return Err(FrameError::DuplicateStart);
        }

        match end {
            Some(end) => {
                if end > self.config.max_payload_size {
                    return Err(FrameError::PayloadTooLarge {
                        size: end,
                        max: self.config.max_payload_size,
                    });
                }
                let payload = self.buf.split_to(end).freeze();
                self.buf.advance(self.config.end_marker.len());
                self.state = ScanState::Done;
                debug!(len = payload.len(), "reply frame complete");
                Ok(Some(payload))
            }
            None => {
                // A partial end marker may still be sitting at the tail.
                let limit = self.config.max_payload_size + self.config.end_marker.len();
                if self.buf.len() > limit {
                    return Err(FrameError::PayloadTooLarge {
                        size: self.buf.len(),
                        max: self.config.max_payload_size,
                    });
                }
                Ok(None)
            }
        }
    }

    /// Keep only the tail that could still be the beginning of a marker.
    fn trim_noise(&mut self) {
        let keep = self
            .config
            .start_marker
            .len()
            .max(self.config.end_marker.len())
            - 1;
        if self.buf.len() > keep {
            let drop = self.buf.len() - keep;
            self.buf.advance(drop);
        }
    }
}

impl Default for FrameScanner {
    fn default() -> Self {
        Self::new()
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Wrap a payload in the default markers, as the device does.
pub fn wrap_reply(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(START_MARKER.len() + payload.len() + END_MARKER.len());
    out.extend_from_slice(START_MARKER);
    out.extend_from_slice(payload);
    out.extend_from_slice(END_MARKER);
    out
}
