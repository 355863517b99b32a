use std::path::Path;
use std::time::Duration;

use kmbox_transport::Transport;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Result, SessionError};

/// Default pause between initialization lines.
pub const DEFAULT_LINE_DELAY: Duration = Duration::from_millis(10);

/// Ordered raw command lines replayed once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitScript {
    lines: Vec<String>,
    line_delay: Duration,
}

/// On-disk form: either a bare array of lines or an object with options.
#[derive(Deserialize)]
#[serde(untagged)]
enum ScriptFile {
    Lines(Vec<String>),
    Full {
        lines: Vec<String>,
        #[serde(default)]
        line_delay_ms: Option<u64>,
    },
}

impl InitScript {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            line_delay: DEFAULT_LINE_DELAY,
        }
    }

    /// A script with no lines; replaying it only marks the session ready.
    pub fn empty() -> Self {
        Self::new(Vec::<String>::new())
    }

    pub fn with_line_delay(mut self, line_delay: Duration) -> Self {
        self.line_delay = line_delay;
        self
    }

    /// Parse a JSON array of lines, or `{"lines": [...], "line_delay_ms": n}`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let script = match serde_json::from_str::<ScriptFile>(json)? {
            ScriptFile::Lines(lines) => Self::new(lines),
            ScriptFile::Full {
                lines,
                line_delay_ms,
            } => {
                let script = Self::new(lines);
                match line_delay_ms {
                    Some(ms) => script.with_line_delay(Duration::from_millis(ms)),
                    None => script,
                }
            }
        };
        Ok(script)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SessionError::InitScript {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line_delay(&self) -> Duration {
        self.line_delay
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Write every line plus `terminator`, pausing `line_delay` after each.
/// Stops at the first failed write.
pub(crate) async fn replay<T: Transport>(
    transport: &T,
    script: &InitScript,
    terminator: &str,
) -> Result<()> {
    for (index, line) in script.lines.iter().enumerate() {
        let mut wire = String::with_capacity(line.len() + terminator.len());
        wire.push_str(line);
        wire.push_str(terminator);

        if let Err(err) = transport.write(wire.as_bytes()).await {
            warn!(index, %err, "initialization line failed");
            return Err(err.into());
        }
        debug!(index, "sent initialization line");

        tokio::time::sleep(script.line_delay).await;
    }
    Ok(())
}
