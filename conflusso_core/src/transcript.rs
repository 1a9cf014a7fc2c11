//! Transcript records and the storage seam the orchestrator writes through.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One attributed turn of the dialogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Wall-clock time the entry was written, `YYYY-MM-DD HH:MM:SS`.
    pub timestamp: String,
    pub speaker: String,
    pub message: String,
}

impl LogEntry {
    #[must_use]
    pub fn new(
        timestamp: impl Into<String>,
        speaker: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: timestamp.into(),
            speaker: speaker.into(),
            message: message.into(),
        }
    }
}

/// Durable, append-only store of the dialogue.
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Append one entry stamped with the current time. The write is flushed
    /// before this returns.
    async fn append(&self, speaker: &str, message: &str) -> anyhow::Result<()>;

    /// Full history in chronological order. A store that does not exist yet
    /// reads as empty.
    async fn read_all(&self) -> anyhow::Result<Vec<LogEntry>>;

    /// The last `n` entries, oldest first.
    async fn read_tail(&self, n: usize) -> anyhow::Result<Vec<LogEntry>> {
        let mut entries = self.read_all().await?;
        let start = entries.len().saturating_sub(n);
        Ok(entries.split_off(start))
    }
}
