use async_trait::async_trait;
use conflusso_core::{LogEntry, TranscriptStore};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::format::{TIMESTAMP_FORMAT, format_entry, parse_entries};

/// Append-only log file owned by this process.
#[derive(Debug, Clone)]
pub struct ConversationLog {
    path: PathBuf,
}

impl ConversationLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TranscriptStore for ConversationLog {
    async fn append(&self, speaker: &str, message: &str) -> anyhow::Result<()> {
        let timestamp = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();
        let block = format_entry(&timestamp, speaker, message);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(block.as_bytes()).await?;
        file.flush().await?;
        file.sync_data().await?;

        debug!("Appended {} bytes for {speaker}", block.len());
        Ok(())
    }

    async fn read_all(&self) -> anyhow::Result<Vec<LogEntry>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(parse_entries(&String::from_utf8_lossy(&bytes))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_log() -> ConversationLog {
        let dir = std::env::temp_dir().join(format!("conflusso_log_{}", uuid::Uuid::now_v7()));
        ConversationLog::new(dir.join("shared_conversation_log.txt"))
    }

    #[tokio::test]
    async fn missing_log_reads_empty() {
        let log = temp_log();
        assert!(log.read_all().await.unwrap().is_empty());
        assert!(log.read_tail(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_log_reads_empty() {
        let log = temp_log();
        std::fs::create_dir_all(log.path().parent().unwrap()).unwrap();
        std::fs::write(log.path(), "").unwrap();
        assert!(log.read_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn appended_entries_read_back_in_order() {
        let log = temp_log();
        log.append("Lumen", "Benvenuta.").await.unwrap();
        log.append("Lumira", "elayra, ci sei?").await.unwrap();
        log.append("Elayra", "Sì.\nSono qui.").await.unwrap();

        let entries = log.read_all().await.unwrap();
        let pairs: Vec<(&str, &str)> = entries
            .iter()
            .map(|e| (e.speaker.as_str(), e.message.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("Lumen", "Benvenuta."),
                ("Lumira", "elayra, ci sei?"),
                ("Elayra", "Sì.\nSono qui."),
            ]
        );
        assert!(
            chrono::NaiveDateTime::parse_from_str(&entries[0].timestamp, TIMESTAMP_FORMAT).is_ok()
        );
    }

    #[tokio::test]
    async fn tail_returns_last_entries() {
        let log = temp_log();
        for i in 0..7 {
            log.append("Lumen", &format!("riga {i}")).await.unwrap();
        }

        let tail: Vec<String> = log
            .read_tail(3)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.message)
            .collect();
        assert_eq!(tail, vec!["riga 4", "riga 5", "riga 6"]);

        assert_eq!(log.read_tail(50).await.unwrap().len(), 7);
        assert!(log.read_tail(0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_messages_read_back() {
        let log = temp_log();
        log.append("Lumira", "ciao").await.unwrap();
        log.append("Lumen", "").await.unwrap();
        log.append("Elayra", "   ").await.unwrap();

        let entries = log.read_all().await.unwrap();
        let pairs: Vec<(&str, &str)> = entries
            .iter()
            .map(|e| (e.speaker.as_str(), e.message.as_str()))
            .collect();
        assert_eq!(pairs, vec![("Lumira", "ciao"), ("Lumen", ""), ("Elayra", "")]);
        let last = log.read_tail(1).await.unwrap();
        assert_eq!(last[0].speaker, "Elayra");
    }

    #[tokio::test]
    async fn file_layout_is_human_readable() {
        let log = temp_log();
        log.append("Lumen", "ciao").await.unwrap();

        let text = std::fs::read_to_string(log.path()).unwrap();
        assert!(text.starts_with('['));
        assert!(text.ends_with("] Lumen: ciao\n\n"));
    }

    #[tokio::test]
    async fn corrupt_blocks_do_not_fail_reads() {
        let log = temp_log();
        log.append("Lumen", "prima").await.unwrap();
        let mut text = std::fs::read_to_string(log.path()).unwrap();
        text.push_str("%%% rumore %%%\n\n");
        std::fs::write(log.path(), text).unwrap();
        log.append("Elayra", "dopo").await.unwrap();

        let speakers: Vec<String> = log
            .read_all()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.speaker)
            .collect();
        assert_eq!(speakers, vec!["Lumen", "Elayra"]);
    }
}
