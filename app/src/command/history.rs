use conflusso_core::TranscriptStore;
use conflusso_transcript::ConversationLog;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct HistoryInput {
    pub config_path: Option<PathBuf>,
    pub limit: usize,
}

/// Prints the tail of the conversation log without starting a dialogue.
#[derive(Debug, Clone, Copy)]
pub struct HistoryStrategy;

impl super::CommandStrategy for HistoryStrategy {
    type Input = HistoryInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = super::load_offline_config(input.config_path.as_deref())?;
        let log = ConversationLog::new(config.log_path());

        let entries = log.read_tail(input.limit).await?;
        if entries.is_empty() {
            println!("No conversation yet at {}", log.path().display());
            return Ok(());
        }
        for entry in entries {
            println!("[{}] {}: {}\n", entry.timestamp, entry.speaker, entry.message);
        }
        Ok(())
    }
}
