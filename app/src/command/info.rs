use conflusso_config::{BindingStore, Config};
use conflusso_core::TranscriptStore;
use conflusso_transcript::ConversationLog;
use std::path::PathBuf;

/// Shows masked credentials, models, storage paths and the stored binding.
#[derive(Debug, Clone, Copy)]
pub struct InfoStrategy;

impl super::CommandStrategy for InfoStrategy {
    type Input = Option<PathBuf>;

    async fn execute(&self, config_path: Self::Input) -> anyhow::Result<()> {
        let config = super::load_offline_config(config_path.as_deref())?;

        println!("=== conflusso Configuration ===\n");

        println!("API Keys:");
        println!("  Gemini: {}", mask_key(&config.providers.gemini.api_key));
        println!("  OpenAI: {}", mask_key(&config.providers.openai.api_key));
        println!();

        println!("Models:");
        println!("  {}: {}", config.dialogue.agent_a, config.providers.gemini.model);
        println!("  {}: {}", config.dialogue.agent_b, config.providers.openai.model);
        println!();

        print_dialogue(&config);
        print_storage(&config).await;
        Ok(())
    }
}

fn print_dialogue(config: &Config) {
    let d = &config.dialogue;
    println!("Dialogue:");
    println!("  Operator: {}", d.human);
    println!("  Addresses for {}: {}", d.agent_b, d.address_aliases().join(", "));
    println!("  Replayed on start: {} entries", d.tail_window);
    match d.context_window {
        Some(n) => println!("  Context for {}: last {n} entries", d.agent_a),
        None => println!("  Context for {}: full history", d.agent_a),
    }
    println!(
        "  Run polling: every {}ms, up to {}s",
        d.poll_interval_ms, d.poll_deadline_secs
    );
    println!();
}

async fn print_storage(config: &Config) {
    println!("Storage:");
    let log = ConversationLog::new(config.log_path());
    match log.read_all().await {
        Ok(entries) => println!("  Log: {} ({} entries)", log.path().display(), entries.len()),
        Err(e) => println!("  Log: {} (unreadable: {e})", log.path().display()),
    }

    let store = BindingStore::new(config.binding_path());
    let binding = store.load();
    println!("  Binding: {}", store.path().display());
    println!(
        "    Assistant: {}",
        binding.agent_id.as_deref().unwrap_or("(none)")
    );
    println!(
        "    Thread: {}",
        binding.thread_id.as_deref().unwrap_or("(none)")
    );
}

fn mask_key(key: &str) -> String {
    if key.trim().is_empty() {
        return "(not set)".to_string();
    }
    let chars: Vec<char> = key.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else {
        "***".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_keys_show_ends_only() {
        assert_eq!(mask_key("sk-abcdefghijklmnop"), "sk-a...mnop");
    }

    #[test]
    fn short_keys_are_hidden() {
        assert_eq!(mask_key("short"), "***");
    }

    #[test]
    fn missing_keys_are_reported() {
        assert_eq!(mask_key(""), "(not set)");
    }
}
