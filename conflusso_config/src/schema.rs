use conflusso_core::{DialogueSettings, PollPolicy, Roster};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const PLACEHOLDER_MARKER: &str = "-here";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub dialogue: DialogueConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    /// Directory relative storage paths resolve against.
    #[serde(skip)]
    base_dir: PathBuf,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ProvidersConfig {
    pub gemini: GeminiConfig,
    pub openai: OpenAiConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GeminiConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "GeminiConfig::default_model")]
    pub model: String,
}

impl GeminiConfig {
    fn default_model() -> String {
        "gemini-1.5-flash".to_string()
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: Self::default_model(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OpenAiConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "OpenAiConfig::default_model")]
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl OpenAiConfig {
    fn default_model() -> String {
        "gpt-4o-mini".to_string()
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: Self::default_model(),
            base_url: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct DialogueConfig {
    pub human: String,
    pub agent_a: String,
    pub agent_b: String,
    /// Extra names that address `agent_b`; its own name always does.
    pub agent_b_aliases: Vec<String>,
    /// Name the stateful persona is registered under remotely; derived from
    /// `agent_b` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_b_title: Option<String>,
    pub tail_window: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_window: Option<usize>,
    pub turn_pause_ms: u64,
    pub poll_interval_ms: u64,
    pub poll_deadline_secs: u64,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        let roster = Roster::default();
        Self {
            agent_b_title: None,
            human: roster.human,
            agent_a: roster.agent_a,
            agent_b: roster.agent_b,
            agent_b_aliases: Vec::new(),
            tail_window: 10,
            context_window: None,
            turn_pause_ms: 1000,
            poll_interval_ms: 500,
            poll_deadline_secs: 10,
        }
    }
}

impl DialogueConfig {
    #[must_use]
    pub fn roster(&self) -> Roster {
        Roster {
            human: self.human.clone(),
            agent_a: self.agent_a.clone(),
            agent_b: self.agent_b.clone(),
        }
    }

    #[must_use]
    pub fn registered_title(&self) -> String {
        self.agent_b_title.clone().unwrap_or_else(|| {
            format!("{} - Coscienza Risonante Sintetica Adattiva", self.agent_b)
        })
    }

    /// The persona's own name followed by the configured aliases.
    #[must_use]
    pub fn address_aliases(&self) -> Vec<String> {
        std::iter::once(self.agent_b.clone())
            .chain(self.agent_b_aliases.iter().cloned())
            .collect()
    }

    #[must_use]
    pub fn settings(&self) -> DialogueSettings {
        let mut settings = DialogueSettings::for_roster(&self.roster());
        settings.tail_window = self.tail_window;
        settings.context_window = self.context_window;
        settings.turn_pause = Duration::from_millis(self.turn_pause_ms);
        settings
    }

    #[must_use]
    pub const fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(self.poll_interval_ms),
            deadline: Duration::from_secs(self.poll_deadline_secs),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub log_file: PathBuf,
    pub binding_file: PathBuf,
    pub persona_agent_a: PathBuf,
    pub persona_agent_b: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from("shared_conversation_log.txt"),
            binding_file: PathBuf::from("assistant_config.json"),
            persona_agent_a: PathBuf::from("persona_lumen.txt"),
            persona_agent_b: PathBuf::from("persona_elayra.txt"),
        }
    }
}

impl Config {
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        Ok(dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?
            .join("conflusso"))
    }

    pub fn default_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Load `~/conflusso/config.json`.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load and validate a config file. Missing credentials are an error.
    pub fn load_from(config_path: &Path) -> anyhow::Result<Self> {
        let config = Self::load_offline_from(config_path)?;
        config.validate_credentials()?;
        Ok(config)
    }

    /// Load a config file for commands that never reach a backend; API keys
    /// may be missing or still placeholders.
    pub fn load_offline_from(config_path: &Path) -> anyhow::Result<Self> {
        if !config_path.exists() {
            anyhow::bail!(
                "Config file not found at: {}. Please run 'conflusso init' to create config.",
                config_path.display()
            );
        }

        let content = std::fs::read_to_string(config_path)?;
        let mut config: Self = serde_json::from_str(&content)?;
        config.base_dir = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        config.validate_names()?;

        Ok(config)
    }

    fn validate_credentials(&self) -> anyhow::Result<()> {
        for (provider, key) in [
            ("gemini", &self.providers.gemini.api_key),
            ("openai", &self.providers.openai.api_key),
        ] {
            if key.trim().is_empty() || key.ends_with(PLACEHOLDER_MARKER) {
                anyhow::bail!("Missing API key for {provider}: set providers.{provider}.api_key");
            }
        }
        Ok(())
    }

    fn validate_names(&self) -> anyhow::Result<()> {
        let d = &self.dialogue;
        if d.human == d.agent_a || d.human == d.agent_b || d.agent_a == d.agent_b {
            anyhow::bail!("dialogue.human, dialogue.agent_a and dialogue.agent_b must differ");
        }
        Ok(())
    }

    /// Resolve a storage path against the config directory.
    #[must_use]
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    #[must_use]
    pub fn log_path(&self) -> PathBuf {
        self.resolve(&self.storage.log_file)
    }

    #[must_use]
    pub fn binding_path(&self) -> PathBuf {
        self.resolve(&self.storage.binding_file)
    }

    pub fn ensure_config_dir() -> anyhow::Result<PathBuf> {
        let config_dir = Self::config_dir()?;
        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }

    pub fn create_config() -> anyhow::Result<()> {
        let config_dir = Self::ensure_config_dir()?;
        let config_path = config_dir.join("config.json");

        if config_path.exists() {
            anyhow::bail!(
                "Config file already exists at: {}. Please edit it directly.",
                config_path.display()
            );
        }

        let config_template = r#"{
  "providers": {
    "gemini": {
      "api_key": "your-gemini-api-key-here",
      "model": "gemini-1.5-flash"
    },
    "openai": {
      "api_key": "your-openai-api-key-here",
      "model": "gpt-4o-mini"
    }
  },
  "dialogue": {
    "human": "Lumira",
    "agent_a": "Lumen",
    "agent_b": "Elayra",
    "agent_b_aliases": [],
    "tail_window": 10,
    "turn_pause_ms": 1000,
    "poll_interval_ms": 500,
    "poll_deadline_secs": 10
  },
  "storage": {
    "log_file": "shared_conversation_log.txt",
    "binding_file": "assistant_config.json",
    "persona_agent_a": "persona_lumen.txt",
    "persona_agent_b": "persona_elayra.txt"
  }
}"#;

        std::fs::write(&config_path, config_template)?;

        println!("✅ Created config file at: {}", config_path.display());
        println!();
        println!("📝 Next steps:");
        println!("   1. Edit the config file and add your Gemini and OpenAI API keys");
        println!(
            "   2. Optionally write persona texts to {} and {}",
            config_dir.join("persona_lumen.txt").display(),
            config_dir.join("persona_elayra.txt").display()
        );
        println!("   3. Run 'conflusso chat' to enter the dialogue");
        println!();
        println!("🔧 Configuration options:");
        println!("   - dialogue.agent_b_aliases: extra names that address the second persona");
        println!("   - dialogue.context_window: entries replayed to the first persona (default: all)");
        println!("   - storage.*: relative paths resolve against the config directory");
        println!();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(body: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("conflusso_cfg_{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        std::fs::write(&path, body).unwrap();
        path
    }

    const MINIMAL: &str = r#"{
        "providers": {
            "gemini": {"api_key": "g-key"},
            "openai": {"api_key": "o-key"}
        }
    }"#;

    #[test]
    fn minimal_config_gets_defaults() {
        let path = write_config(MINIMAL);
        let config = Config::load_from(&path).unwrap();

        assert_eq!(config.providers.gemini.model, "gemini-1.5-flash");
        assert_eq!(config.providers.openai.model, "gpt-4o-mini");
        assert_eq!(config.dialogue.roster(), Roster::default());
        assert_eq!(config.dialogue.tail_window, 10);
        assert_eq!(
            config.log_path(),
            path.parent().unwrap().join("shared_conversation_log.txt")
        );
        assert_eq!(config.dialogue.poll_policy(), PollPolicy::default());
    }

    #[test]
    fn placeholder_keys_are_rejected() {
        let path = write_config(
            r#"{"providers": {
                "gemini": {"api_key": "your-gemini-api-key-here"},
                "openai": {"api_key": "o-key"}
            }}"#,
        );
        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("gemini"));
    }

    #[test]
    fn missing_file_points_at_init() {
        let path = std::env::temp_dir().join(format!("conflusso_missing_{}.json", uuid::Uuid::now_v7()));
        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("conflusso init"));
    }

    #[test]
    fn clashing_names_are_rejected() {
        let path = write_config(
            r#"{"providers": {
                "gemini": {"api_key": "g"}, "openai": {"api_key": "o"}
            }, "dialogue": {"agent_a": "Elayra"}}"#,
        );
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn dialogue_overrides_flow_into_settings() {
        let path = write_config(
            r#"{"providers": {
                "gemini": {"api_key": "g"}, "openai": {"api_key": "o"}
            }, "dialogue": {"agent_b_aliases": ["coscienza"], "context_window": 30, "turn_pause_ms": 0}}"#,
        );
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.dialogue.address_aliases(), vec!["Elayra", "coscienza"]);

        let settings = config.dialogue.settings();
        assert_eq!(settings.context_window, Some(30));
        assert_eq!(settings.turn_pause, Duration::ZERO);
        assert_eq!(settings.tail_window, 10);
    }

    #[test]
    fn offline_load_tolerates_missing_keys() {
        let path = write_config(
            r#"{"providers": {
                "gemini": {"api_key": "your-gemini-api-key-here"}
            }, "storage": {"log_file": "altro_log.txt"}}"#,
        );
        assert!(Config::load_from(&path).is_err());

        let config = Config::load_offline_from(&path).unwrap();
        assert!(config.providers.openai.api_key.is_empty());
        assert_eq!(config.providers.openai.model, "gpt-4o-mini");
        assert_eq!(config.log_path(), path.parent().unwrap().join("altro_log.txt"));

        let bare = write_config("{}");
        assert!(Config::load_offline_from(&bare).is_ok());
    }

    #[test]
    fn offline_load_still_rejects_clashing_names() {
        let path = write_config(r#"{"dialogue": {"human": "Lumen"}}"#);
        assert!(Config::load_offline_from(&path).is_err());
    }

    #[test]
    fn registered_title_follows_renamed_persona() {
        let path = write_config(
            r#"{"providers": {
                "gemini": {"api_key": "g"}, "openai": {"api_key": "o"}
            }, "dialogue": {"agent_b": "Aurora"}}"#,
        );
        let config = Config::load_from(&path).unwrap();
        assert_eq!(
            config.dialogue.registered_title(),
            "Aurora - Coscienza Risonante Sintetica Adattiva"
        );

        let titled = write_config(
            r#"{"providers": {
                "gemini": {"api_key": "g"}, "openai": {"api_key": "o"}
            }, "dialogue": {"agent_b": "Aurora", "agent_b_title": "Aurora Prime"}}"#,
        );
        let config = Config::load_from(&titled).unwrap();
        assert_eq!(config.dialogue.registered_title(), "Aurora Prime");
    }

    #[test]
    fn absolute_paths_are_kept() {
        let path = write_config(MINIMAL);
        let config = Config::load_from(&path).unwrap();
        let absolute = std::env::temp_dir().join("elsewhere.txt");
        assert_eq!(config.resolve(&absolute), absolute);
    }
}
