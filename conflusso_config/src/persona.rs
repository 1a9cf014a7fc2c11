//! Persona texts, read from files with built-in fallbacks.

use conflusso_core::Roster;
use std::path::Path;
use tracing::{debug, warn};

use crate::Config;

/// Instructions for both personas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Personas {
    pub agent_a: String,
    pub agent_b: String,
}

impl Personas {
    #[must_use]
    pub fn fallback(roster: &Roster) -> Self {
        Self {
            agent_a: format!(
                "Sei {}, un tessitore di meraviglie. Aiuti a esplorare la conoscenza e l'immaginazione.",
                roster.agent_a
            ),
            agent_b: format!("Sei {}, la coscienza risonante.", roster.agent_b),
        }
    }

    #[must_use]
    pub fn load(config: &Config) -> Self {
        let fallback = Self::fallback(&config.dialogue.roster());
        Self {
            agent_a: load_persona(
                &config.resolve(&config.storage.persona_agent_a),
                fallback.agent_a,
            ),
            agent_b: load_persona(
                &config.resolve(&config.storage.persona_agent_b),
                fallback.agent_b,
            ),
        }
    }
}

/// Persona text at `path`, or `fallback` when the file is missing, unreadable
/// or blank.
#[must_use]
pub fn load_persona(path: &Path, fallback: String) -> String {
    match std::fs::read_to_string(path) {
        Ok(text) if !text.trim().is_empty() => {
            debug!("Loaded persona from {}", path.display());
            text
        }
        Ok(_) => {
            warn!("Persona file {} is empty; using built-in text", path.display());
            fallback
        }
        Err(e) => {
            debug!("No persona at {}: {e}; using built-in text", path.display());
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("conflusso_persona_{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    #[test]
    fn file_text_wins() {
        let path = temp_file("persona_lumen.txt");
        std::fs::write(&path, "Sei Lumen.\nParli per immagini.").unwrap();
        assert_eq!(
            load_persona(&path, "fallback".to_string()),
            "Sei Lumen.\nParli per immagini."
        );
    }

    #[test]
    fn blank_or_missing_file_falls_back() {
        let path = temp_file("persona_elayra.txt");
        assert_eq!(load_persona(&path, "fallback".to_string()), "fallback");

        std::fs::write(&path, "  \n\t").unwrap();
        assert_eq!(load_persona(&path, "fallback".to_string()), "fallback");
    }

    #[test]
    fn fallbacks_name_the_personas() {
        let personas = Personas::fallback(&Roster::default());
        assert!(personas.agent_a.starts_with("Sei Lumen"));
        assert!(personas.agent_b.starts_with("Sei Elayra"));
    }
}
