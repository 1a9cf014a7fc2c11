//! Persisted assistant/thread identifiers.

use conflusso_core::AssistantBinding;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Small JSON record holding the stateful persona's [`AssistantBinding`].
#[derive(Debug, Clone)]
pub struct BindingStore {
    path: PathBuf,
}

impl BindingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored binding. A missing or unreadable record yields an empty
    /// binding, which provisioning treats as "create everything".
    #[must_use]
    pub fn load(&self) -> AssistantBinding {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return AssistantBinding::default(),
            Err(e) => {
                warn!("Cannot read {}: {e}; starting unbound", self.path.display());
                return AssistantBinding::default();
            }
        };
        serde_json::from_slice(&bytes).unwrap_or_else(|e| {
            warn!("Ignoring corrupt {}: {e}", self.path.display());
            AssistantBinding::default()
        })
    }

    /// Replace the record in one rename so readers never see a partial file.
    pub fn save(&self, binding: &AssistantBinding) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut staged = self.path.clone().into_os_string();
        staged.push(".tmp");
        let staged = PathBuf::from(staged);

        std::fs::write(&staged, serde_json::to_string_pretty(binding)?)?;
        std::fs::rename(&staged, &self.path)?;
        info!("Saved assistant binding to {}", self.path.display());
        Ok(())
    }

    /// Forget the stored binding. Returns whether a record existed.
    pub fn reset(&self) -> anyhow::Result<bool> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
