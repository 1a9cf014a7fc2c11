use conflusso_config::BindingStore;
use std::path::PathBuf;

/// Deletes the stored assistant binding; the next `chat` provisions anew.
#[derive(Debug, Clone, Copy)]
pub struct ResetStrategy;

impl super::CommandStrategy for ResetStrategy {
    type Input = Option<PathBuf>;

    async fn execute(&self, config_path: Self::Input) -> anyhow::Result<()> {
        let config = super::load_offline_config(config_path.as_deref())?;
        let store = BindingStore::new(config.binding_path());

        if store.reset()? {
            println!("Removed assistant binding at {}", store.path().display());
        } else {
            println!("No assistant binding at {}", store.path().display());
        }
        Ok(())
    }
}
