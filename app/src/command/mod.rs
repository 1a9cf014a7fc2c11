//! Static strategy pattern for CLI commands.
//!
//! Each command is its own zero-sized strategy type with its own input type,
//! dispatched statically from `main`.

use conflusso_config::Config;
use std::path::{Path, PathBuf};

mod chat;
mod history;
mod info;
mod init;
mod reset;
mod version;

pub use chat::{ChatInput, ChatStrategy};
pub use history::{HistoryInput, HistoryStrategy};
pub use info::InfoStrategy;
pub use init::InitStrategy;
pub use reset::ResetStrategy;
pub use version::VersionStrategy;

/// Contract shared by all command strategies.
pub trait CommandStrategy: Send + Sync + 'static {
    /// The input type this strategy accepts.
    type Input;

    /// Execute the command with the given input.
    ///
    /// # Errors
    /// Returns an error if command execution fails.
    async fn execute(&self, input: Self::Input) -> anyhow::Result<()>;
}

fn config_path(path: Option<&Path>) -> anyhow::Result<PathBuf> {
    match path {
        Some(p) => Ok(p.to_path_buf()),
        None => Config::default_path(),
    }
}

/// Load the config from `path`, or from the default location.
fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    Config::load_from(&config_path(path)?)
}

/// Like [`load_config`], for commands that only touch local files.
fn load_offline_config(path: Option<&Path>) -> anyhow::Result<Config> {
    Config::load_offline_from(&config_path(path)?)
}
