//! Stateful assistant backend: persona registrations, threads and runs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Role;

/// Identifiers of a previously provisioned stateful session.
///
/// Both fields start unset and are filled in by [`crate::provision`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantBinding {
    #[serde(rename = "agentId", alias = "elayra_assistant_id")]
    pub agent_id: Option<String>,
    #[serde(rename = "threadId", alias = "elayra_thread_id")]
    pub thread_id: Option<String>,
}

impl AssistantBinding {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.agent_id.is_none() && self.thread_id.is_none()
    }
}

/// Lifecycle state of an asynchronous run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Incomplete,
    Expired,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Terminal states other than `completed`; polling stops on these.
    #[must_use]
    pub const fn is_failure(self) -> bool {
        matches!(
            self,
            Self::Failed | Self::Cancelled | Self::Expired | Self::Incomplete
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Run {
    pub id: String,
    pub status: RunStatus,
}

/// A thread message reduced to its author and text blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadMessage {
    pub role: Role,
    pub texts: Vec<String>,
}

#[async_trait]
pub trait AssistantsApi: Send + Sync {
    /// Succeeds only if the assistant still exists remotely.
    async fn retrieve_assistant(&self, assistant_id: &str) -> anyhow::Result<()>;

    /// Register a persona; returns the new assistant id.
    async fn create_assistant(
        &self,
        name: &str,
        instructions: &str,
        model: &str,
    ) -> anyhow::Result<String>;

    async fn retrieve_thread(&self, thread_id: &str) -> anyhow::Result<()>;

    /// Open a thread for `assistant_id`; returns the new thread id.
    async fn create_thread(&self, assistant_id: &str) -> anyhow::Result<String>;

    async fn add_user_message(&self, thread_id: &str, content: &str) -> anyhow::Result<()>;

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> anyhow::Result<Run>;

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> anyhow::Result<Run>;

    /// Thread messages, newest first.
    async fn list_messages(&self, thread_id: &str) -> anyhow::Result<Vec<ThreadMessage>>;
}
