#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

//! Turn-taking engine for a three-party dialogue between a human operator,
//! a stateless persona and a stateful (thread-backed) persona.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod assistants;
pub mod clock;
pub mod orchestrator;
pub mod provisioning;
pub mod responder;
pub mod scheduler;
pub mod speaker;
pub mod transcript;

pub use assistants::{AssistantBinding, AssistantsApi, Run, RunStatus, ThreadMessage};
pub use clock::{Clock, ManualClock, SystemClock};
pub use orchestrator::{
    DialogueSettings, Operator, Orchestrator, OrchestratorError, Session, SessionSummary,
};
pub use provisioning::{AssistantProfile, ProvisionError, ProvisionReport, provision};
pub use responder::{
    PollPolicy, Responder, Sentinels, StatefulResponder, StatelessResponder,
};
pub use scheduler::{Routing, TurnScheduler};
pub use speaker::{Roster, Speaker};
pub use transcript::{LogEntry, TranscriptStore};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LLMResponse {
    pub content: String,
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A completion backend that keeps no server-side memory: the whole
/// context travels with every call.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn chat(&self, messages: &[ChatMessage], model: &str) -> anyhow::Result<LLMResponse>;
    fn get_default_model(&self) -> &str;
}

#[async_trait]
impl<T> ChatProvider for std::sync::Arc<T>
where
    T: ChatProvider + ?Sized,
{
    async fn chat(&self, messages: &[ChatMessage], model: &str) -> anyhow::Result<LLMResponse> {
        (**self).chat(messages, model).await
    }

    fn get_default_model(&self) -> &str {
        (**self).get_default_model()
    }
}
