use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::{ChatMessage, ChatProvider, LogEntry, Responder, Role};

/// Reply the persona gives to its own instructions in the bootstrap turn.
pub const DEFAULT_ACKNOWLEDGEMENT: &str =
    "Ok, ho compreso la mia identità e il mio ruolo. Sono pronto a tessere.";

/// Persona backed by a completion API with no server-side memory.
///
/// Every call rebuilds the context: the persona text as an opening user turn,
/// a canned acknowledgement, then the transcript where only the persona's own
/// lines take the assistant role.
pub struct StatelessResponder<P = Arc<dyn ChatProvider>>
where
    P: Send + Sync,
{
    provider: P,
    name: String,
    persona: String,
    acknowledgement: String,
    model: String,
    failure_reply: String,
}

impl<P> StatelessResponder<P>
where
    P: ChatProvider + Send + Sync,
{
    /// `name` is the persona's transcript name; it decides which past lines
    /// are replayed as the model's own.
    pub fn new(
        provider: P,
        name: impl Into<String>,
        persona: impl Into<String>,
        failure_reply: impl Into<String>,
    ) -> Self {
        let model = provider.get_default_model().to_string();
        Self {
            provider,
            name: name.into(),
            persona: persona.into(),
            acknowledgement: DEFAULT_ACKNOWLEDGEMENT.to_string(),
            model,
            failure_reply: failure_reply.into(),
        }
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    #[must_use]
    pub fn with_acknowledgement(mut self, acknowledgement: impl Into<String>) -> Self {
        self.acknowledgement = acknowledgement.into();
        self
    }

    /// The full message list sent for one call, bootstrap turns included.
    #[must_use]
    pub fn build_context(&self, input: &str, history: &[LogEntry]) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(history.len() + 3);
        messages.push(ChatMessage::user(self.persona.clone()));
        messages.push(ChatMessage::assistant(self.acknowledgement.clone()));
        messages.extend(history.iter().map(|entry| {
            let role = if entry.speaker == self.name {
                Role::Assistant
            } else {
                Role::User
            };
            ChatMessage {
                role,
                content: entry.message.clone(),
            }
        }));
        messages.push(ChatMessage::user(input));
        messages
    }

    async fn try_respond(&self, input: &str, history: &[LogEntry]) -> anyhow::Result<String> {
        let messages = self.build_context(input, history);
        info!(
            "{} replaying {} messages to model {}",
            self.name,
            messages.len(),
            self.model
        );

        let response = self.provider.chat(&messages, &self.model).await?;
        if let Some(usage) = &response.usage {
            debug!(
                "Tokens: {} prompt + {} completion = {} total",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }

        let text = response.content.trim();
        if text.is_empty() {
            anyhow::bail!("empty reply from model {}", self.model);
        }
        Ok(text.to_string())
    }
}

#[async_trait]
impl<P> Responder for StatelessResponder<P>
where
    P: ChatProvider + Send + Sync,
{
    async fn respond(&self, input: &str, history: &[LogEntry]) -> String {
        match self.try_respond(input, history).await {
            Ok(text) => text,
            Err(e) => {
                error!("{} backend failed: {e:#}", self.name);
                self.failure_reply.clone()
            }
        }
    }
}
