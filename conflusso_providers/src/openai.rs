//! OpenAI Assistants v2: assistants, threads, messages and runs.

use async_trait::async_trait;
use conflusso_core::{AssistantsApi, Role, Run, ThreadMessage};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::error::decode;
use crate::retry::{RetryPolicy, is_safe_to_resend, is_transient, retry_with_backoff};

const SERVICE: &str = "openai";

#[derive(Debug, Deserialize)]
struct Created {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MessageList {
    data: Vec<MessageObject>,
}

#[derive(Debug, Deserialize)]
struct MessageObject {
    role: String,
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: TextValue },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct TextValue {
    value: String,
}

/// Thread-backed assistant client.
pub struct OpenAiAssistants {
    client: Client,
    api_key: String,
    base_url: String,
    retry: RetryPolicy,
}

impl OpenAiAssistants {
    pub fn new(api_key: String) -> Self {
        info!("Creating OpenAiAssistants client");
        Self {
            client: Client::new(),
            api_key,
            base_url: "https://api.openai.com/v1".to_string(),
            retry: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .bearer_auth(&self.api_key)
            .header("OpenAI-Beta", "assistants=v2")
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> anyhow::Result<T> {
        let url = format!("{}{path}", self.base_url);
        retry_with_backoff(
            || {
                let request = self.authorized(self.client.get(&url));
                async move { decode::<T>(SERVICE, request.send().await?).await }
            },
            &self.retry,
            is_transient,
        )
        .await
    }

    /// Every POST here creates an object, so a request that may have been
    /// applied is never sent twice.
    async fn post<T: DeserializeOwned>(&self, path: &str, body: &Value) -> anyhow::Result<T> {
        let url = format!("{}{path}", self.base_url);
        retry_with_backoff(
            || {
                let request = self.authorized(self.client.post(&url)).json(body);
                async move { decode::<T>(SERVICE, request.send().await?).await }
            },
            &self.retry,
            is_safe_to_resend,
        )
        .await
    }
}

fn thread_messages(list: MessageList) -> Vec<ThreadMessage> {
    list.data
        .into_iter()
        .map(|m| ThreadMessage {
            role: if m.role == "assistant" {
                Role::Assistant
            } else {
                Role::User
            },
            texts: m
                .content
                .into_iter()
                .filter_map(|block| match block {
                    ContentBlock::Text { text } => Some(text.value),
                    ContentBlock::Other => None,
                })
                .collect(),
        })
        .collect()
}

#[async_trait]
impl AssistantsApi for OpenAiAssistants {
    async fn retrieve_assistant(&self, assistant_id: &str) -> anyhow::Result<()> {
        let _: Value = self.get(&format!("/assistants/{assistant_id}")).await?;
        Ok(())
    }

    async fn create_assistant(
        &self,
        name: &str,
        instructions: &str,
        model: &str,
    ) -> anyhow::Result<String> {
        let body = json!({
            "name": name,
            "instructions": instructions,
            "model": model,
        });
        let created: Created = self.post("/assistants", &body).await?;
        Ok(created.id)
    }

    async fn retrieve_thread(&self, thread_id: &str) -> anyhow::Result<()> {
        let _: Value = self.get(&format!("/threads/{thread_id}")).await?;
        Ok(())
    }

    async fn create_thread(&self, assistant_id: &str) -> anyhow::Result<String> {
        // Threads are not owned by an assistant; the id is kept as metadata.
        let body = json!({ "metadata": { "assistant_id": assistant_id } });
        let created: Created = self.post("/threads", &body).await?;
        Ok(created.id)
    }

    async fn add_user_message(&self, thread_id: &str, content: &str) -> anyhow::Result<()> {
        let body = json!({ "role": "user", "content": content });
        let _: Value = self
            .post(&format!("/threads/{thread_id}/messages"), &body)
            .await?;
        Ok(())
    }

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> anyhow::Result<Run> {
        let body = json!({ "assistant_id": assistant_id });
        self.post(&format!("/threads/{thread_id}/runs"), &body).await
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> anyhow::Result<Run> {
        self.get(&format!("/threads/{thread_id}/runs/{run_id}")).await
    }

    async fn list_messages(&self, thread_id: &str) -> anyhow::Result<Vec<ThreadMessage>> {
        let list: MessageList = self
            .get(&format!("/threads/{thread_id}/messages?order=desc&limit=20"))
            .await?;
        debug!("Fetched {} messages from thread {thread_id}", list.data.len());
        Ok(thread_messages(list))
    }
}
