//! Google Gemini `generateContent` client.

use async_trait::async_trait;
use conflusso_core::{ChatMessage, ChatProvider, LLMResponse, Role, Usage};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::decode;
use crate::retry::{RetryPolicy, is_transient, retry_with_backoff};

const SERVICE: &str = "gemini";

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

/// Stateless chat backend: the whole context is sent with every request.
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    default_model: String,
    retry: RetryPolicy,
}

impl GeminiProvider {
    pub fn new(api_key: String) -> Self {
        info!("Creating GeminiProvider");
        Self {
            client: Client::new(),
            api_key,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            default_model: "gemini-1.5-flash".to_string(),
            retry: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    #[must_use]
    pub fn with_default_model(mut self, model: String) -> Self {
        self.default_model = model;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn try_send(
        &self,
        model: &str,
        request: &GenerateContentRequest<'_>,
    ) -> anyhow::Result<LLMResponse> {
        let response = self
            .client
            .post(format!("{}/models/{model}:generateContent", self.base_url))
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;
        let body: GenerateContentResponse = decode(SERVICE, response).await?;
        extract_reply(body)
    }
}

fn build_request(messages: &[ChatMessage]) -> GenerateContentRequest<'_> {
    GenerateContentRequest {
        contents: messages
            .iter()
            .map(|m| Content {
                role: match m.role {
                    Role::User => "user",
                    Role::Assistant => "model",
                },
                parts: [Part { text: &m.content }],
            })
            .collect(),
    }
}

fn extract_reply(response: GenerateContentResponse) -> anyhow::Result<LLMResponse> {
    if let Some(reason) = response
        .prompt_feedback
        .and_then(|f| f.block_reason)
    {
        anyhow::bail!("prompt blocked: {reason}");
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("Invalid response format: no candidates"))?;

    let content: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if content.is_empty() {
        anyhow::bail!(
            "Invalid response format: candidate has no text (finish reason {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        );
    }

    let usage = response.usage_metadata.map(|u| Usage {
        prompt_tokens: u.prompt_token_count,
        completion_tokens: u.candidates_token_count,
        total_tokens: u.total_token_count,
    });

    Ok(LLMResponse { content, usage })
}

#[async_trait]
impl ChatProvider for GeminiProvider {
    async fn chat(&self, messages: &[ChatMessage], model: &str) -> anyhow::Result<LLMResponse> {
        let request = build_request(messages);

        info!("Sending request to Gemini API: model={model}");

        let response = retry_with_backoff(
            || self.try_send(model, &request),
            &self.retry,
            is_transient,
        )
        .await?;

        info!("Received response from Gemini API");
        Ok(response)
    }

    fn get_default_model(&self) -> &str {
        &self.default_model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_map_to_gemini_names() {
        let messages = vec![
            ChatMessage::user("persona"),
            ChatMessage::assistant("ok"),
            ChatMessage::user("ciao"),
        ];
        let json = serde_json::to_value(build_request(&messages)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "contents": [
                    {"role": "user", "parts": [{"text": "persona"}]},
                    {"role": "model", "parts": [{"text": "ok"}]},
                    {"role": "user", "parts": [{"text": "ciao"}]},
                ]
            })
        );
    }

    fn parse(body: &str) -> GenerateContentResponse {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn text_parts_are_joined() {
        let reply = extract_reply(parse(
            r#"{
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "Tessiamo "}, {"text": "insieme."}]},
                    "finishReason": "STOP"
                }],
                "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 4, "totalTokenCount": 16}
            }"#,
        ))
        .unwrap();
        assert_eq!(reply.content, "Tessiamo insieme.");
        let usage = reply.usage.unwrap();
        assert_eq!(usage.total_tokens, 16);
        assert_eq!(usage.completion_tokens, 4);
    }

    #[test]
    fn blocked_prompt_is_an_error() {
        let err = extract_reply(parse(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#))
            .unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn empty_candidate_is_an_error() {
        let err = extract_reply(parse(
            r#"{"candidates": [{"finishReason": "MAX_TOKENS"}]}"#,
        ))
        .unwrap_err();
        assert!(err.to_string().contains("MAX_TOKENS"));
        assert!(extract_reply(parse("{}")).is_err());
    }
}
