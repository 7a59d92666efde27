//! Answering service backed by an OpenAI-compatible chat-completions API
//!
//! Works with local Ollama (the default configuration) as well as hosted
//! endpoints. Each question is one request; nothing is retried.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::AssistantConfig;
use crate::qa::QaRequest;
use crate::traits::AnsweringService;
use crate::types::{ReconError, ReconResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// HTTP client for `POST {base_url}/chat/completions`
pub struct ChatCompletionsClient {
    http_client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    system_prompt: String,
}

impl ChatCompletionsClient {
    pub fn new(config: &AssistantConfig) -> ReconResult<Self> {
        config.validate()?;
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ReconError::Answering(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            system_prompt: config.system_prompt.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The two messages sent for `request`
    pub fn build_messages(&self, request: &QaRequest) -> ReconResult<Vec<ChatMessage>> {
        let data = serde_json::to_string_pretty(request)?;
        Ok(vec![
            ChatMessage::system(self.system_prompt.clone()),
            ChatMessage::user(format!(
                "Here is the reconciliation data:\n\n{data}\n\n\
                 Now answer the user's question strictly based on this data."
            )),
        ])
    }
}

#[async_trait]
impl AnsweringService for ChatCompletionsClient {
    async fn answer(&self, request: &QaRequest) -> ReconResult<String> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: self.build_messages(request)?,
        };

        debug!(endpoint = %self.endpoint, model = %self.model, "Querying answering service");

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ReconError::Answering(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ReconError::Answering(format!(
                "HTTP {}: {}",
                status.as_u16(),
                error_text
            )));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ReconError::Answering(format!("malformed response: {e}")))?;

        let answer = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .ok_or_else(|| ReconError::Answering("response contained no choices".to_string()))?;

        info!(model = %self.model, chars = answer.len(), "Received answer");
        Ok(answer)
    }
}
