//! OpenAI-compatible API backend for the AI collaborator.
//!
//! Supports any server implementing the OpenAI chat completions API:
//! - Ollama (`http://localhost:11434`)
//! - MLX server (`http://localhost:8080`)
//! - vLLM, llama.cpp server, etc.
//!
//! Replies are short spoken answers, so requests are non-streaming.

use crate::config::AiConfig;
use crate::error::{AssistantError, Result};
use crate::llm::{ChatSession, LanguageModel};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Messages kept per session, not counting the system prompt.
const MAX_HISTORY: usize = 20;

/// Language model reached over an OpenAI-compatible HTTP API.
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleModel {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiCompatibleModel {
    /// Create a backend from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &AiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| AssistantError::Ai(format!("failed to build HTTP client: {e}")))?;
        let endpoint = chat_completions_url(&config.api_url);
        info!("AI backend configured: {endpoint} model={}", config.api_model);
        Ok(Self {
            client,
            endpoint,
            model: config.api_model.clone(),
            api_key: config.api_key(),
        })
    }
}

#[async_trait]
impl LanguageModel for OpenAiCompatibleModel {
    async fn is_available(&self) -> bool {
        !self.endpoint.is_empty()
    }

    async fn create_session(&self, system_prompt: &str) -> Result<Box<dyn ChatSession>> {
        Ok(Box::new(ApiSession {
            backend: self.clone(),
            history: vec![ChatMessage {
                role: "system".to_owned(),
                content: system_prompt.to_owned(),
            }],
        }))
    }
}

/// One conversation against the HTTP backend.
struct ApiSession {
    backend: OpenAiCompatibleModel,
    history: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

impl ApiSession {
    fn trim_history(&mut self) {
        let excess = self.history.len().saturating_sub(MAX_HISTORY + 1);
        if excess > 0 {
            self.history.drain(1..=excess);
        }
    }
}

#[async_trait]
impl ChatSession for ApiSession {
    async fn prompt(&mut self, text: &str) -> Result<String> {
        self.history.push(ChatMessage {
            role: "user".to_owned(),
            content: text.to_owned(),
        });
        self.trim_history();

        let started = Instant::now();
        let body = ChatRequest {
            model: &self.backend.model,
            messages: &self.history,
            stream: false,
        };
        let mut request = self.backend.client.post(&self.backend.endpoint).json(&body);
        if let Some(key) = &self.backend.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AssistantError::Ai(format!("API request failed: {e}")))?
            .error_for_status()
            .map_err(|e| AssistantError::Ai(format!("API returned error status: {e}")))?;
        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AssistantError::Ai(format!("invalid API response: {e}")))?;

        let reply = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_owned())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| AssistantError::Ai("API response contained no reply".into()))?;

        debug!(
            "AI replied in {}ms: \"{reply}\"",
            started.elapsed().as_millis()
        );
        self.history.push(ChatMessage {
            role: "assistant".to_owned(),
            content: reply.clone(),
        });
        Ok(reply)
    }
}

fn chat_completions_url(api_url: &str) -> String {
    let trimmed = api_url.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let base = trimmed.trim_end_matches('/');
    let base = base.strip_suffix("/v1").unwrap_or(base);
    format!("{base}/v1/chat/completions")
}
