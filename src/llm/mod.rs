//! AI completion collaborator.
//!
//! The assistant treats the AI as an opaque, fallible text-in/text-out call
//! ([`AiCollaborator`]). [`AiService`] is the production implementation: it
//! owns two lazily created chat sessions over a [`LanguageModel`] backend, one
//! for general tasks such as summarization and one carrying the voice
//! assistant persona. Sessions are created on first use and reused after that.

pub mod api;

pub use api::OpenAiCompatibleModel;

use crate::config::AiConfig;
use crate::error::{AssistantError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tracing::{info, warn};

/// Text-in/text-out AI used by the command router.
#[async_trait]
pub trait AiCollaborator: Send + Sync {
    /// Answer a free-form spoken question.
    async fn query(&self, prompt: &str) -> Result<String>;

    /// Summarize a document's text.
    async fn summarize(&self, text: &str) -> Result<String>;
}

/// A multi-turn conversation with a model.
#[async_trait]
pub trait ChatSession: Send {
    /// Send a user message and return the model's reply.
    async fn prompt(&mut self, text: &str) -> Result<String>;
}

/// Backend capable of opening chat sessions.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Whether the backend can currently serve requests.
    async fn is_available(&self) -> bool;

    /// Open a session primed with `system_prompt`.
    async fn create_session(&self, system_prompt: &str) -> Result<Box<dyn ChatSession>>;
}

/// Backend used when no model is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineModel;

#[async_trait]
impl LanguageModel for OfflineModel {
    async fn is_available(&self) -> bool {
        false
    }

    async fn create_session(&self, _system_prompt: &str) -> Result<Box<dyn ChatSession>> {
        Err(AssistantError::Unavailable("AI model"))
    }
}

type SharedSession = Mutex<Box<dyn ChatSession>>;

/// Owns the general-purpose and assistant-persona sessions.
pub struct AiService {
    model: Arc<dyn LanguageModel>,
    config: AiConfig,
    general: OnceCell<SharedSession>,
    assistant: OnceCell<SharedSession>,
}

impl AiService {
    /// Create a service over `model`. No session is opened yet.
    pub fn new(model: Arc<dyn LanguageModel>, config: AiConfig) -> Self {
        Self {
            model,
            config,
            general: OnceCell::new(),
            assistant: OnceCell::new(),
        }
    }

    /// Build the service from configuration: an OpenAI-compatible backend
    /// when `api_url` is set, otherwise offline.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &AiConfig) -> Result<Self> {
        let model: Arc<dyn LanguageModel> = if config.api_url.trim().is_empty() {
            info!("no AI backend configured, running offline");
            Arc::new(OfflineModel)
        } else {
            Arc::new(OpenAiCompatibleModel::new(config)?)
        };
        Ok(Self::new(model, config.clone()))
    }

    async fn session<'a>(
        &'a self,
        cell: &'a OnceCell<SharedSession>,
        system_prompt: &str,
    ) -> Result<&'a SharedSession> {
        cell.get_or_try_init(|| async {
            info!("opening AI session");
            self.model.create_session(system_prompt).await.map(Mutex::new)
        })
        .await
    }
}

#[async_trait]
impl AiCollaborator for AiService {
    async fn query(&self, prompt: &str) -> Result<String> {
        if !self.model.is_available().await {
            return Ok(self.config.offline_reply.clone());
        }
        let session = self
            .session(&self.assistant, &self.config.assistant_system_prompt)
            .await?;
        let reply = session.lock().await.prompt(prompt).await;
        if let Err(e) = &reply {
            warn!("assistant query failed: {e}");
        }
        reply
    }

    async fn summarize(&self, text: &str) -> Result<String> {
        if !self.model.is_available().await {
            return Err(AssistantError::Unavailable("AI model"));
        }
        let session = self
            .session(&self.general, &self.config.general_system_prompt)
            .await?;
        let request = format!(
            "Summarize the following text in a few concise sentences suitable for reading aloud:\n\n{text}"
        );
        let mut session = session.lock().await;
        session.prompt(&request).await
    }
}
