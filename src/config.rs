//! Configuration types for the voice assistant.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration for the assistant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Speech output/input settings.
    pub voice: VoiceConfig,
    /// Listening session settings.
    pub listening: ListeningConfig,
    /// First-run name capture dialog.
    pub onboarding: OnboardingConfig,
    /// Canned spoken replies.
    pub replies: ReplyConfig,
    /// AI completion backend.
    pub ai: AiConfig,
    /// Durable state location.
    pub storage: StorageConfig,
}

/// Speech settings shared by recognition and synthesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// BCP-47 language tag used for recognition and voice selection.
    pub language: String,
    /// Speaking rate used by the console synthesizer.
    pub words_per_minute: u32,
    /// Delay before the console synthesizer publishes its voice catalog.
    pub catalog_delay_ms: u64,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            language: "en-US".to_owned(),
            words_per_minute: 180,
            catalog_delay_ms: 50,
        }
    }
}

/// Listening session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListeningConfig {
    /// Upper bound on a single listening session in milliseconds.
    ///
    /// `0` disables the bound: the session then ends only via explicit stop,
    /// a recognized utterance, or a platform end/error event.
    pub timeout_ms: u64,
}

impl Default for ListeningConfig {
    fn default() -> Self {
        Self { timeout_ms: 15_000 }
    }
}

impl ListeningConfig {
    /// The timeout as a `Duration`, or `None` when disabled.
    pub fn timeout(&self) -> Option<std::time::Duration> {
        (self.timeout_ms > 0).then(|| std::time::Duration::from_millis(self.timeout_ms))
    }
}

/// Onboarding dialog configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OnboardingConfig {
    /// Greeting and name prompt spoken on first activation.
    pub greeting: String,
    /// Acknowledgment after a name is captured. `{name}` is substituted.
    pub acknowledgment: String,
    /// Spoken when the answer was empty after cleaning.
    pub reprompt: String,
    /// Number of empty answers tolerated before giving up.
    pub max_name_attempts: u32,
    /// Name used for the rest of the session after giving up.
    pub fallback_name: String,
    /// Spoken after giving up. `{name}` is substituted with `fallback_name`.
    pub give_up: String,
}

impl Default for OnboardingConfig {
    fn default() -> Self {
        Self {
            greeting: "Hi there! To personalize our chat, what should I call you?".to_owned(),
            acknowledgment:
                "Nice to meet you, {name}. You can click the microphone to ask for help.".to_owned(),
            reprompt: "I didn't quite catch that. Could you tell me your name again?".to_owned(),
            max_name_attempts: 3,
            fallback_name: "friend".to_owned(),
            give_up: "No problem, I'll call you {name} for now. You can click the microphone to ask for help."
                .to_owned(),
        }
    }
}

/// Canned replies spoken by the command router.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplyConfig {
    /// Greeting reply. `{name}` is substituted.
    pub greeting: String,
    /// Name used in replies when no display name is stored.
    pub anonymous_name: String,
    /// Spoken when the AI collaborator fails.
    pub ai_failure: String,
    /// Prefix for a spoken document summary.
    pub summary_prefix: String,
    /// Spoken when the selected document cannot be summarized.
    pub summary_failure: String,
    /// Spoken when no document is selected in the reading view.
    pub summary_needs_document: String,
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            greeting: "Hello, {name}! How can I help you today?".to_owned(),
            anonymous_name: "friend".to_owned(),
            ai_failure: "I had trouble understanding that. Could you please try again?".to_owned(),
            summary_prefix: "Here is a summary of the document: ".to_owned(),
            summary_failure: "I'm sorry, I couldn't read that document to summarize it.".to_owned(),
            summary_needs_document: "Please select a document in the reading view first."
                .to_owned(),
        }
    }
}

/// AI completion backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Base URL of an OpenAI-compatible server. Empty disables the backend.
    pub api_url: String,
    /// Model identifier sent with each request.
    pub api_model: String,
    /// Environment variable holding the API key (optional).
    pub api_key_env: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// System prompt for the general-purpose session.
    pub general_system_prompt: String,
    /// System prompt for the voice assistant persona.
    pub assistant_system_prompt: String,
    /// Spoken when no backend is available.
    pub offline_reply: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            api_model: "llama3.2".to_owned(),
            api_key_env: "MINDPOD_API_KEY".to_owned(),
            timeout_secs: 30,
            general_system_prompt:
                "You are a helpful and versatile assistant for studying, note-taking, and creativity."
                    .to_owned(),
            assistant_system_prompt: "You are MindPod Voice Assistant, a friendly, calm study companion. \
                 Respond briefly, clearly, and helpfully; your answer will be spoken aloud. \
                 Keep answers under 2 sentences unless the user asks for more detail. \
                 Use simple words and avoid technical jargon. If you don't know the answer, say so."
                .to_owned(),
            offline_reply:
                "I'm sorry, I'm running in offline mode and can't answer that question right now."
                    .to_owned(),
        }
    }
}

impl AiConfig {
    /// Resolve the API key from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        if self.api_key_env.is_empty() {
            return None;
        }
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}

/// Durable state configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON file backing the durable key-value store.
    pub state_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_path: default_data_dir().join("state.json"),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("mindpod-voice")
}

/// Substitute `{name}` in a reply template.
pub fn fill_name(template: &str, name: &str) -> String {
    template.replace("{name}", name)
}

impl AssistantConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::error::AssistantError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &std::path::Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::AssistantError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `~/.config/mindpod-voice/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config)
                .join("mindpod-voice")
                .join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("mindpod-voice")
                .join("config.toml")
        } else {
            PathBuf::from("/tmp/mindpod-voice-config/config.toml")
        }
    }
}
