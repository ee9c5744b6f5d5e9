//! MindPod Voice: a voice-driven command coordinator.
//!
//! The assistant listens for one utterance at a time, routes the transcript
//! to an app action or an AI collaborator, and speaks the reply:
//! Microphone → recognition → command routing / AI → synthesis → Speaker
//!
//! # Architecture
//!
//! A single coordinator task owns the assistant status and arbitrates the
//! two platform speech capabilities so they are never active together:
//! - **Speech input**: single-shot recognition sessions over a
//!   [`platform::SpeechRecognizer`]
//! - **Speech output**: race-safe playback over a
//!   [`platform::SpeechSynthesizer`], deferring until the voice catalog loads
//! - **Onboarding**: first-run display-name capture
//! - **Command routing**: keyword commands first, the AI collaborator last
//! - **Activation control**: the single microphone affordance shown by the UI

pub mod activation;
pub mod config;
pub mod error;
pub mod llm;
pub mod onboarding;
pub mod pipeline;
pub mod platform;
pub mod runtime;
pub mod session;
pub mod status;
pub mod store;
pub mod stt;
pub mod tts;
pub mod voice_command;

#[cfg(test)]
mod test_utils;

pub use activation::{Activation, ActivationControl};
pub use config::AssistantConfig;
pub use error::{AssistantError, Result};
pub use pipeline::coordinator::{AssistantCoordinator, AssistantHandle};
pub use pipeline::messages::SpeechOutcome;
pub use runtime::RuntimeEvent;
pub use status::AssistantStatus;
