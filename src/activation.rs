//! The single microphone affordance shown by the UI.
//!
//! Purely derived from [`AssistantStatus`]: pressing it stops listening while
//! listening and starts listening otherwise. In `error` the press still maps
//! to "start listening", which the coordinator ignores.

use crate::pipeline::coordinator::AssistantHandle;
use crate::status::AssistantStatus;

/// What pressing the control does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    StartListening,
    StopListening,
}

/// Visual treatment of the control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    /// Idle, waiting for a press.
    Muted,
    /// Listening.
    Pulsing,
    /// Speaking.
    Active,
    /// Thinking.
    Busy,
    /// Error; restart required.
    Alert,
}

/// Presentation and behaviour of the control for one status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivationControl {
    pub action: Activation,
    pub indicator: Indicator,
    pub title: &'static str,
}

impl ActivationControl {
    pub fn for_status(status: AssistantStatus) -> Self {
        let (action, indicator, title) = match status {
            AssistantStatus::Idle => (
                Activation::StartListening,
                Indicator::Muted,
                "Click to activate voice assistant",
            ),
            AssistantStatus::Listening => (
                Activation::StopListening,
                Indicator::Pulsing,
                "Listening... Click to stop",
            ),
            AssistantStatus::Speaking => (
                Activation::StartListening,
                Indicator::Active,
                "Speaking...",
            ),
            AssistantStatus::Thinking => (
                Activation::StartListening,
                Indicator::Busy,
                "Thinking...",
            ),
            AssistantStatus::Error => (
                Activation::StartListening,
                Indicator::Alert,
                "An error occurred. Please restart.",
            ),
        };
        Self {
            action,
            indicator,
            title,
        }
    }

    /// Press the control for the handle's current status.
    pub fn press(handle: &AssistantHandle) -> Activation {
        let control = Self::for_status(handle.status());
        match control.action {
            Activation::StartListening => handle.start_listening(),
            Activation::StopListening => handle.stop_listening(),
        }
        control.action
    }
}
