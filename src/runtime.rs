//! Runtime events emitted by the coordinator for the application shell.
//!
//! This is intentionally lightweight so the coordinator can broadcast without
//! caring whether anyone listens.

use crate::status::AssistantStatus;
use crate::voice_command::Screen;

/// Events that describe what the assistant is doing "right now".
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeEvent {
    /// The assistant status changed.
    StatusChanged(AssistantStatus),
    /// A final transcript was recognized.
    Transcript { text: String },
    /// The shell should switch to a screen.
    Navigate(Screen),
    /// An utterance was handed to the synthesizer.
    AssistantSpoke { text: String },
    /// Onboarding stored the user's display name.
    DisplayNameCaptured { name: String },
    /// A speech capability failed; the assistant is now in `error`.
    CapabilityFailed { message: String },
}
