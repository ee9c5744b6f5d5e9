//! The assistant status: single source of truth for the UI and for which
//! coordinator operations are legal.
//!
//! ```text
//! idle ──start_listening──▶ listening ──transcript──▶ thinking ──reply──▶ speaking
//!  ▲                            │                        │                  │
//!  └────────── end / stop ──────┴──── silent reply ──────┴──── finished ────┘
//!
//! any ──capability failure──▶ error   (terminal)
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// What the assistant is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AssistantStatus {
    /// Waiting for the user to activate the assistant.
    #[default]
    Idle,
    /// A recognition session is active.
    Listening,
    /// A transcript is being routed.
    Thinking,
    /// An utterance is playing.
    Speaking,
    /// A speech capability failed. Terminal for the session.
    Error,
}

impl AssistantStatus {
    /// Whether no further transitions may happen from this status.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self == Self::Error
    }

    /// Return the canonical wire-format string for this status.
    ///
    /// # Examples
    ///
    /// ```
    /// use mindpod_voice::status::AssistantStatus;
    ///
    /// assert_eq!(AssistantStatus::Listening.as_str(), "listening");
    /// ```
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Listening => "listening",
            Self::Thinking => "thinking",
            Self::Speaking => "speaking",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for AssistantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
