//! First-run name capture dialog.
//!
//! ```text
//! greeting ──spoken──▶ gathering ──name──▶ acknowledged
//!                        │   ▲
//!                  empty │   │ re-prompt (bounded)
//!                        ▼   │
//!                      retry ─┘──limit──▶ gave up (session alias)
//! ```
//!
//! The flow owns no assistant status of its own; it only decides what to say
//! next. The coordinator speaks the lines and reopens the microphone.

use crate::config::{OnboardingConfig, fill_name};
use crate::session::SessionState;
use tracing::info;

/// Outcome of one answer to the name prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameAnswer {
    /// A usable name was heard.
    Captured(String),
    /// Nothing usable was heard; ask again.
    Retry,
    /// Too many empty answers; stop asking for this session.
    GaveUp,
}

/// Onboarding dialog policy and retry bookkeeping.
#[derive(Debug, Clone)]
pub struct OnboardingFlow {
    config: OnboardingConfig,
    empty_answers: u32,
}

impl OnboardingFlow {
    pub fn new(config: OnboardingConfig) -> Self {
        Self {
            config,
            empty_answers: 0,
        }
    }

    /// Whether the greeting should be spoken on this activation.
    pub fn should_greet(&self, session: &SessionState) -> bool {
        session.display_name().is_none() && !session.has_greeted()
    }

    /// Greeting and name prompt.
    pub fn greeting(&self) -> &str {
        &self.config.greeting
    }

    /// Re-prompt after an empty answer.
    pub fn reprompt(&self) -> &str {
        &self.config.reprompt
    }

    /// Acknowledgment for a captured name.
    pub fn acknowledgment(&self, name: &str) -> String {
        fill_name(&self.config.acknowledgment, name)
    }

    /// Name used after giving up.
    pub fn fallback_name(&self) -> &str {
        &self.config.fallback_name
    }

    /// Line spoken after giving up.
    pub fn give_up_line(&self) -> String {
        fill_name(&self.config.give_up, &self.config.fallback_name)
    }

    /// Interpret a transcript heard while gathering the name.
    pub fn handle_answer(&mut self, transcript: &str) -> NameAnswer {
        let name = clean_name(transcript);
        if !name.is_empty() {
            self.empty_answers = 0;
            info!("captured display name \"{name}\"");
            return NameAnswer::Captured(name);
        }

        self.empty_answers += 1;
        if self.empty_answers >= self.config.max_name_attempts.max(1) {
            info!(
                "no name after {} attempts, giving up for this session",
                self.empty_answers
            );
            self.empty_answers = 0;
            NameAnswer::GaveUp
        } else {
            NameAnswer::Retry
        }
    }
}

/// Strip punctuation from a spoken name and normalize whitespace.
///
/// Hyphens inside a name survive ("Mary-Jane"). Every other symbol goes,
/// typographic apostrophes and ellipses included ("It’s Sam." becomes "Its Sam").
pub fn clean_name(transcript: &str) -> String {
    let kept: String = transcript
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-')
        .collect();
    kept.split_whitespace()
        .map(|word| word.trim_matches('-'))
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
