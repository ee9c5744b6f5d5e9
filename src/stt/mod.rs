//! Speech input: a thin wrapper over platform speech recognition.
//!
//! Single-shot per activation. The controller tracks whether a session is
//! open so that double activation is refused instead of confusing the
//! platform, and so that results arriving after an explicit stop are
//! dropped rather than routed while the assistant is already speaking.

use crate::error::{AssistantError, Result};
use crate::platform::{Alternative, RecognitionErrorKind, RecognitionEvent, SpeechRecognizer};
use tracing::{debug, info};

/// Identifier of one recognition session.
pub type SessionId = u64;

/// Input events relevant to the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// The final transcript of the session.
    Transcript(String),
    /// The user said nothing. Benign end of session.
    NoSpeech,
    /// The session is over.
    Ended,
    /// The capability failed.
    Failed(RecognitionErrorKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Idle,
    Active(SessionId),
    Stopping(SessionId),
}

/// Speech input controller.
pub struct SpeechInputController {
    recognizer: Box<dyn SpeechRecognizer>,
    language: String,
    state: SessionState,
    next_session: SessionId,
}

impl SpeechInputController {
    pub fn new(recognizer: Box<dyn SpeechRecognizer>, language: impl Into<String>) -> Self {
        Self {
            recognizer,
            language: language.into(),
            state: SessionState::Idle,
            next_session: 1,
        }
    }

    /// Whether the platform has a recognition capability at all.
    pub fn is_available(&self) -> bool {
        self.recognizer.is_available()
    }

    /// The open session accepting results, if any.
    pub fn active_session(&self) -> Option<SessionId> {
        match self.state {
            SessionState::Active(id) => Some(id),
            SessionState::Idle | SessionState::Stopping(_) => None,
        }
    }

    /// Whether the platform still has a session (active or winding down).
    pub fn has_session(&self) -> bool {
        self.state != SessionState::Idle
    }

    /// Open a recognition session.
    ///
    /// # Errors
    ///
    /// - [`AssistantError::Unavailable`] if recognition is not supported.
    /// - [`AssistantError::AlreadyActive`] if a session is still open or
    ///   winding down.
    /// - Any error the platform raises while starting.
    pub fn start(&mut self) -> Result<SessionId> {
        if !self.recognizer.is_available() {
            return Err(AssistantError::Unavailable("speech recognition"));
        }
        if self.has_session() {
            return Err(AssistantError::AlreadyActive);
        }
        self.recognizer.start(&self.language)?;
        let id = self.next_session;
        self.next_session += 1;
        self.state = SessionState::Active(id);
        info!("recognition session {id} started");
        Ok(id)
    }

    /// Ask the open session to finish. No-op without an active session.
    pub fn stop(&mut self) {
        if let SessionState::Active(id) = self.state {
            debug!("stopping recognition session {id}");
            self.state = SessionState::Stopping(id);
            self.recognizer.stop();
        }
    }

    /// Translate a platform recognition event into an [`InputEvent`].
    pub fn handle_event(&mut self, event: RecognitionEvent) -> Option<InputEvent> {
        match event {
            RecognitionEvent::Started => {
                debug!("recognition audio capture started");
                None
            }
            RecognitionEvent::Result { alternatives } => {
                if self.active_session().is_none() {
                    debug!("dropping recognition result outside an active session");
                    return None;
                }
                best_transcript(&alternatives).map(InputEvent::Transcript)
            }
            RecognitionEvent::Error(kind) => {
                if !self.has_session() {
                    debug!("ignoring recognition error without a session: {kind}");
                    return None;
                }
                if kind.is_benign() {
                    Some(InputEvent::NoSpeech)
                } else {
                    Some(InputEvent::Failed(kind))
                }
            }
            RecognitionEvent::Ended => {
                if !self.has_session() {
                    return None;
                }
                self.state = SessionState::Idle;
                Some(InputEvent::Ended)
            }
        }
    }
}

/// Highest-confidence non-empty alternative, trimmed.
fn best_transcript(alternatives: &[Alternative]) -> Option<String> {
    alternatives
        .iter()
        .map(|a| (a.transcript.trim(), a.confidence))
        .filter(|(text, _)| !text.is_empty())
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(text, _)| text.to_owned())
}
