//! Message types passed to and from the coordinator task.

use tokio::sync::oneshot;

/// What the coordinator does once an utterance finishes naturally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AfterSpeech {
    /// Stay idle.
    #[default]
    Nothing,
    /// Onboarding greeting done: start gathering the name and listen.
    BeginNameCapture,
    /// Re-prompt done: listen for the name again.
    ListenAgain,
}

/// How a `speak` request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechOutcome {
    /// Played to the end.
    Completed,
    /// Stopped by `stop_speaking` or by starting to listen.
    Cancelled,
    /// Replaced by a later `speak`.
    Superseded,
    /// Synthesis failed; the assistant is now in `error`.
    Failed,
    /// Nothing was spoken (empty text, no synthesis, or `error`).
    Skipped,
}

/// Commands sent from an [`super::coordinator::AssistantHandle`].
#[derive(Debug)]
pub enum CoordinatorCommand {
    /// Speak a line, optionally reporting how it ended.
    Speak {
        text: String,
        reply: Option<oneshot::Sender<SpeechOutcome>>,
    },
    StartListening,
    StopListening,
    StopSpeaking,
}

/// Reply produced by a spawned routing task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteResult {
    /// Turn generation the request was made in.
    pub generation: u64,
    /// Text to speak. Empty means "nothing to say".
    pub reply: String,
}
