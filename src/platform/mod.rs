//! Platform speech capabilities consumed by the assistant.
//!
//! The recognizer and synthesizer are thin command surfaces: everything they
//! report back (results, errors, end of session, playback progress, voice
//! catalog changes) arrives as events on an unbounded channel handed to them
//! at construction. The coordinator owns the receiving ends, so every
//! callback is handled on its single task.

pub mod console;

use crate::error::Result;
use std::fmt;
use tokio::sync::mpsc;

/// Identifier of one synthesized utterance.
pub type UtteranceId = uuid::Uuid;

/// A synthesis voice exposed by the platform catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    /// Human-readable voice name.
    pub name: String,
    /// BCP-47 language tag (e.g. `en-US`).
    pub lang: String,
}

impl Voice {
    /// Convenience constructor.
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
        }
    }
}

/// One unit of synthesized speech.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    /// Unique id echoed back in synthesis events.
    pub id: UtteranceId,
    /// Text to speak.
    pub text: String,
    /// Language tag for pronunciation.
    pub lang: String,
    /// Voice chosen from the catalog (`None` = platform default).
    pub voice: Option<Voice>,
}

/// One recognition hypothesis.
#[derive(Debug, Clone, PartialEq)]
pub struct Alternative {
    /// Recognized text.
    pub transcript: String,
    /// Confidence in `[0, 1]`.
    pub confidence: f32,
}

impl Alternative {
    /// Convenience constructor.
    pub fn new(transcript: impl Into<String>, confidence: f32) -> Self {
        Self {
            transcript: transcript.into(),
            confidence,
        }
    }
}

/// Why a recognition session failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognitionErrorKind {
    /// The user said nothing. Benign.
    NoSpeech,
    /// Microphone capture failed.
    AudioCapture,
    /// The user denied microphone access.
    NotAllowed,
    /// The recognition service refused the request.
    ServiceNotAllowed,
    /// Network-backed recognition failed.
    Network,
    /// The requested language is not supported.
    LanguageNotSupported,
    /// Anything else the platform reports.
    Other,
}

impl RecognitionErrorKind {
    /// Whether this error just means "nothing was heard".
    #[must_use]
    pub fn is_benign(self) -> bool {
        self == Self::NoSpeech
    }

    /// Map a platform error code (`no-speech`, `not-allowed`, ...) to a kind.
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "no-speech" => Self::NoSpeech,
            "audio-capture" => Self::AudioCapture,
            "not-allowed" => Self::NotAllowed,
            "service-not-allowed" => Self::ServiceNotAllowed,
            "network" => Self::Network,
            "language-not-supported" => Self::LanguageNotSupported,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for RecognitionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NoSpeech => "no speech detected",
            Self::AudioCapture => "audio capture failed",
            Self::NotAllowed => "microphone permission denied",
            Self::ServiceNotAllowed => "recognition service not allowed",
            Self::Network => "recognition network failure",
            Self::LanguageNotSupported => "language not supported",
            Self::Other => "recognition failed",
        })
    }
}

/// Events emitted by a speech recognizer.
#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionEvent {
    /// Audio capture started.
    Started,
    /// Final result with its alternatives.
    Result {
        /// Hypotheses, in platform order.
        alternatives: Vec<Alternative>,
    },
    /// The session failed.
    Error(RecognitionErrorKind),
    /// The session is over. Always the last event of a session.
    Ended,
}

/// Events emitted by a speech synthesizer.
#[derive(Debug, Clone, PartialEq)]
pub enum SynthesisEvent {
    /// Playback of an utterance began.
    Started(UtteranceId),
    /// Playback of an utterance finished naturally.
    Ended(UtteranceId),
    /// Playback of an utterance failed.
    Error {
        /// The failed utterance.
        id: UtteranceId,
        /// Platform error description.
        message: String,
    },
    /// The voice catalog changed (typically: became populated).
    VoicesChanged,
}

/// Platform speech recognition. Single session per process.
pub trait SpeechRecognizer: Send {
    /// Whether the capability exists on this platform.
    fn is_available(&self) -> bool;

    /// Begin a single-shot recognition session.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::AssistantError::AlreadyActive`] if the platform
    /// still has a session running, or a recognition error if it cannot start.
    fn start(&mut self, lang: &str) -> Result<()>;

    /// Ask the running session to finish. The platform reports `Ended` later.
    fn stop(&mut self);
}

/// Platform speech synthesis.
pub trait SpeechSynthesizer: Send {
    /// Whether the capability exists on this platform.
    fn is_available(&self) -> bool;

    /// Snapshot of the voice catalog (empty until the platform populates it).
    fn voices(&self) -> Vec<Voice>;

    /// Start playing an utterance.
    ///
    /// # Errors
    ///
    /// Returns a synthesis error if the platform rejects the request.
    fn speak(&mut self, utterance: &Utterance) -> Result<()>;

    /// Cancel current and queued playback. Idempotent.
    fn cancel(&mut self);
}

/// The speech capabilities plus the receiving ends of their event streams.
pub struct SpeechPlatform {
    /// Speech recognition capability.
    pub recognizer: Box<dyn SpeechRecognizer>,
    /// Events produced by `recognizer`.
    pub recognition_events: mpsc::UnboundedReceiver<RecognitionEvent>,
    /// Speech synthesis capability.
    pub synthesizer: Box<dyn SpeechSynthesizer>,
    /// Events produced by `synthesizer`.
    pub synthesis_events: mpsc::UnboundedReceiver<SynthesisEvent>,
}
