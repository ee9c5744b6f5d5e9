//! Voice command detection for recognized transcripts.
//!
//! Maps a transcript to a [`VoiceCommand`] before anything reaches the AI.
//! Keyword sets are checked in a fixed priority order and the first match
//! wins; anything unmatched becomes a free-form question.
//!
//! # Supported Commands
//!
//! | Phrase Pattern | Command |
//! |----------------|---------|
//! | "open my notes", "show notes", ... | `Navigate(Notes)` |
//! | "open reading", "show reading" | `Navigate(Reading)` |
//! | "open my tasks", "show my tasks", ... | `Navigate(Tasks)` |
//! | "show my progress", "open progress" | `Navigate(Progress)` |
//! | "start quiz", "open quiz" | `Navigate(Quiz)` |
//! | "open code", "show code" | `Navigate(Code)` |
//! | "summarize this document" | `SummarizeDocument` |
//! | "stop listening", "be quiet" | `StopListening` |
//! | "stop speaking" | `StopSpeaking` |
//! | "hello", "hi" | `Greet` |
//! | anything else | `Ask` |

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Application screens reachable by voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    Notes,
    Reading,
    Tasks,
    Progress,
    Quiz,
    Code,
}

impl Screen {
    /// Spoken confirmation after navigating here.
    pub fn confirmation(self) -> &'static str {
        match self {
            Self::Notes => "Opening your notes.",
            Self::Reading => "Opening the reading view.",
            Self::Tasks => "Here are your tasks.",
            Self::Progress => "Here is your progress report.",
            Self::Quiz => "Opening the quiz section.",
            Self::Code => "Opening the code editor.",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Notes => "notes",
            Self::Reading => "reading",
            Self::Tasks => "tasks",
            Self::Progress => "progress",
            Self::Quiz => "quiz",
            Self::Code => "code",
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A voice command detected from user speech.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceCommand {
    /// Switch the application to a screen.
    Navigate(Screen),
    /// Summarize the document selected in the reading view.
    SummarizeDocument,
    /// End the current listening session.
    StopListening,
    /// Silence the assistant.
    StopSpeaking,
    /// Say hello back.
    Greet,
    /// Anything else: ask the AI collaborator.
    Ask(String),
}

const NAVIGATION: &[(&[&str], Screen)] = &[
    (
        &["open my notes", "show my notes", "open notes", "show notes"],
        Screen::Notes,
    ),
    (&["open reading", "show reading"], Screen::Reading),
    (
        &["open my tasks", "show my tasks", "open tasks", "show tasks"],
        Screen::Tasks,
    ),
    (&["show my progress", "open progress"], Screen::Progress),
    (&["start quiz", "open quiz"], Screen::Quiz),
    (&["open code", "show code"], Screen::Code),
];

const SUMMARIZE: &[&str] = &["summarize this document"];
const STOP_LISTENING: &[&str] = &["stop listening", "be quiet"];
const STOP_SPEAKING: &[&str] = &["stop speaking"];
const GREETING: &[&str] = &["hello", "hi"];

/// Lower-case and trim a transcript for matching.
pub fn normalize(transcript: &str) -> String {
    transcript.trim().to_lowercase()
}

/// Detect the command in a transcript.
///
/// The question carried by [`VoiceCommand::Ask`] is the trimmed transcript
/// with its original casing, so the AI sees what the user said.
pub fn parse_voice_command(transcript: &str) -> VoiceCommand {
    let command = normalize(transcript);
    let words: Vec<&str> = command
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|w| !w.is_empty())
        .collect();

    if let Some((_, screen)) = NAVIGATION
        .iter()
        .find(|(keywords, _)| matches_any(&command, &words, keywords))
    {
        return VoiceCommand::Navigate(*screen);
    }
    if matches_any(&command, &words, SUMMARIZE) {
        return VoiceCommand::SummarizeDocument;
    }
    if matches_any(&command, &words, STOP_LISTENING) {
        return VoiceCommand::StopListening;
    }
    if matches_any(&command, &words, STOP_SPEAKING) {
        return VoiceCommand::StopSpeaking;
    }
    if matches_any(&command, &words, GREETING) {
        return VoiceCommand::Greet;
    }
    VoiceCommand::Ask(transcript.trim().to_owned())
}

/// Multi-word keywords match as substrings; single words must match a whole
/// word so "this" never counts as "hi".
fn matches_any(command: &str, words: &[&str], keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| {
        if keyword.contains(' ') {
            command.contains(keyword)
        } else {
            words.contains(keyword)
        }
    })
}

/// What the application shell is showing, for document actions.
#[async_trait]
pub trait DocumentContext: Send + Sync {
    /// The screen currently displayed.
    fn current_screen(&self) -> Screen;

    /// Text of the document selected in the reading view, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the document exists but cannot be read.
    async fn selected_document_text(&self) -> Result<Option<String>>;
}

/// Context for shells without documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDocuments;

#[async_trait]
impl DocumentContext for NoDocuments {
    fn current_screen(&self) -> Screen {
        Screen::Notes
    }

    async fn selected_document_text(&self) -> Result<Option<String>> {
        Ok(None)
    }
}
