//! Fake collaborators shared by the unit test modules.

use crate::error::{AssistantError, Result};
use crate::llm::AiCollaborator;
use crate::platform::{SpeechRecognizer, SpeechSynthesizer, Utterance, UtteranceId, Voice};
use crate::voice_command::{DocumentContext, Screen};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// A call made into a fake platform capability.
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformCall {
    RecognizerStart,
    RecognizerStop,
    SynthSpeak(String),
    SynthCancel,
}

/// Shared record of what the fake platform was asked to do and what it is
/// doing right now.
#[derive(Debug, Default)]
pub struct PlatformLog {
    pub calls: Vec<PlatformCall>,
    pub recognizing: bool,
    pub playing: Option<UtteranceId>,
}

impl PlatformLog {
    pub fn shared() -> Arc<Mutex<Self>> {
        Arc::new(Mutex::new(Self::default()))
    }

    /// Both a recognition session and an utterance are live.
    pub fn both_active(&self) -> bool {
        self.recognizing && self.playing.is_some()
    }

    /// The platform closed its recognition session on its own.
    pub fn end_session(&mut self) {
        self.recognizing = false;
    }
}

#[derive(Clone)]
pub struct FakeRecognizer {
    log: Arc<Mutex<PlatformLog>>,
    available: bool,
}

impl FakeRecognizer {
    pub fn new(log: Arc<Mutex<PlatformLog>>) -> Self {
        Self {
            log,
            available: true,
        }
    }

    pub fn unavailable(log: Arc<Mutex<PlatformLog>>) -> Self {
        Self {
            log,
            available: false,
        }
    }
}

impl SpeechRecognizer for FakeRecognizer {
    fn is_available(&self) -> bool {
        self.available
    }

    fn start(&mut self, _lang: &str) -> Result<()> {
        let mut log = self.log.lock().expect("platform log");
        if log.recognizing {
            return Err(AssistantError::AlreadyActive);
        }
        log.recognizing = true;
        log.calls.push(PlatformCall::RecognizerStart);
        Ok(())
    }

    fn stop(&mut self) {
        let mut log = self.log.lock().expect("platform log");
        log.recognizing = false;
        log.calls.push(PlatformCall::RecognizerStop);
    }
}

#[derive(Clone)]
pub struct FakeSynthesizer {
    log: Arc<Mutex<PlatformLog>>,
    voices: Arc<Mutex<Vec<Voice>>>,
    available: bool,
}

impl FakeSynthesizer {
    pub fn new(log: Arc<Mutex<PlatformLog>>, voices: Vec<Voice>) -> Self {
        Self {
            log,
            voices: Arc::new(Mutex::new(voices)),
            available: true,
        }
    }

    pub fn unavailable(log: Arc<Mutex<PlatformLog>>) -> Self {
        Self {
            log,
            voices: Arc::new(Mutex::new(Vec::new())),
            available: false,
        }
    }

    pub fn log(&self) -> Arc<Mutex<PlatformLog>> {
        Arc::clone(&self.log)
    }

    pub fn set_voices(&self, voices: Vec<Voice>) {
        *self.voices.lock().expect("voices") = voices;
    }

    pub fn spoken_texts(&self) -> Vec<String> {
        self.log
            .lock()
            .expect("platform log")
            .calls
            .iter()
            .filter_map(|c| match c {
                PlatformCall::SynthSpeak(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Simulate natural completion of the playing utterance.
    pub fn finish(&self) -> Option<UtteranceId> {
        self.log.lock().expect("platform log").playing.take()
    }

    pub fn playing(&self) -> Option<UtteranceId> {
        self.log.lock().expect("platform log").playing
    }
}

impl SpeechSynthesizer for FakeSynthesizer {
    fn is_available(&self) -> bool {
        self.available
    }

    fn voices(&self) -> Vec<Voice> {
        self.voices.lock().expect("voices").clone()
    }

    fn speak(&mut self, utterance: &Utterance) -> Result<()> {
        let mut log = self.log.lock().expect("platform log");
        log.calls.push(PlatformCall::SynthSpeak(utterance.text.clone()));
        log.playing = Some(utterance.id);
        Ok(())
    }

    fn cancel(&mut self) {
        let mut log = self.log.lock().expect("platform log");
        log.calls.push(PlatformCall::SynthCancel);
        log.playing = None;
    }
}

/// AI collaborator answering every query with a fixed result.
pub struct ScriptedAi {
    reply: std::result::Result<String, String>,
    pub queries: Mutex<Vec<String>>,
}

impl ScriptedAi {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_owned()),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_owned()),
            queries: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl AiCollaborator for ScriptedAi {
    async fn query(&self, prompt: &str) -> Result<String> {
        self.queries.lock().expect("queries").push(prompt.to_owned());
        self.reply.clone().map_err(AssistantError::Ai)
    }

    async fn summarize(&self, text: &str) -> Result<String> {
        self.queries
            .lock()
            .expect("queries")
            .push(format!("summarize: {text}"));
        self.reply.clone().map_err(AssistantError::Ai)
    }
}

/// Document context with a fixed screen and selection.
pub struct FixedDocuments {
    pub screen: Screen,
    pub text: Option<String>,
}

#[async_trait]
impl DocumentContext for FixedDocuments {
    fn current_screen(&self) -> Screen {
        self.screen
    }

    async fn selected_document_text(&self) -> Result<Option<String>> {
        Ok(self.text.clone())
    }
}

/// Reading view whose selected document cannot be read.
pub struct UnreadableDocument;

#[async_trait]
impl DocumentContext for UnreadableDocument {
    fn current_screen(&self) -> Screen {
        Screen::Reading
    }

    async fn selected_document_text(&self) -> Result<Option<String>> {
        Err(AssistantError::Document("file moved".to_owned()))
    }
}
