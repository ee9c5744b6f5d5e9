//! Line-oriented console stand-ins for the platform speech capabilities.
//!
//! Each line typed while a recognition session is open is one final result;
//! an empty line is "no speech". Synthesis prints the text and reports
//! completion after a reading-time delay derived from a words-per-minute rate.

use crate::error::{AssistantError, Result};
use crate::platform::{
    Alternative, RecognitionErrorKind, RecognitionEvent, SpeechRecognizer, SpeechSynthesizer,
    SynthesisEvent, Utterance, Voice,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

const MIN_UTTERANCE_MS: u64 = 200;

/// Recognizer half owned by the coordinator.
pub struct ConsoleRecognizer {
    active: Arc<AtomicBool>,
    events: mpsc::UnboundedSender<RecognitionEvent>,
}

/// Input half owned by whoever reads the terminal.
#[derive(Clone)]
pub struct ConsoleMicrophone {
    active: Arc<AtomicBool>,
    events: mpsc::UnboundedSender<RecognitionEvent>,
}

/// Create a console recognizer, its microphone feed, and its event stream.
pub fn console_recognizer() -> (
    ConsoleRecognizer,
    ConsoleMicrophone,
    mpsc::UnboundedReceiver<RecognitionEvent>,
) {
    let (events, rx) = mpsc::unbounded_channel();
    let active = Arc::new(AtomicBool::new(false));
    let recognizer = ConsoleRecognizer {
        active: Arc::clone(&active),
        events: events.clone(),
    };
    (recognizer, ConsoleMicrophone { active, events }, rx)
}

impl ConsoleMicrophone {
    /// Whether a recognition session is waiting for input.
    pub fn is_listening(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Deliver one typed line as the session's final result.
    ///
    /// Returns `false` if no session was open.
    pub fn hear(&self, line: &str) -> bool {
        if !self.active.swap(false, Ordering::AcqRel) {
            return false;
        }
        let text = line.trim();
        let event = if text.is_empty() {
            RecognitionEvent::Error(RecognitionErrorKind::NoSpeech)
        } else {
            RecognitionEvent::Result {
                alternatives: vec![Alternative::new(text, 1.0)],
            }
        };
        let _ = self.events.send(event);
        let _ = self.events.send(RecognitionEvent::Ended);
        true
    }
}

impl SpeechRecognizer for ConsoleRecognizer {
    fn is_available(&self) -> bool {
        true
    }

    fn start(&mut self, _lang: &str) -> Result<()> {
        if self.active.swap(true, Ordering::AcqRel) {
            return Err(AssistantError::AlreadyActive);
        }
        let _ = self.events.send(RecognitionEvent::Started);
        Ok(())
    }

    fn stop(&mut self) {
        if self.active.swap(false, Ordering::AcqRel) {
            let _ = self.events.send(RecognitionEvent::Ended);
        }
    }
}

/// Synthesizer that prints utterances to stdout.
pub struct ConsoleSynthesizer {
    voices: Arc<Mutex<Vec<Voice>>>,
    events: mpsc::UnboundedSender<SynthesisEvent>,
    words_per_minute: u32,
    current: Option<CancellationToken>,
}

impl ConsoleSynthesizer {
    /// Create a synthesizer with an empty voice catalog.
    pub fn new(words_per_minute: u32) -> (Self, mpsc::UnboundedReceiver<SynthesisEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let synth = Self {
            voices: Arc::new(Mutex::new(Vec::new())),
            events,
            words_per_minute: words_per_minute.max(1),
            current: None,
        };
        (synth, rx)
    }

    /// Populate the voice catalog after `delay`, like a platform loading
    /// its voices in the background.
    pub fn publish_catalog_after(&self, delay: Duration) {
        let voices = Arc::clone(&self.voices);
        let events = self.events.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Ok(mut catalog) = voices.lock() {
                catalog.push(Voice::new("Console (US)", "en-US"));
                catalog.push(Voice::new("Console (UK)", "en-GB"));
            }
            let _ = events.send(SynthesisEvent::VoicesChanged);
        });
    }

    fn reading_time(&self, text: &str) -> Duration {
        let words = text.split_whitespace().count() as u64;
        let ms = words * 60_000 / u64::from(self.words_per_minute);
        Duration::from_millis(ms.max(MIN_UTTERANCE_MS))
    }
}

impl SpeechSynthesizer for ConsoleSynthesizer {
    fn is_available(&self) -> bool {
        true
    }

    fn voices(&self) -> Vec<Voice> {
        self.voices
            .lock()
            .map(|catalog| catalog.clone())
            .unwrap_or_default()
    }

    fn speak(&mut self, utterance: &Utterance) -> Result<()> {
        self.cancel();
        println!("assistant> {}", utterance.text);

        let token = CancellationToken::new();
        self.current = Some(token.clone());
        let id = utterance.id;
        let duration = self.reading_time(&utterance.text);
        let events = self.events.clone();
        let _ = events.send(SynthesisEvent::Started(id));
        tokio::spawn(async move {
            tokio::select! {
                () = token.cancelled() => debug!("console utterance {id} cancelled"),
                () = tokio::time::sleep(duration) => {
                    let _ = events.send(SynthesisEvent::Ended(id));
                }
            }
        });
        Ok(())
    }

    fn cancel(&mut self) {
        if let Some(token) = self.current.take() {
            token.cancel();
        }
    }
}
