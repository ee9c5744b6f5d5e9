//! Speech output: a race-safe wrapper over platform speech synthesis.
//!
//! At most one utterance is current. Speaking before the voice catalog is
//! populated defers the request until the catalog arrives; a later `speak` or
//! `cancel` supersedes whatever was deferred. Synthesis events that refer to
//! anything but the current utterance are dropped, so a cancelled utterance
//! can never complete or fail the one that replaced it.

mod readiness;

pub use readiness::ReadinessGate;

use crate::error::{AssistantError, Result};
use crate::platform::{SpeechSynthesizer, SynthesisEvent, Utterance, UtteranceId, Voice};
use tracing::{debug, info};

/// What happened to a `speak` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spoken {
    /// Id assigned to the utterance.
    pub id: UtteranceId,
    /// `true` if handed to the platform now, `false` if waiting for voices.
    pub issued: bool,
}

/// Output events relevant to the coordinator, already filtered to the
/// current utterance.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputEvent {
    /// A deferred utterance was handed to the platform.
    Issued(UtteranceId),
    /// Playback began.
    Started(UtteranceId),
    /// Playback finished naturally.
    Finished(UtteranceId),
    /// Playback (or issuing) failed.
    Failed {
        /// The failed utterance.
        id: UtteranceId,
        /// Platform error description.
        message: String,
    },
}

/// Speech output controller.
pub struct SpeechOutputController {
    synth: Box<dyn SpeechSynthesizer>,
    language: String,
    catalog: ReadinessGate,
    deferred: Option<Utterance>,
    current: Option<UtteranceId>,
}

impl SpeechOutputController {
    /// Wrap a synthesizer. If its catalog is already populated the
    /// readiness gate opens immediately.
    pub fn new(synth: Box<dyn SpeechSynthesizer>, language: impl Into<String>) -> Self {
        let catalog = ReadinessGate::new();
        if !synth.voices().is_empty() {
            catalog.mark_ready();
        }
        Self {
            synth,
            language: language.into(),
            catalog,
            deferred: None,
            current: None,
        }
    }

    /// Whether the platform has a synthesis capability at all.
    pub fn is_available(&self) -> bool {
        self.synth.is_available()
    }

    /// Shared voice-catalog readiness gate.
    pub fn catalog_readiness(&self) -> ReadinessGate {
        self.catalog.clone()
    }

    /// Whether an utterance is playing on the platform.
    pub fn is_speaking(&self) -> bool {
        self.current.is_some()
    }

    /// Whether an utterance is waiting for the voice catalog.
    pub fn has_deferred(&self) -> bool {
        self.deferred.is_some()
    }

    /// Speak `text`, superseding anything current or deferred.
    ///
    /// # Errors
    ///
    /// Returns a synthesis error if the platform rejects the utterance.
    pub fn speak(&mut self, text: &str) -> Result<Spoken> {
        self.cancel();
        let utterance = Utterance {
            id: uuid::Uuid::new_v4(),
            text: text.to_owned(),
            lang: self.language.clone(),
            voice: None,
        };
        let id = utterance.id;

        if self.catalog.is_ready() {
            self.issue(utterance)?;
            Ok(Spoken { id, issued: true })
        } else {
            debug!("voice catalog not ready, deferring utterance {id}");
            self.deferred = Some(utterance);
            Ok(Spoken { id, issued: false })
        }
    }

    /// Cancel current and deferred speech. Idempotent.
    pub fn cancel(&mut self) {
        if let Some(dropped) = self.deferred.take() {
            debug!("dropping deferred utterance {}", dropped.id);
        }
        self.current = None;
        self.synth.cancel();
    }

    /// Translate a platform synthesis event into an [`OutputEvent`].
    ///
    /// Returns `None` for events about stale utterances and for catalog
    /// changes that do not release a deferred utterance.
    pub fn handle_event(&mut self, event: SynthesisEvent) -> Option<OutputEvent> {
        match event {
            SynthesisEvent::VoicesChanged => self.on_voices_changed(),
            SynthesisEvent::Started(id) => self.is_current(id).then_some(OutputEvent::Started(id)),
            SynthesisEvent::Ended(id) => {
                if !self.is_current(id) {
                    debug!("ignoring end of stale utterance {id}");
                    return None;
                }
                self.current = None;
                Some(OutputEvent::Finished(id))
            }
            SynthesisEvent::Error { id, message } => {
                if !self.is_current(id) {
                    debug!("ignoring error from stale utterance {id}: {message}");
                    return None;
                }
                self.current = None;
                Some(OutputEvent::Failed { id, message })
            }
        }
    }

    fn on_voices_changed(&mut self) -> Option<OutputEvent> {
        if self.synth.voices().is_empty() {
            return None;
        }
        if self.catalog.mark_ready() {
            info!("voice catalog ready");
        }
        let utterance = self.deferred.take()?;
        let id = utterance.id;
        match self.issue(utterance) {
            Ok(()) => Some(OutputEvent::Issued(id)),
            Err(e) => Some(OutputEvent::Failed {
                id,
                message: e.to_string(),
            }),
        }
    }

    fn issue(&mut self, mut utterance: Utterance) -> Result<()> {
        utterance.voice = select_voice(&self.synth.voices(), &self.language);
        self.synth
            .speak(&utterance)
            .map_err(|e| AssistantError::Synthesis(e.to_string()))?;
        self.current = Some(utterance.id);
        Ok(())
    }

    fn is_current(&self, id: UtteranceId) -> bool {
        self.current == Some(id)
    }
}

/// Pick the catalog voice for `language`: exact tag first, then same primary
/// language subtag, else the platform default.
pub fn select_voice(voices: &[Voice], language: &str) -> Option<Voice> {
    let wanted = normalize_tag(language);
    let primary = wanted.split('-').next().unwrap_or_default().to_owned();

    voices
        .iter()
        .find(|v| normalize_tag(&v.lang) == wanted)
        .or_else(|| {
            voices
                .iter()
                .find(|v| normalize_tag(&v.lang).split('-').next() == Some(primary.as_str()))
        })
        .cloned()
}

fn normalize_tag(tag: &str) -> String {
    tag.trim().replace('_', "-").to_ascii_lowercase()
}
