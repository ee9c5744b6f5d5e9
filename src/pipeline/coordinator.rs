//! Assistant coordinator: owns the status state machine and arbitrates the
//! microphone and the speaker.
//!
//! Everything that can change the assistant's state arrives on one task:
//! commands from [`AssistantHandle`], recognition and synthesis callbacks
//! from the platform, replies from spawned routing work, and the listening
//! timeout. Handlers are synchronous, so every transition is decided against
//! the status as it is *now*, and an asynchronous completion that no longer
//! matches the current turn, utterance or session is dropped.

use crate::config::{AssistantConfig, ReplyConfig, fill_name};
use crate::error::{AssistantError, Result};
use crate::llm::AiCollaborator;
use crate::onboarding::{NameAnswer, OnboardingFlow};
use crate::pipeline::messages::{AfterSpeech, CoordinatorCommand, RouteResult, SpeechOutcome};
use crate::platform::{RecognitionEvent, SpeechPlatform, SynthesisEvent, UtteranceId};
use crate::runtime::RuntimeEvent;
use crate::session::SessionState;
use crate::status::AssistantStatus;
use crate::store::{KeyValueStore, MemoryStore};
use crate::stt::{InputEvent, SessionId, SpeechInputController};
use crate::tts::{OutputEvent, ReadinessGate, SpeechOutputController};
use crate::voice_command::{
    DocumentContext, NoDocuments, Screen, VoiceCommand, parse_voice_command,
};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// An utterance the coordinator is waiting on.
struct PendingSpeech {
    id: UtteranceId,
    text: String,
    after: AfterSpeech,
    reply: Option<oneshot::Sender<SpeechOutcome>>,
}

impl PendingSpeech {
    fn resolve(self, outcome: SpeechOutcome) {
        if let Some(tx) = self.reply {
            let _ = tx.send(outcome);
        }
    }
}

/// Drives the voice assistant.
pub struct AssistantCoordinator {
    config: AssistantConfig,
    input: SpeechInputController,
    output: SpeechOutputController,
    recognition_rx: mpsc::UnboundedReceiver<RecognitionEvent>,
    synthesis_rx: mpsc::UnboundedReceiver<SynthesisEvent>,
    cmd_rx: mpsc::UnboundedReceiver<CoordinatorCommand>,
    route_tx: mpsc::UnboundedSender<RouteResult>,
    route_rx: mpsc::UnboundedReceiver<RouteResult>,
    status_tx: watch::Sender<AssistantStatus>,
    runtime_tx: Option<broadcast::Sender<RuntimeEvent>>,
    cancel: CancellationToken,
    ai: Arc<dyn AiCollaborator>,
    documents: Arc<dyn DocumentContext>,
    session: SessionState,
    onboarding: OnboardingFlow,
    pending: Option<PendingSpeech>,
    /// Incremented on every user intent; routing replies from older turns
    /// are dropped.
    generation: u64,
    listen_deadline: Option<(SessionId, Instant)>,
}

impl AssistantCoordinator {
    /// Create a coordinator over the platform capabilities and an AI
    /// collaborator, plus the handle the UI uses to drive it.
    ///
    /// Display name and greeting flag live in in-memory stores until
    /// [`Self::with_stores`] supplies real ones.
    pub fn new(
        config: AssistantConfig,
        platform: SpeechPlatform,
        ai: Arc<dyn AiCollaborator>,
    ) -> (Self, AssistantHandle) {
        let SpeechPlatform {
            recognizer,
            recognition_events,
            synthesizer,
            synthesis_events,
        } = platform;
        let language = config.voice.language.clone();
        let input = SpeechInputController::new(recognizer, language.clone());
        let output = SpeechOutputController::new(synthesizer, language);

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (route_tx, route_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(AssistantStatus::Idle);
        let cancel = CancellationToken::new();

        let handle = AssistantHandle {
            cmd_tx,
            status_rx,
            cancel: cancel.clone(),
            voice_catalog: output.catalog_readiness(),
        };

        let durable: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let session_store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let coordinator = Self {
            onboarding: OnboardingFlow::new(config.onboarding.clone()),
            config,
            input,
            output,
            recognition_rx: recognition_events,
            synthesis_rx: synthesis_events,
            cmd_rx,
            route_tx,
            route_rx,
            status_tx,
            runtime_tx: None,
            cancel,
            ai,
            documents: Arc::new(NoDocuments),
            session: SessionState::load(durable, session_store),
            pending: None,
            generation: 0,
            listen_deadline: None,
        };
        (coordinator, handle)
    }

    /// Use `durable` for the display name and `session` for the
    /// once-per-session greeting flag.
    pub fn with_stores(
        mut self,
        durable: Arc<dyn KeyValueStore>,
        session: Arc<dyn KeyValueStore>,
    ) -> Self {
        self.session = SessionState::load(durable, session);
        self
    }

    /// Attach the shell's view of the current screen and selected document.
    pub fn with_documents(mut self, documents: Arc<dyn DocumentContext>) -> Self {
        self.documents = documents;
        self
    }

    /// Attach a runtime event broadcaster for the application shell.
    pub fn with_runtime_events(mut self, tx: broadcast::Sender<RuntimeEvent>) -> Self {
        self.runtime_tx = Some(tx);
        self
    }

    /// Run until [`AssistantHandle::shutdown`] or until every handle is
    /// dropped.
    ///
    /// # Errors
    ///
    /// Currently infallible; capability failures put the assistant into
    /// [`AssistantStatus::Error`] instead of ending the task.
    pub async fn run(mut self) -> Result<()> {
        info!(
            "voice assistant started (language {})",
            self.config.voice.language
        );
        self.begin_onboarding_if_needed();

        loop {
            let deadline = self.listen_deadline.map(|(_, at)| at);
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd),
                    None => {
                        info!("all assistant handles dropped");
                        break;
                    }
                },
                Some(event) = self.recognition_rx.recv() => self.handle_recognition_event(event),
                Some(event) = self.synthesis_rx.recv() => self.handle_synthesis_event(event),
                Some(result) = self.route_rx.recv() => self.handle_route_result(result),
                () = sleep_until_deadline(deadline) => self.on_listen_timeout(),
            }
        }

        self.input.stop();
        self.output.cancel();
        self.resolve_pending(SpeechOutcome::Cancelled);
        info!("voice assistant stopped");
        Ok(())
    }

    fn status(&self) -> AssistantStatus {
        *self.status_tx.borrow()
    }

    fn handle_command(&mut self, cmd: CoordinatorCommand) {
        match cmd {
            CoordinatorCommand::Speak { text, reply } => {
                self.speak(&text, AfterSpeech::Nothing, reply);
            }
            CoordinatorCommand::StartListening => self.start_listening(),
            CoordinatorCommand::StopListening => self.stop_listening(),
            CoordinatorCommand::StopSpeaking => self.stop_speaking(),
        }
    }

    // ---- operations ----

    /// Greet a user without a display name, once per session. Name capture
    /// starts when the greeting finishes.
    fn begin_onboarding_if_needed(&mut self) {
        if !self.onboarding.should_greet(&self.session) {
            return;
        }
        if let Err(e) = self.session.mark_greeted() {
            warn!("failed to record onboarding greeting: {e}");
        }
        info!("no display name stored, starting onboarding");
        let greeting = self.onboarding.greeting().to_owned();
        self.speak(&greeting, AfterSpeech::BeginNameCapture, None);
    }

    /// Speak `text`, superseding whatever was speaking or waiting to speak.
    ///
    /// Returns `false` when nothing was attempted: empty text, no synthesis
    /// capability, or the assistant is in `error`.
    fn speak(
        &mut self,
        text: &str,
        after: AfterSpeech,
        reply: Option<oneshot::Sender<SpeechOutcome>>,
    ) -> bool {
        if text.trim().is_empty() || !self.output.is_available() || self.status().is_terminal() {
            debug!("nothing to speak");
            if let Some(tx) = reply {
                let _ = tx.send(SpeechOutcome::Skipped);
            }
            return false;
        }

        self.clear_listen_deadline();
        self.input.stop();
        self.resolve_pending(SpeechOutcome::Superseded);

        match self.output.speak(text) {
            Ok(spoken) => {
                self.pending = Some(PendingSpeech {
                    id: spoken.id,
                    text: text.to_owned(),
                    after,
                    reply,
                });
                if spoken.issued {
                    self.on_speech_issued();
                }
                true
            }
            Err(e) => {
                if let Some(tx) = reply {
                    let _ = tx.send(SpeechOutcome::Failed);
                }
                self.fail(e);
                true
            }
        }
    }

    fn start_listening(&mut self) {
        let status = self.status();
        if status.is_terminal() {
            debug!("start listening ignored: assistant needs a restart");
            return;
        }
        if status == AssistantStatus::Listening {
            debug!("already listening");
            return;
        }

        self.generation += 1;
        self.output.cancel();
        self.resolve_pending(SpeechOutcome::Cancelled);

        match self.input.start() {
            Ok(session) => {
                self.set_status(AssistantStatus::Listening);
                self.arm_listen_timeout(session);
            }
            Err(AssistantError::AlreadyActive) => {
                warn!("recognition session still winding down, not starting another");
                self.set_status(AssistantStatus::Idle);
            }
            Err(e) => self.fail(e),
        }
    }

    /// Ask the open session to end. The platform's end event moves the
    /// status back to `idle`.
    fn stop_listening(&mut self) {
        if self.status() != AssistantStatus::Listening {
            return;
        }
        self.clear_listen_deadline();
        self.input.stop();
    }

    fn stop_speaking(&mut self) {
        self.output.cancel();
        self.resolve_pending(SpeechOutcome::Cancelled);
        if self.status() == AssistantStatus::Speaking {
            self.set_status(AssistantStatus::Idle);
        }
    }

    // ---- recognition ----

    fn handle_recognition_event(&mut self, event: RecognitionEvent) {
        let Some(event) = self.input.handle_event(event) else {
            return;
        };
        match event {
            InputEvent::Transcript(text) => self.on_transcript(&text),
            InputEvent::NoSpeech | InputEvent::Ended => self.on_input_ended(),
            InputEvent::Failed(kind) => self.fail(AssistantError::Recognition(kind.to_string())),
        }
    }

    fn on_input_ended(&mut self) {
        self.clear_listen_deadline();
        let status = self.status();
        if status == AssistantStatus::Listening {
            self.set_status(AssistantStatus::Idle);
        } else {
            debug!("recognition ended while {status}, keeping status");
        }
    }

    fn on_transcript(&mut self, text: &str) {
        self.clear_listen_deadline();
        let status = self.status();
        if status != AssistantStatus::Listening {
            debug!("dropping transcript received while {status}");
            return;
        }
        info!("heard: \"{text}\"");
        self.emit(RuntimeEvent::Transcript {
            text: text.to_owned(),
        });

        if self.session.is_gathering_name() {
            self.handle_name_answer(text);
            return;
        }

        self.generation += 1;
        self.set_status(AssistantStatus::Thinking);
        self.route(parse_voice_command(text));
    }

    fn handle_name_answer(&mut self, text: &str) {
        match self.onboarding.handle_answer(text) {
            NameAnswer::Captured(name) => {
                if let Err(e) = self.session.capture_name(&name) {
                    warn!("failed to persist display name: {e}");
                }
                self.emit(RuntimeEvent::DisplayNameCaptured { name: name.clone() });
                let line = self.onboarding.acknowledgment(&name);
                self.speak(&line, AfterSpeech::Nothing, None);
            }
            NameAnswer::Retry => {
                let line = self.onboarding.reprompt().to_owned();
                self.speak(&line, AfterSpeech::ListenAgain, None);
            }
            NameAnswer::GaveUp => {
                let alias = self.onboarding.fallback_name().to_owned();
                self.session.abandon_gathering(&alias);
                let line = self.onboarding.give_up_line();
                self.speak(&line, AfterSpeech::Nothing, None);
            }
        }
    }

    // ---- routing ----

    fn route(&mut self, command: VoiceCommand) {
        debug!("routing {command:?}");
        match command {
            VoiceCommand::Navigate(screen) => {
                info!("navigating to {screen}");
                self.emit(RuntimeEvent::Navigate(screen));
                self.answer(screen.confirmation());
            }
            VoiceCommand::StopListening => {
                self.input.stop();
                self.set_status(AssistantStatus::Idle);
            }
            VoiceCommand::StopSpeaking => {
                self.stop_speaking();
                self.set_status(AssistantStatus::Idle);
            }
            VoiceCommand::Greet => {
                let replies = &self.config.replies;
                let line = fill_name(
                    &replies.greeting,
                    self.session.addressed_as(&replies.anonymous_name),
                );
                self.answer(&line);
            }
            VoiceCommand::SummarizeDocument => self.spawn_summary(),
            VoiceCommand::Ask(question) => self.spawn_query(question),
        }
    }

    /// Speak a routed reply; fall back to `idle` if nothing can be spoken.
    fn answer(&mut self, text: &str) {
        if !self.speak(text, AfterSpeech::Nothing, None) {
            self.set_status(AssistantStatus::Idle);
        }
    }

    fn spawn_query(&self, question: String) {
        let ai = Arc::clone(&self.ai);
        let tx = self.route_tx.clone();
        let generation = self.generation;
        let apology = self.config.replies.ai_failure.clone();
        tokio::spawn(async move {
            let reply = match ai.query(&question).await {
                Ok(reply) => reply,
                Err(e) => {
                    warn!("AI query failed: {e}");
                    apology
                }
            };
            let _ = tx.send(RouteResult { generation, reply });
        });
    }

    fn spawn_summary(&self) {
        let ai = Arc::clone(&self.ai);
        let documents = Arc::clone(&self.documents);
        let tx = self.route_tx.clone();
        let generation = self.generation;
        let replies = self.config.replies.clone();
        tokio::spawn(async move {
            let reply = summarize_selected(documents.as_ref(), ai.as_ref(), &replies).await;
            let _ = tx.send(RouteResult { generation, reply });
        });
    }

    fn handle_route_result(&mut self, result: RouteResult) {
        let status = self.status();
        if result.generation != self.generation || status != AssistantStatus::Thinking {
            debug!(
                "dropping reply from turn {} (current turn {}, {status})",
                result.generation, self.generation
            );
            return;
        }
        if result.reply.trim().is_empty() {
            self.set_status(AssistantStatus::Idle);
            return;
        }
        self.answer(&result.reply);
    }

    // ---- synthesis ----

    fn handle_synthesis_event(&mut self, event: SynthesisEvent) {
        let Some(event) = self.output.handle_event(event) else {
            return;
        };
        match event {
            OutputEvent::Issued(id) => {
                if self.pending.as_ref().is_some_and(|p| p.id == id) {
                    self.on_speech_issued();
                }
            }
            OutputEvent::Started(id) => debug!("utterance {id} playing"),
            OutputEvent::Finished(id) => self.on_speech_finished(id),
            OutputEvent::Failed { id, message } => {
                debug!("utterance {id} failed");
                self.fail(AssistantError::Synthesis(message));
            }
        }
    }

    fn on_speech_issued(&mut self) {
        let Some(text) = self.pending.as_ref().map(|p| p.text.clone()) else {
            return;
        };
        self.set_status(AssistantStatus::Speaking);
        self.emit(RuntimeEvent::AssistantSpoke { text });
    }

    fn on_speech_finished(&mut self, id: UtteranceId) {
        let Some(pending) = self.pending.take_if(|p| p.id == id) else {
            debug!("utterance {id} finished but is no longer pending");
            return;
        };
        let after = pending.after;
        if self.status() == AssistantStatus::Speaking {
            self.set_status(AssistantStatus::Idle);
        }
        pending.resolve(SpeechOutcome::Completed);

        match after {
            AfterSpeech::Nothing => {}
            AfterSpeech::BeginNameCapture => {
                if self.session.begin_gathering() {
                    self.start_listening();
                }
            }
            AfterSpeech::ListenAgain => {
                if self.session.is_gathering_name() {
                    self.start_listening();
                }
            }
        }
    }

    fn resolve_pending(&mut self, outcome: SpeechOutcome) {
        if let Some(pending) = self.pending.take() {
            pending.resolve(outcome);
        }
    }

    // ---- listening timeout ----

    fn arm_listen_timeout(&mut self, session: SessionId) {
        self.listen_deadline = self
            .config
            .listening
            .timeout()
            .map(|timeout| (session, Instant::now() + timeout));
    }

    fn clear_listen_deadline(&mut self) {
        self.listen_deadline = None;
    }

    fn on_listen_timeout(&mut self) {
        let Some((session, _)) = self.listen_deadline.take() else {
            return;
        };
        if self.status() == AssistantStatus::Listening
            && self.input.active_session() == Some(session)
        {
            info!("listening timed out");
            self.stop_listening();
        }
    }

    // ---- status ----

    /// Enter the terminal `error` state. Reported once.
    fn fail(&mut self, err: AssistantError) {
        if self.status().is_terminal() {
            debug!("already in error, ignoring: {err}");
            return;
        }
        error!("speech capability failed: {err}");
        self.clear_listen_deadline();
        self.input.stop();
        self.output.cancel();
        self.resolve_pending(SpeechOutcome::Failed);
        self.set_status(AssistantStatus::Error);
        self.emit(RuntimeEvent::CapabilityFailed {
            message: err.to_string(),
        });
    }

    fn set_status(&self, next: AssistantStatus) {
        let current = self.status();
        if current == next {
            return;
        }
        if current.is_terminal() {
            warn!("ignoring transition {current} -> {next}: error is terminal");
            return;
        }
        info!("assistant status: {current} -> {next}");
        self.status_tx.send_replace(next);
        self.emit(RuntimeEvent::StatusChanged(next));
    }

    fn emit(&self, event: RuntimeEvent) {
        if let Some(tx) = &self.runtime_tx {
            let _ = tx.send(event);
        }
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

/// Summarize the document selected in the reading view, or explain why not.
async fn summarize_selected(
    documents: &dyn DocumentContext,
    ai: &dyn AiCollaborator,
    replies: &ReplyConfig,
) -> String {
    if documents.current_screen() != Screen::Reading {
        return replies.summary_needs_document.clone();
    }
    let text = match documents.selected_document_text().await {
        Ok(Some(text)) if !text.trim().is_empty() => text,
        Ok(_) => return replies.summary_needs_document.clone(),
        Err(e) => {
            warn!("failed to read selected document: {e}");
            return replies.summary_failure.clone();
        }
    };
    match ai.summarize(&text).await {
        Ok(summary) => format!("{}{}", replies.summary_prefix, summary.trim()),
        Err(e) => {
            warn!("document summary failed: {e}");
            replies.summary_failure.clone()
        }
    }
}

/// Cloneable control surface for the coordinator task.
#[derive(Clone)]
pub struct AssistantHandle {
    cmd_tx: mpsc::UnboundedSender<CoordinatorCommand>,
    status_rx: watch::Receiver<AssistantStatus>,
    cancel: CancellationToken,
    voice_catalog: ReadinessGate,
}

impl AssistantHandle {
    /// Speak `text`. The receiver resolves once the utterance completes, is
    /// cancelled or superseded, fails, or is skipped.
    pub fn speak(&self, text: impl Into<String>) -> oneshot::Receiver<SpeechOutcome> {
        let (tx, rx) = oneshot::channel();
        self.send(CoordinatorCommand::Speak {
            text: text.into(),
            reply: Some(tx),
        });
        rx
    }

    pub fn start_listening(&self) {
        self.send(CoordinatorCommand::StartListening);
    }

    pub fn stop_listening(&self) {
        self.send(CoordinatorCommand::StopListening);
    }

    pub fn stop_speaking(&self) {
        self.send(CoordinatorCommand::StopSpeaking);
    }

    /// Current status.
    pub fn status(&self) -> AssistantStatus {
        *self.status_rx.borrow()
    }

    /// A receiver that observes every status change.
    pub fn watch_status(&self) -> watch::Receiver<AssistantStatus> {
        self.status_rx.clone()
    }

    /// Wait until the status equals `target`.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::Channel`] if the coordinator stops first.
    pub async fn wait_for_status(&self, target: AssistantStatus) -> Result<()> {
        let mut rx = self.status_rx.clone();
        rx.wait_for(|status| *status == target)
            .await
            .map(|_| ())
            .map_err(|_| AssistantError::Channel("assistant coordinator stopped".to_owned()))
    }

    /// Readiness of the synthesis voice catalog.
    pub fn voice_catalog(&self) -> ReadinessGate {
        self.voice_catalog.clone()
    }

    /// Stop the coordinator task.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    fn send(&self, cmd: CoordinatorCommand) {
        if self.cmd_tx.send(cmd).is_err() {
            debug!("assistant coordinator is gone, dropping command");
        }
    }
}
