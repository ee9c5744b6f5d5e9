//! Shared helpers for integration tests.

use async_trait::async_trait;
use mindpod_voice::config::AssistantConfig;
use mindpod_voice::llm::AiCollaborator;
use mindpod_voice::platform::SpeechPlatform;
use mindpod_voice::platform::console::{ConsoleMicrophone, ConsoleSynthesizer, console_recognizer};
use mindpod_voice::session::USER_NAME_KEY;
use mindpod_voice::store::{KeyValueStore, MemoryStore};
use mindpod_voice::{
    AssistantCoordinator, AssistantError, AssistantHandle, AssistantStatus, RuntimeEvent,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// How long a helper waits for the assistant before failing the test.
pub(crate) const WAIT: Duration = Duration::from_secs(10);

/// Default configuration with speech fast enough for real-time tests.
pub(crate) fn fast_config() -> AssistantConfig {
    let mut config = AssistantConfig::default();
    config.voice.words_per_minute = 6_000;
    config
}

/// AI collaborator with a canned answer that records its prompts.
pub(crate) struct CannedAi {
    answer: Option<String>,
    pub(crate) prompts: Mutex<Vec<String>>,
}

impl CannedAi {
    pub(crate) fn answering(answer: &str) -> Arc<Self> {
        Arc::new(Self {
            answer: Some(answer.to_owned()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn broken() -> Arc<Self> {
        Arc::new(Self {
            answer: None,
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn reply(&self, prompt: String) -> mindpod_voice::Result<String> {
        self.prompts.lock().expect("prompts").push(prompt);
        self.answer
            .clone()
            .ok_or_else(|| AssistantError::Ai("model unavailable".to_owned()))
    }
}

#[async_trait]
impl AiCollaborator for CannedAi {
    async fn query(&self, prompt: &str) -> mindpod_voice::Result<String> {
        self.reply(prompt.to_owned())
    }

    async fn summarize(&self, text: &str) -> mindpod_voice::Result<String> {
        self.reply(text.to_owned())
    }
}

/// A running assistant on the console platform.
pub(crate) struct Assistant {
    pub(crate) handle: AssistantHandle,
    pub(crate) mic: ConsoleMicrophone,
    pub(crate) events: broadcast::Receiver<RuntimeEvent>,
    task: JoinHandle<mindpod_voice::Result<()>>,
}

/// Durable store that already holds a display name.
pub(crate) fn named_store(name: &str) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.set(USER_NAME_KEY, name).expect("seed display name");
    store
}

/// Spawn an assistant over the console platform.
pub(crate) fn start_assistant(
    config: AssistantConfig,
    durable: Arc<dyn KeyValueStore>,
    session: Arc<dyn KeyValueStore>,
    ai: Arc<dyn AiCollaborator>,
) -> Assistant {
    let (recognizer, mic, recognition_events) = console_recognizer();
    let (synthesizer, synthesis_events) = ConsoleSynthesizer::new(config.voice.words_per_minute);
    synthesizer.publish_catalog_after(Duration::from_millis(config.voice.catalog_delay_ms));
    let platform = SpeechPlatform {
        recognizer: Box::new(recognizer),
        recognition_events,
        synthesizer: Box::new(synthesizer),
        synthesis_events,
    };

    let (runtime_tx, events) = broadcast::channel(128);
    let (coordinator, handle) = AssistantCoordinator::new(config, platform, ai);
    let coordinator = coordinator
        .with_stores(durable, session)
        .with_runtime_events(runtime_tx);
    let task = tokio::spawn(coordinator.run());
    Assistant {
        handle,
        mic,
        events,
        task,
    }
}

impl Assistant {
    /// Wait for `status`, failing the test after [`WAIT`].
    pub(crate) async fn wait_for(&self, status: AssistantStatus) {
        tokio::time::timeout(WAIT, self.handle.wait_for_status(status))
            .await
            .unwrap_or_else(|_| panic!("timed out waiting for {status}"))
            .expect("coordinator still running");
    }

    /// Open the microphone and say `text`.
    pub(crate) async fn say(&self, text: &str) {
        self.handle.start_listening();
        self.wait_for(AssistantStatus::Listening).await;
        assert!(self.mic.hear(text), "microphone was not listening");
    }

    /// Next event matching `pick`, skipping everything else.
    pub(crate) async fn next_event<T>(
        &mut self,
        mut pick: impl FnMut(RuntimeEvent) -> Option<T>,
    ) -> Option<T> {
        let search = async {
            loop {
                match self.events.recv().await {
                    Ok(event) => {
                        if let Some(found) = pick(event) {
                            return Some(found);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => {}
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        };
        tokio::time::timeout(WAIT, search).await.ok().flatten()
    }

    /// Next line handed to the synthesizer.
    pub(crate) async fn next_spoken(&mut self) -> Option<String> {
        self.next_event(|event| match event {
            RuntimeEvent::AssistantSpoke { text } => Some(text),
            _ => None,
        })
        .await
    }

    /// Shut the coordinator down and wait for it to exit.
    pub(crate) async fn stop(self) {
        self.handle.shutdown();
        self.task
            .await
            .expect("coordinator task panicked")
            .expect("coordinator returned an error");
    }
}
