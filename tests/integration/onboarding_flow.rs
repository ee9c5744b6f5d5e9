//! First-run name capture through a running coordinator.

use crate::helpers::{CannedAi, fast_config, start_assistant};
use mindpod_voice::session::USER_NAME_KEY;
use mindpod_voice::store::{JsonFileStore, KeyValueStore, MemoryStore};
use mindpod_voice::{AssistantStatus, RuntimeEvent};
use std::sync::Arc;

const GREETING: &str = "Hi there! To personalize our chat, what should I call you?";

#[tokio::test(start_paused = true)]
async fn captured_name_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let durable = Arc::new(JsonFileStore::open(&path).unwrap());
    let mut assistant = start_assistant(
        fast_config(),
        durable,
        Arc::new(MemoryStore::new()),
        CannedAi::answering("unused"),
    );
    assert_eq!(assistant.next_spoken().await.as_deref(), Some(GREETING));
    assistant.wait_for(AssistantStatus::Listening).await;
    assert!(assistant.mic.hear("It's Sam."));

    let name = assistant
        .next_event(|event| match event {
            RuntimeEvent::DisplayNameCaptured { name } => Some(name),
            _ => None,
        })
        .await;
    assert_eq!(name.as_deref(), Some("Its Sam"));
    let acknowledgment = assistant.next_spoken().await.unwrap();
    assert!(acknowledgment.contains("Sam"), "got {acknowledgment}");
    assistant.stop().await;

    let reopened = Arc::new(JsonFileStore::open(&path).unwrap());
    assert_eq!(reopened.get(USER_NAME_KEY).as_deref(), Some("Its Sam"));

    // A fresh session with the stored name skips onboarding.
    let mut assistant = start_assistant(
        fast_config(),
        reopened,
        Arc::new(MemoryStore::new()),
        CannedAi::answering("unused"),
    );
    assistant.say("hello").await;
    assert_eq!(
        assistant.next_spoken().await.as_deref(),
        Some("Hello, Its Sam! How can I help you today?")
    );
    assistant.stop().await;
}

#[tokio::test(start_paused = true)]
async fn unusable_answer_is_reprompted() {
    let durable = Arc::new(MemoryStore::new());
    let mut assistant = start_assistant(
        fast_config(),
        durable.clone(),
        Arc::new(MemoryStore::new()),
        CannedAi::answering("unused"),
    );
    assert_eq!(assistant.next_spoken().await.as_deref(), Some(GREETING));
    assistant.wait_for(AssistantStatus::Listening).await;

    assert!(assistant.mic.hear("..."));
    assert_eq!(
        assistant.next_spoken().await.as_deref(),
        Some("I didn't quite catch that. Could you tell me your name again?")
    );
    assert_eq!(durable.get(USER_NAME_KEY), None);

    // The re-prompt reopens the microphone by itself.
    assistant.wait_for(AssistantStatus::Listening).await;
    assert!(assistant.mic.hear("Ana"));
    let acknowledgment = assistant.next_spoken().await.unwrap();
    assert!(acknowledgment.contains("Ana"));
    assert_eq!(durable.get(USER_NAME_KEY).as_deref(), Some("Ana"));
    assistant.stop().await;
}

#[tokio::test(start_paused = true)]
async fn onboarding_gives_up_after_unusable_answers() {
    let mut config = fast_config();
    config.onboarding.max_name_attempts = 1;
    let durable = Arc::new(MemoryStore::new());
    let mut assistant = start_assistant(
        config,
        durable.clone(),
        Arc::new(MemoryStore::new()),
        CannedAi::answering("unused"),
    );
    assert_eq!(assistant.next_spoken().await.as_deref(), Some(GREETING));
    assistant.wait_for(AssistantStatus::Listening).await;

    assert!(assistant.mic.hear("?"));
    let line = assistant.next_spoken().await.unwrap();
    assert!(line.contains("friend"), "got {line}");
    assistant.wait_for(AssistantStatus::Idle).await;
    assert_eq!(durable.get(USER_NAME_KEY), None);

    assistant.say("hi").await;
    assert_eq!(
        assistant.next_spoken().await.as_deref(),
        Some("Hello, friend! How can I help you today?")
    );
    assistant.stop().await;
}

#[tokio::test(start_paused = true)]
async fn greeting_is_spoken_once_per_session() {
    let session = Arc::new(MemoryStore::new());

    let mut first = start_assistant(
        fast_config(),
        Arc::new(MemoryStore::new()),
        session.clone(),
        CannedAi::answering("unused"),
    );
    assert_eq!(first.next_spoken().await.as_deref(), Some(GREETING));
    first.stop().await;

    let mut second = start_assistant(
        fast_config(),
        Arc::new(MemoryStore::new()),
        session,
        CannedAi::answering("unused"),
    );
    assert_eq!(second.next_spoken().await, None);
    assert_eq!(second.handle.status(), AssistantStatus::Idle);
    second.stop().await;
}
