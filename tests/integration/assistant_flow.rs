//! End-to-end command flows for a user who already has a display name.

use crate::helpers::{Assistant, CannedAi, fast_config, named_store, start_assistant};
use mindpod_voice::activation::{Activation, ActivationControl};
use mindpod_voice::llm::AiCollaborator;
use mindpod_voice::store::MemoryStore;
use mindpod_voice::voice_command::Screen;
use mindpod_voice::{AssistantConfig, AssistantStatus, RuntimeEvent, SpeechOutcome};
use std::sync::Arc;

fn assistant_with(config: AssistantConfig, ai: Arc<dyn AiCollaborator>) -> Assistant {
    start_assistant(
        config,
        named_store("Sam"),
        Arc::new(MemoryStore::new()),
        ai,
    )
}

fn assistant() -> Assistant {
    assistant_with(fast_config(), CannedAi::answering("unused"))
}

#[tokio::test(start_paused = true)]
async fn show_my_tasks_navigates_and_confirms() {
    let mut assistant = assistant();
    assistant.say("show my tasks").await;

    let screen = assistant
        .next_event(|event| match event {
            RuntimeEvent::Navigate(screen) => Some(screen),
            _ => None,
        })
        .await;
    assert_eq!(screen, Some(Screen::Tasks));
    assert_eq!(
        assistant.next_spoken().await.as_deref(),
        Some("Here are your tasks.")
    );
    assistant.wait_for(AssistantStatus::Idle).await;
    assistant.stop().await;
}

#[tokio::test(start_paused = true)]
async fn unmatched_question_is_answered_by_ai() {
    let ai = CannedAi::answering("Water boils at one hundred degrees Celsius.");
    let mut assistant = assistant_with(fast_config(), ai.clone());
    assistant.say("At what temperature does water boil?").await;

    assert_eq!(
        assistant.next_spoken().await.as_deref(),
        Some("Water boils at one hundred degrees Celsius.")
    );
    assert_eq!(
        *ai.prompts.lock().unwrap(),
        vec!["At what temperature does water boil?".to_owned()]
    );
    assistant.stop().await;
}

#[tokio::test(start_paused = true)]
async fn ai_failure_is_apologized_for_not_fatal() {
    let mut assistant = assistant_with(fast_config(), CannedAi::broken());
    assistant.say("tell me something").await;

    assert_eq!(
        assistant.next_spoken().await.as_deref(),
        Some("I had trouble understanding that. Could you please try again?")
    );
    assistant.wait_for(AssistantStatus::Idle).await;

    // Still usable afterwards.
    assistant.say("hello").await;
    assert_eq!(
        assistant.next_spoken().await.as_deref(),
        Some("Hello, Sam! How can I help you today?")
    );
    assistant.stop().await;
}

#[tokio::test(start_paused = true)]
async fn speak_waits_for_catalog_and_completes() {
    let assistant = assistant();
    let catalog = assistant.handle.voice_catalog();
    assert!(!catalog.is_ready());

    let outcome = assistant.handle.speak("Welcome back.");
    assert_eq!(outcome.await.unwrap(), SpeechOutcome::Completed);
    assert!(catalog.is_ready());
    assert_eq!(assistant.handle.status(), AssistantStatus::Idle);
    assistant.stop().await;
}

#[tokio::test(start_paused = true)]
async fn empty_speak_is_skipped() {
    let assistant = assistant();
    let outcome = assistant.handle.speak("   ");
    assert_eq!(outcome.await.unwrap(), SpeechOutcome::Skipped);
    assert_eq!(assistant.handle.status(), AssistantStatus::Idle);
    assistant.stop().await;
}

#[tokio::test(start_paused = true)]
async fn listening_cancels_speech() {
    let mut assistant = assistant();
    let outcome = assistant.handle.speak(
        "Here is a rather long explanation that would take quite a while to read out loud.",
    );
    assert!(assistant.next_spoken().await.is_some());

    assistant.handle.start_listening();
    assert_eq!(outcome.await.unwrap(), SpeechOutcome::Cancelled);
    assistant.wait_for(AssistantStatus::Listening).await;
    assert!(assistant.mic.is_listening());
    assistant.stop().await;
}

#[tokio::test(start_paused = true)]
async fn no_speech_returns_to_idle() {
    let assistant = assistant();
    assistant.say("").await;
    assistant.wait_for(AssistantStatus::Idle).await;

    assistant.handle.start_listening();
    assistant.wait_for(AssistantStatus::Listening).await;
    assistant.stop().await;
}

#[tokio::test(start_paused = true)]
async fn listening_session_times_out() {
    let mut config = fast_config();
    config.listening.timeout_ms = 2_000;
    let assistant = assistant_with(config, CannedAi::answering("unused"));

    assistant.handle.start_listening();
    assistant.wait_for(AssistantStatus::Listening).await;
    assistant.wait_for(AssistantStatus::Idle).await;
    assert!(!assistant.mic.is_listening());
    assistant.stop().await;
}

#[tokio::test(start_paused = true)]
async fn activation_control_toggles_listening() {
    let assistant = assistant();

    assert_eq!(
        ActivationControl::press(&assistant.handle),
        Activation::StartListening
    );
    assistant.wait_for(AssistantStatus::Listening).await;

    assert_eq!(
        ActivationControl::press(&assistant.handle),
        Activation::StopListening
    );
    assistant.wait_for(AssistantStatus::Idle).await;
    assert!(!assistant.mic.is_listening());
    assistant.stop().await;
}

#[tokio::test(start_paused = true)]
async fn stop_listening_twice_is_harmless() {
    let assistant = assistant();
    assistant.handle.start_listening();
    assistant.wait_for(AssistantStatus::Listening).await;

    assistant.handle.stop_listening();
    assistant.handle.stop_listening();
    assistant.wait_for(AssistantStatus::Idle).await;

    assistant.handle.stop_listening();
    assistant.handle.start_listening();
    assistant.wait_for(AssistantStatus::Listening).await;
    assistant.stop().await;
}
