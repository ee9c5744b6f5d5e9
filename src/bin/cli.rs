//! CLI binary for mindpod-voice: runs the assistant on the terminal.

use clap::{Parser, Subcommand};
use mindpod_voice::llm::AiService;
use mindpod_voice::platform::SpeechPlatform;
use mindpod_voice::platform::console::{ConsoleSynthesizer, console_recognizer};
use mindpod_voice::store::{JsonFileStore, MemoryStore};
use mindpod_voice::{
    ActivationControl, AssistantConfig, AssistantCoordinator, AssistantStatus, RuntimeEvent,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// MindPod Voice: voice-driven study assistant.
#[derive(Parser)]
#[command(name = "mindpod-voice", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Option<Command>,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Run the assistant on the terminal (typed lines stand in for speech).
    Run,

    /// Print the effective configuration as TOML.
    PrintConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they don't interleave with the spoken lines.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mindpod_voice=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run(config).await,
        Command::PrintConfig => {
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<AssistantConfig> {
    if let Some(path) = path {
        return Ok(AssistantConfig::from_file(path)?);
    }
    let default_path = AssistantConfig::default_config_path();
    if default_path.exists() {
        info!("loading config from {}", default_path.display());
        Ok(AssistantConfig::from_file(&default_path)?)
    } else {
        Ok(AssistantConfig::default())
    }
}

async fn run(config: AssistantConfig) -> anyhow::Result<()> {
    println!("MindPod Voice v{}", env!("CARGO_PKG_VERSION"));
    println!("Press Enter to talk, /stop to silence, /quit to exit.\n");

    let (recognizer, mic, recognition_events) = console_recognizer();
    let (synthesizer, synthesis_events) = ConsoleSynthesizer::new(config.voice.words_per_minute);
    synthesizer.publish_catalog_after(Duration::from_millis(config.voice.catalog_delay_ms));
    let platform = SpeechPlatform {
        recognizer: Box::new(recognizer),
        recognition_events,
        synthesizer: Box::new(synthesizer),
        synthesis_events,
    };

    let durable = Arc::new(JsonFileStore::open(&config.storage.state_path)?);
    info!("durable state at {}", durable.path().display());
    let ai = Arc::new(AiService::from_config(&config.ai)?);

    let (runtime_tx, mut runtime_rx) = broadcast::channel(64);
    let (coordinator, handle) = AssistantCoordinator::new(config, platform, ai);
    let coordinator = coordinator
        .with_stores(durable, Arc::new(MemoryStore::new()))
        .with_runtime_events(runtime_tx);
    let task = tokio::spawn(coordinator.run());

    let printer = tokio::spawn(async move {
        loop {
            match runtime_rx.recv().await {
                Ok(RuntimeEvent::StatusChanged(status)) => {
                    let control = ActivationControl::for_status(status);
                    println!("[{status}] {}", control.title);
                }
                Ok(RuntimeEvent::Navigate(screen)) => println!("-> {screen}"),
                Ok(RuntimeEvent::DisplayNameCaptured { name }) => {
                    println!("(display name saved: {name})");
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("status printer lagged by {n} events");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if mic.is_listening() {
            mic.hear(&line);
            continue;
        }
        match line.trim() {
            "" | "/listen" => {
                ActivationControl::press(&handle);
            }
            "/stop" => handle.stop_speaking(),
            "/quit" => break,
            other => {
                if handle.status() == AssistantStatus::Error {
                    println!("The assistant hit an error. Please restart.");
                } else {
                    println!("(not listening; press Enter first, ignoring \"{other}\")");
                }
            }
        }
    }

    handle.shutdown();
    task.await??;
    printer.abort();
    Ok(())
}
