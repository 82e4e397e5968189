//! Vaani terminal front end - composition root.
//!
//! 1. Parse CLI flags and load configuration
//! 2. Install tracing (stderr, so logs never mix with the transcript)
//! 3. Load the response catalog and start the conversation controller
//! 4. Render conversation events while reading commands from stdin

mod bridge;
mod cli;
mod render;
mod repl;

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;

use vaani_chat::{
    CaptureEvent, ChatError, ConversationController, ResponseCatalog, ResponseProvider, Voice,
};
use vaani_core::{ConversationEvent, LanguageCode, VaaniConfig};

use bridge::ConsoleSpeechBridge;
use cli::CliArgs;
use repl::ReplCommand;

fn init_tracing(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_catalog(config: &VaaniConfig) -> Result<ResponseCatalog, ChatError> {
    let catalog = match config.chat.catalog_path {
        Some(ref path) => ResponseCatalog::load(Path::new(path))?,
        None => ResponseCatalog::builtin()?,
    };
    Ok(catalog)
}

/// Print events as they arrive until the controller goes away.
async fn render_loop(mut events: broadcast::Receiver<ConversationEvent>) {
    let mut capturing = false;
    loop {
        match events.recv().await {
            Ok(event) => {
                if let ConversationEvent::CapturingChanged { capturing: now, .. } = event {
                    capturing = now;
                }
                if let Some(line) = render::event_line(&event, capturing) {
                    println!("{}", line);
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Renderer fell behind, events dropped");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

async fn list_languages(controller: &ConversationController, catalog: &ResponseCatalog) {
    let current = controller.snapshot().await.ok().map(|s| s.language);
    for code in controller.languages() {
        let label = catalog
            .entry(&code)
            .map(|e| e.label.as_str())
            .unwrap_or_default();
        let marker = if current.as_ref() == Some(&code) { "*" } else { " " };
        println!("{} {:<8} {}", marker, code, label);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config is read before tracing exists so its log level can apply.
    let config_path = args.resolve_config_path();
    let (mut config, load_error) = match VaaniConfig::load(&config_path) {
        Ok(config) => (config, None),
        Err(e) => (VaaniConfig::default(), Some(e)),
    };

    init_tracing(&args.resolve_log_level(&config));
    tracing::info!("Starting Vaani v{}", env!("CARGO_PKG_VERSION"));
    match load_error {
        Some(e) if config_path.exists() => tracing::warn!(
            path = %config_path.display(),
            error = %e,
            "Failed to load config, using defaults"
        ),
        Some(_) => tracing::debug!(path = %config_path.display(), "No config file, using defaults"),
        None => tracing::info!(path = %config_path.display(), "Configuration loaded"),
    }

    args.apply(&mut config)?;
    config.validate()?;

    let catalog = Arc::new(load_catalog(&config)?);
    let voices: Vec<Voice> = catalog
        .languages()
        .into_iter()
        .map(|code| Voice::new(format!("vaani-{}", code.primary()), code))
        .collect();
    let bridge = Arc::new(ConsoleSpeechBridge::new(
        voices,
        config.speech.fallback_language.clone(),
        config.speech.speech_to_text,
    ));
    let rng = match config.chat.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let (controller, task) =
        ConversationController::spawn(&config, catalog.clone(), bridge.clone(), rng)?;
    let renderer = tokio::spawn(render_loop(controller.subscribe()));

    let snapshot = controller.snapshot().await?;
    println!("{}", render::history(&snapshot));
    println!("(type /help for commands)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match repl::parse(&line) {
            ReplCommand::Say(text) => {
                controller.set_input(text)?;
                controller.submit_detached(None)?;
            }
            ReplCommand::Language(raw) => match LanguageCode::parse(&raw) {
                Ok(code) if catalog.supports(&code) => {
                    controller.change_language(code).await?;
                }
                Ok(_) => println!("! unknown language '{}' (try /langs)", raw),
                Err(e) => println!("! {}", e),
            },
            ReplCommand::Languages => list_languages(&controller, &catalog).await,
            ReplCommand::Voice(phrase) => match controller.begin_voice_capture().await {
                Ok(()) => {
                    // The typed phrase stands in for what the microphone heard.
                    bridge.complete_session(match phrase {
                        Some(text) => CaptureEvent::Transcribed(text),
                        None => CaptureEvent::Ended,
                    });
                }
                Err(e) => tracing::debug!(error = %e, "Voice capture refused"),
            },
            ReplCommand::History => {
                println!("{}", render::history(&controller.snapshot().await?));
            }
            ReplCommand::Export => {
                let snapshot = controller.snapshot().await?;
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            }
            ReplCommand::Help => println!("{}", repl::HELP),
            ReplCommand::Quit => break,
            ReplCommand::Unknown(name) => println!("! unknown command /{} (try /help)", name),
        }
    }

    controller.shutdown()?;
    task.await?;
    drop(controller);
    let _ = renderer.await;
    tracing::info!("Vaani stopped");
    Ok(())
}
