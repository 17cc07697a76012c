use std::borrow::Cow::{self, Borrowed, Owned};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Result, bail};
use clap::Parser;
use colored::Colorize;
use rustyline::Editor;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use atelier_application::{
    BackendFactory, Dispatcher, PlaceholderService, StudioState, UpdateApplier,
};
use atelier_core::config::StudioConfig;
use atelier_core::session::SessionArchive;
use atelier_infrastructure::{ConfigService, FileKvStore, KvSessionArchive};
use atelier_interaction::{AttachmentData, EnvKeyGate, GeminiClient, GenerationBackend, KeyGate};

mod attach;
mod render;

/// Command-line arguments for the studio shell.
#[derive(Parser)]
#[command(name = "atelier")]
#[command(about = "Atelier - Multimodal Generation Studio", long_about = None)]
struct Cli {
    /// Path to an alternate configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

/// CLI helper for rustyline that provides completion, highlighting, and hints.
#[derive(Clone)]
struct CliHelper {
    commands: Vec<String>,
    placeholders: Arc<PlaceholderService>,
}

impl CliHelper {
    fn new(placeholders: Arc<PlaceholderService>) -> Self {
        Self {
            commands: vec![
                "/attach".to_string(),
                "/session".to_string(),
                "/sessions".to_string(),
                "/surprise".to_string(),
            ],
            placeholders,
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        if line.starts_with('/') {
            let candidates: Vec<Pair> = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(line))
                .map(|cmd| Pair {
                    display: cmd.clone(),
                    replacement: cmd.clone(),
                })
                .collect();
            Ok((0, candidates))
        } else {
            Ok((0, vec![]))
        }
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Owned(hint.bright_black().to_string())
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        // The rotating placeholder doubles as the empty-line hint.
        if line.is_empty() {
            return Some(self.placeholders.current());
        }

        if line.starts_with('/') && !line.contains(' ') {
            self.commands
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for CliHelper {}

/// Environment wins over the config file.
fn resolve_api_key(config: &StudioConfig) -> Option<String> {
    std::env::var("GEMINI_API_KEY")
        .ok()
        .filter(|key| !key.is_empty())
        .or_else(|| config.api_key.clone())
}

/// The main entry point for the Atelier studio shell.
///
/// This async function sets up a rustyline-based REPL that:
/// 1. Loads the configuration and resolves the API key
/// 2. Hydrates session history and spawns the update applier
/// 3. Wires the dispatcher and the placeholder rotation
/// 4. Renders snapshot changes as colored artifact cards
/// 5. Handles prompts and slash commands without blocking generation
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so they never garble the prompt line.
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // ===== Configuration =====
    let config_service = match cli.config {
        Some(path) => ConfigService::with_path(path),
        None => ConfigService::new()?,
    };
    let config = config_service.get_config();

    let Some(api_key) = resolve_api_key(&config) else {
        bail!("No API key found: set GEMINI_API_KEY or api_key in config.toml");
    };

    // ===== Backend Initialization =====
    let store = match &config.storage.data_dir {
        Some(dir) => FileKvStore::new(dir.join("store")).await?,
        None => FileKvStore::default_location().await?,
    };
    let archive: Arc<dyn SessionArchive> =
        Arc::new(KvSessionArchive::new(Arc::new(store), config.storage.max_sessions));

    let history = archive.hydrate().await?;
    tracing::info!("[Bootstrap] Restored {} sessions", history.len());
    let state = StudioState::from_history(history);

    let (applier, sink, snapshots) = UpdateApplier::new(state, archive);
    tokio::spawn(applier.run());

    let backend: Arc<dyn GenerationBackend> = Arc::new(GeminiClient::new(api_key.clone()));
    let factory_key = api_key.clone();
    let make_backend: Box<BackendFactory> =
        Box::new(move || Arc::new(GeminiClient::new(factory_key.clone())) as Arc<dyn GenerationBackend>);
    // The environment gate is satisfied by the key we just resolved.
    let key_gate: Arc<dyn KeyGate> = Arc::new(EnvKeyGate::new(true));
    let dispatcher = Dispatcher::new(make_backend, key_gate, sink.clone(), config.clone(), api_key);
    tracing::info!("[Bootstrap] Dispatcher ready");

    let placeholders = Arc::new(PlaceholderService::new(
        backend,
        config.placeholders.clone(),
        &config.models.chat,
    ));
    {
        let placeholders = placeholders.clone();
        tokio::spawn(async move { placeholders.refresh_once().await });
    }
    let _rotation = placeholders.spawn_rotation();

    // ===== Snapshot Watcher =====
    // Prints card updates while the REPL waits on input.
    let mut card_rx = snapshots.clone();
    let mut tracker = render::CardTracker::seeded(&card_rx.borrow());
    tokio::spawn(async move {
        while card_rx.changed().await.is_ok() {
            let snapshot = card_rx.borrow_and_update().clone();
            tracker.print_changes(&snapshot);
        }
    });

    // ===== REPL Setup =====
    let helper = CliHelper::new(placeholders.clone());
    let mut rl = Editor::new()?;
    rl.set_helper(Some(helper));

    println!("{}", "=== Atelier Studio ===".bright_magenta().bold());
    println!(
        "{}",
        "Type a prompt to generate. Commands: /attach <path>, /sessions, /session <n>, /surprise. 'quit' to exit."
            .bright_black()
    );
    println!();

    let mut pending_attachment: Option<AttachmentData> = None;

    // ===== Main REPL Loop =====
    loop {
        let readline = rl.readline(">> ");

        match readline {
            Ok(line) => {
                let trimmed = line.trim();

                // Handle quit command
                if trimmed == "quit" || trimmed == "exit" {
                    println!("{}", "Goodbye!".bright_green());
                    break;
                }

                // Skip empty lines
                if trimmed.is_empty() {
                    continue;
                }

                // Add to history
                let _ = rl.add_history_entry(&line);

                if let Some(raw) = trimmed.strip_prefix("/attach") {
                    let raw = raw.trim();
                    if raw.is_empty() {
                        println!("{}", "Usage: /attach <path>".yellow());
                        continue;
                    }
                    match attach::read_attachment(Path::new(raw)) {
                        Ok(data) => {
                            println!(
                                "{}",
                                format!("Attached {} ({})", raw, data.mime_type).green()
                            );
                            println!(
                                "{}",
                                "It will be sent with your next prompt.".bright_black()
                            );
                            pending_attachment = Some(data);
                        }
                        Err(err) => println!("{}", format!("{err:#}").red()),
                    }
                    continue;
                }

                if trimmed == "/sessions" {
                    let snapshot = snapshots.borrow().clone();
                    render::print_session_list(&snapshot);
                    continue;
                }

                if let Some(raw) = trimmed.strip_prefix("/session") {
                    let snapshot = snapshots.borrow().clone();
                    match raw.trim().parse::<usize>() {
                        Ok(index) if index < snapshot.sessions.len() => {
                            sink.session_selected(index);
                            render::print_session(index, &snapshot.sessions[index], true);
                        }
                        Ok(index) => {
                            println!("{}", format!("No session {index}").yellow());
                        }
                        Err(_) => println!("{}", "Usage: /session <index>".yellow()),
                    }
                    continue;
                }

                if trimmed == "/surprise" {
                    let prompt = placeholders.random();
                    println!("{}", format!("> {}", prompt).green());
                    tokio::spawn(dispatcher.clone().submit(prompt, None));
                    continue;
                }

                if trimmed.starts_with('/') {
                    println!("{}", "Unknown command".bright_black());
                    continue;
                }

                // Display user input in green
                println!("{}", format!("> {}", trimmed).green());

                // Spawn the submission so the shell stays interactive.
                let prompt = trimmed.to_string();
                let attachment = pending_attachment.take();
                tokio::spawn(dispatcher.clone().submit(prompt, attachment));
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    Ok(())
}
