//! Interactive cloud-learning tutor.
//!
//! This binary provides a streaming REPL interface to the tutor persona over
//! the Gemini API. Set `GEMINI_API_KEY` before running.
//!
//! # Usage
//!
//! ```bash
//! # Pick a starter card or type a topic at the prompt
//! stratus-tutor
//!
//! # Start right away on the second starter card, focused on AWS
//! stratus-tutor --topic 2 --cloud aws
//!
//! # Disable colors and log as JSON (useful for piping output)
//! STRATUS_LOG=debug stratus-tutor --no-color --log-json
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/help` - Show available commands
//! - `/reset` - Clear the transcript
//! - `/cloud <name>` - Change the cloud focus
//! - `/path <A-E>` - Choose a learning path
//! - `/export <file.html>` - Save the transcript as HTML
//! - `/quit` - Exit the application

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing_subscriber::EnvFilter;

use stratus_tutor::catalog::{
    FEATURES, MODULES, module_prompt, search_suggestions, starter_prompt,
};
use stratus_tutor::chat::{
    ChatArgs, ChatCommand, ChatConfig, PlainTextRenderer, Renderer, Session, help_text,
    parse_command,
};
use stratus_tutor::{Gemini, TutorService, capture_local_offset};

/// Environment variable holding the log filter; `RUST_LOG` is the fallback.
const LOG_ENV: &str = "STRATUS_LOG";

/// Main entry point for the stratus-tutor application.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Must run before any other thread exists.
    capture_local_offset();
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("stratus-tutor [OPTIONS]");
    init_tracing(args.log_json);
    let config = ChatConfig::from(args);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        model = %config.model,
        "stratus-tutor starting"
    );

    let client = Gemini::new(None)?;
    let service = TutorService::new(client, config.model.clone())
        .with_generation_config(config.generation_config());
    let mut session = Session::new(service).with_cloud_focus(config.cloud_focus);
    let mut rl = DefaultEditor::new()?;

    // Flag for interrupt handling during streaming
    let interrupted = Arc::new(AtomicBool::new(false));

    // Set up Ctrl+C handler
    let interrupted_clone = interrupted.clone();
    ctrlc::set_handler(move || {
        interrupted_clone.store(true, Ordering::Relaxed);
    })?;

    let mut renderer =
        PlainTextRenderer::with_color_and_interrupt(config.use_color, interrupted.clone());

    println!(
        "CloudStratus Tutor (model: {}, focus: {})",
        config.model,
        session.cloud_focus()
    );
    println!("Type /help for commands, /quit to exit\n");

    match config.opening_prompt() {
        Some(prompt) => converse(&mut session, &prompt, &mut renderer).await,
        None => print_starters(),
    }

    loop {
        // Reset interrupt flag before each input
        interrupted.store(false, Ordering::Relaxed);

        let prompt = if session.is_started() { "You: " } else { "Topic: " };
        let readline = rl.readline(prompt);

        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                // Check for slash commands
                if let Some(cmd) = parse_command(line) {
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::Start(topic) => match topic {
                            Some(topic) => {
                                session.reset();
                                converse(&mut session, &topic, &mut renderer).await;
                            }
                            None => greet(&mut session, &mut renderer).await,
                        },
                        ChatCommand::Reset => {
                            session.reset();
                            renderer.print_info("Session reset.");
                            print_starters();
                        }
                        ChatCommand::Cloud(focus) => {
                            session.set_cloud_focus(focus);
                            renderer.print_info(&format!("Cloud focus set to {focus}"));
                        }
                        ChatCommand::Module(index) => {
                            let prompt = module_prompt(MODULES[index]);
                            converse(&mut session, &prompt, &mut renderer).await;
                        }
                        ChatCommand::Path(letter) => {
                            let label = format!("Path {letter}");
                            converse(&mut session, &label, &mut renderer).await;
                        }
                        ChatCommand::Topics(query) => {
                            print_topics(query.as_deref().unwrap_or_default(), &mut renderer);
                        }
                        ChatCommand::Phase => {
                            renderer.print_info(&format!("Phase: {}", session.learning_phase()));
                        }
                        ChatCommand::Export(path) => match session.save_html_to(&path) {
                            Ok(()) => {
                                renderer.print_info(&format!("Transcript exported to {}", path))
                            }
                            Err(err) => renderer
                                .print_error(&format!("Failed to export transcript: {}", err)),
                        },
                        ChatCommand::Stats => {
                            print_stats(&session);
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::Invalid(message) => {
                            renderer.print_error(&message);
                        }
                    }
                    continue;
                }

                // Regular message - send to the tutor
                converse(&mut session, line, &mut renderer).await;
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D - exit
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

fn init_tracing(log_json: bool) {
    let env_filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// Sends `text`, starting the session with it first when there is none.
async fn converse(session: &mut Session<TutorService>, text: &str, renderer: &mut dyn Renderer) {
    let result = if session.is_started() {
        session.send(text, renderer).await
    } else {
        session.start_with(&starter_prompt(text), renderer).await
    };
    match result {
        Ok(_) => print_paths(session),
        Err(err) if !session.is_started() => {
            renderer.print_error(&format!("Failed to start session: {}", err));
        }
        // The failed reply has already been rendered in place.
        Err(err) => tracing::debug!(error = %err, "reply failed"),
    }
}

async fn greet(session: &mut Session<TutorService>, renderer: &mut dyn Renderer) {
    match session.start().await {
        Ok(id) => {
            if let Some(greeting) = session.message(id) {
                renderer.print_message(greeting);
            }
        }
        Err(err) => renderer.print_error(&format!("Failed to start session: {}", err)),
    }
}

fn print_starters() {
    println!("    Choose a starting point (number or title), or type any topic:");
    for (number, feature) in FEATURES.iter().enumerate() {
        println!(
            "      {}. {:<16} {}",
            number + 1,
            feature.title,
            feature.description
        );
    }
    println!("    Popular topics:");
    for suggestion in search_suggestions("") {
        println!("      - {}", suggestion);
    }
    println!();
}

fn print_topics(query: &str, renderer: &mut dyn Renderer) {
    let suggestions = search_suggestions(query);
    if suggestions.is_empty() {
        renderer.print_info(&format!("No suggestions match '{}'.", query));
        return;
    }
    println!("    Suggested topics:");
    for suggestion in suggestions {
        println!("      - {}", suggestion);
    }
}

fn print_paths(session: &Session<TutorService>) {
    let options = session.path_options();
    if options.is_empty() {
        return;
    }
    println!("    Learning paths: {}", options.join(", "));
    println!("    Choose one with /path <letter>\n");
}

fn print_stats(session: &Session<TutorService>) {
    let stats = session.stats();
    println!("    Session Statistics:");
    println!("      Model: {}", session.service().model());
    println!("      Started: {}", if stats.started { "yes" } else { "no" });
    println!("      Cloud focus: {}", stats.cloud_focus);
    println!("      Phase: {}", stats.phase);
    println!(
        "      Messages: {} ({} student / {} tutor)",
        stats.message_count, stats.user_messages, stats.model_messages
    );
    println!(
        "      Exchanges: {} ({} failed, {} interrupted)",
        stats.exchanges, stats.failed_exchanges, stats.interrupted_exchanges
    );
    println!("      Stale fragments dropped: {}", stats.stale_chunks);
    println!("      Turns replayed: {}", session.service().history_len());
}
