//! Chatline Console
//!
//! A line-oriented terminal surface for the chatline message pipeline.
//! Reads messages and commands from stdin, prints the thread to stdout and
//! logs to stderr.
//!
//! # Usage
//!
//! ```bash
//! # Talk to a local chat service
//! chatline --base-url http://127.0.0.1:5000
//!
//! # Print the widget's HTML fragments instead of compact lines
//! chatline --html
//!
//! # With verbose logging
//! RUST_LOG=debug chatline
//! ```
//!
//! # Environment Variables
//!
//! - `CHATLINE_CONFIG`: Configuration file path
//! - `CHATLINE_BASE_URL`: Chat service root URL
//! - `CHATLINE_TIMEOUT_SECS`: Chat request timeout
//! - `CHATLINE_MAX_MESSAGE_CHARS`: Maximum characters per message
//! - `RUST_LOG`: Log filter (overrides `--log-level`)

mod input;
mod surface;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_stream::wrappers::LinesStream;
use tokio_stream::StreamExt;
use tracing::{info, warn};

use chatline_core::{
    load_config, ChatBackend, Conductor, ConductorMessage, ConfigOverrides, HttpBackend,
    SurfaceEvent,
};

use input::{Command, LineReader, HELP};
use surface::ConsoleSurface;

/// How often the loop checks for a finished chat request
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Shown when a message is entered before the previous reply arrived
const PENDING_STATUS: &str = "still waiting for the previous reply";

/// Chatline - terminal client for the chat widget service
#[derive(Parser, Debug)]
#[command(name = "chatline")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, env = "CHATLINE_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Chat service root URL
    #[arg(short = 'u', long, value_name = "URL")]
    base_url: Option<String>,

    /// Chat request timeout in seconds
    #[arg(short = 't', long, value_name = "SECS")]
    timeout_secs: Option<u64>,

    /// Maximum characters per message (0 = unlimited)
    #[arg(long, value_name = "N")]
    max_message_chars: Option<usize>,

    /// Print full HTML fragments for thread entries
    #[arg(long)]
    html: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            base_url: self.base_url.clone(),
            request_timeout_secs: self.timeout_secs,
            max_message_chars: self.max_message_chars,
        }
    }
}

/// Initialize logging to stderr with the specified level
fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "chatline_console={level},chatline_core={level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Apply every queued directive to the surface
fn drain<W: std::io::Write>(
    rx: &mut mpsc::Receiver<ConductorMessage>,
    surface: &mut ConsoleSurface<W>,
) -> Result<()> {
    while let Ok(msg) = rx.try_recv() {
        surface.apply(msg).context("Failed to write to stdout")?;
    }
    Ok(())
}

/// Carry out one input command
async fn dispatch<B, W>(
    conductor: &mut Conductor<B>,
    surface: &mut ConsoleSurface<W>,
    command: Command,
) -> Result<()>
where
    B: ChatBackend + 'static,
    W: std::io::Write,
{
    match command {
        command if command.submits() && !surface.submit_enabled() => {
            tracing::debug!(command = ?command, "Input while a reply is pending");
            surface.status(PENDING_STATUS)?;
        }
        Command::Event(event) => {
            conductor.handle_event(event).await?;
        }
        Command::Suggest(n) => match surface.suggestion(n).map(str::to_string) {
            Some(text) => {
                conductor
                    .handle_event(SurfaceEvent::SuggestionClicked { text })
                    .await?;
            }
            None => surface.status(&format!("no suggestion {n}"))?,
        },
        Command::Feedback { id, choice } => {
            match id.or_else(|| surface.last_rateable().cloned()) {
                Some(message_id) => {
                    conductor
                        .handle_event(SurfaceEvent::FeedbackClicked { message_id, choice })
                        .await?;
                }
                None => surface.status("no reply to rate yet")?,
            }
        }
        Command::Help => surface.print(HELP)?,
        Command::Unknown(text) => surface.status(&format!("unknown command {text}; try /help"))?,
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let overrides = ConfigOverrides::from_env()
        .context("Invalid CHATLINE_* environment variable")?
        .merge(args.overrides());
    let (config, source) =
        load_config(args.config.as_deref(), &overrides).context("Failed to load configuration")?;
    info!(source = ?source, base_url = %config.base_url, "Starting chatline");

    let backend = HttpBackend::from_config(&config).context("Invalid chat service URL")?;
    let (tx, mut rx) = mpsc::channel(256);
    let mut conductor = Conductor::new(backend, config, tx);
    let mut surface = ConsoleSurface::new(std::io::stdout(), args.html);

    conductor.start().await?;
    conductor.handle_event(SurfaceEvent::Connected).await?;
    drain(&mut rx, &mut surface)?;

    let mut lines = LinesStream::new(BufReader::new(tokio::io::stdin()).lines());
    let mut reader = LineReader::new();
    let mut poll = tokio::time::interval(POLL_INTERVAL);

    loop {
        tokio::select! {
            line = lines.next() => match line {
                Some(Ok(line)) => {
                    if let Some(command) = reader.feed(&line) {
                        dispatch(&mut conductor, &mut surface, command).await?;
                    }
                }
                Some(Err(e)) => return Err(e).context("Failed to read stdin"),
                None => {
                    conductor.wait_pending().await;
                    conductor.handle_event(SurfaceEvent::QuitRequested).await?;
                }
            },
            _ = poll.tick() => {
                conductor.poll_pending().await;
            }
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    warn!(error = %e, "Failed to listen for Ctrl-C");
                }
                conductor.handle_event(SurfaceEvent::QuitRequested).await?;
            }
        }

        drain(&mut rx, &mut surface)?;
        if surface.should_quit() {
            break;
        }
    }

    info!("Chatline stopped");
    Ok(())
}
