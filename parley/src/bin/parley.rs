//! Command line chat over the configured providers
//!
//! Each line read from stdin is sent as a user message in one session.
//! Replies are printed to stdout either as the raw NDJSON envelope or as
//! plain text. Logs go to stderr.

use anyhow::Context;
use clap::Parser;
use parley::dispatch::{Dispatcher, Settings, StreamMode};
use parley::session::{ChatMessage, ChatRequest, ChatService, MemoryStore};
use parley::CanonicalChunk;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// Chat with the configured LLM providers from the terminal
#[derive(Debug, Parser)]
#[command(name = "parley", version, about)]
struct Args {
    /// Wait for the whole reply instead of streaming it
    #[arg(long)]
    once: bool,

    /// Print only the reply text instead of NDJSON lines
    #[arg(long)]
    text: bool,

    /// How a mid-stream failure is handled: splice or buffered
    #[arg(long, value_parser = parse_mode)]
    stream_mode: Option<StreamMode>,

    /// Owner of the session
    #[arg(long, default_value = "local", env = "PARLEY_USER")]
    user: String,
}

fn parse_mode(raw: &str) -> Result<StreamMode, String> {
    raw.parse().map_err(|e: parley::Error| e.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut settings = Settings::from_env().context("invalid configuration")?;
    if let Some(mode) = args.stream_mode {
        settings.stream_mode = mode;
    }
    let dispatcher = Dispatcher::from_settings(&settings)?;
    tracing::info!(
        primary = dispatcher.primary_name(),
        secondary = ?dispatcher.secondary_name(),
        mode = %dispatcher.stream_mode(),
        "parley ready"
    );

    let service = ChatService::new(Arc::new(dispatcher), Arc::new(MemoryStore::new()));
    let mut session = None;
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = input.next_line().await? {
        let message = line.trim();
        if message.is_empty() {
            continue;
        }

        let mut request = ChatRequest::new(message);
        request.session_id = session;

        let reply = if args.once {
            let reply = service.send(&args.user, request).await?;
            print_reply(&reply, args.text)?;
            reply
        } else {
            relay(&service, &args.user, request, args.text).await?
        };
        session = Some(reply.session_id);
    }

    Ok(())
}

/// Stream one reply to stdout while the service persists it
async fn relay(
    service: &ChatService,
    user: &str,
    request: ChatRequest,
    text: bool,
) -> anyhow::Result<ChatMessage> {
    let (tx, mut rx) = mpsc::channel::<String>(32);
    let printer = tokio::spawn(async move {
        let mut stdout = std::io::stdout();
        while let Some(line) = rx.recv().await {
            if !text {
                write!(stdout, "{line}")?;
            } else {
                match serde_json::from_str::<CanonicalChunk>(&line) {
                    Ok(CanonicalChunk::Content { content }) => write!(stdout, "{content}")?,
                    Ok(CanonicalChunk::Error { error }) => eprintln!("error: {error}"),
                    _ => {}
                }
            }
            stdout.flush()?;
        }
        if text {
            writeln!(stdout)?;
        }
        Ok::<_, std::io::Error>(())
    });

    let reply = service.stream(user, request, tx).await?;
    printer.await??;
    Ok(reply)
}

fn print_reply(reply: &ChatMessage, text: bool) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout();
    if text {
        writeln!(stdout, "{}", reply.content)?;
    } else {
        let lines = [
            CanonicalChunk::session_id(reply.session_id.to_string()),
            CanonicalChunk::content(reply.content.clone()),
            CanonicalChunk::message_id(reply.id.to_string()),
        ];
        for chunk in &lines {
            write!(stdout, "{}", chunk.to_ndjson())?;
        }
    }
    stdout.flush()?;
    Ok(())
}
