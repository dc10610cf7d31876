//! CLI entry point for chat-memory

mod echo;
mod repl;

use anyhow::{Context, Result};
use chat_memory_core::config::{Config, ConfigLoader};
use chat_memory_core::grammar::{highlight_words, incorrect_words};
use chat_memory_core::logging::init_logging;
use chat_memory_core::summarize::{word_len, Summarizer, TextSplitter};
use chat_memory_core::{Conversation, SessionMemoryStore};
use clap::{Parser, Subcommand};
use console::style;
use echo::EchoModel;
use repl::Repl;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "chat-memory")]
#[command(about = "Chat sessions with bounded conversational memory")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration directory
    #[arg(short, long, global = true)]
    config_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat
    Chat {
        /// Session to start in
        #[arg(short, long)]
        session: Option<String>,
        /// Number of recent exchanges handed to the model
        #[arg(short, long)]
        window: Option<usize>,
    },
    /// Highlight the words a correction changed
    Diff {
        /// Original text
        original: String,
        /// Corrected text
        corrected: String,
    },
    /// Show how a document is split for summarization
    Chunk {
        /// Text file to split
        file: PathBuf,
        /// Maximum chunk length in words
        #[arg(short, long)]
        size: Option<usize>,
        /// Words carried over between chunks
        #[arg(short, long)]
        overlap: Option<usize>,
    },
    /// Summarize a document with map-reduce over its chunks
    Summarize {
        /// Text file to summarize
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loader = match &cli.config_dir {
        Some(dir) => ConfigLoader::with_dir(dir),
        None => ConfigLoader::new(),
    };
    let config = loader
        .load()
        .with_context(|| format!("failed to load config from {}", loader.config_dir().display()))?;
    let _guard = init_logging(&config.logging);

    match cli.command {
        Commands::Chat { session, window } => run_chat(&config, session, window).await,
        Commands::Diff {
            original,
            corrected,
        } => run_diff(&original, &corrected),
        Commands::Chunk {
            file,
            size,
            overlap,
        } => run_chunk(&config, &file, size, overlap),
        Commands::Summarize { file } => run_summarize(&config, &file).await,
    }
}

async fn run_chat(config: &Config, session: Option<String>, window: Option<usize>) -> Result<()> {
    let session = session.unwrap_or_else(|| config.sessions.default_session.clone());
    let window = window.unwrap_or(config.memory.window_exchanges);
    info!(session = %session, window, model = %config.model.name, "Starting chat");

    let store = Arc::new(SessionMemoryStore::new());
    let conversation = Conversation::new(store, EchoModel, window);
    let mut repl = Repl::new(conversation, &session, &config.sessions.default_session)?;

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    repl.run(stdin.lock(), &mut stdout).await?;
    stdout.flush()?;
    Ok(())
}

fn run_diff(original: &str, corrected: &str) -> Result<()> {
    let changed = incorrect_words(original, corrected);
    let highlighted = highlight_words(original, &changed, |w| {
        style(w).red().underlined().to_string()
    });

    println!("{}", style("Original text with highlighted errors").bold());
    println!("{}", highlighted);
    println!();
    println!("{}", style("Corrected text").bold());
    println!("{}", corrected);

    if changed.is_empty() {
        println!("\nNo changes.");
    } else {
        println!("\nChanged words: {}", changed.join(", "));
    }
    Ok(())
}

fn run_chunk(config: &Config, file: &Path, size: Option<usize>, overlap: Option<usize>) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let splitter = TextSplitter::new(
        size.unwrap_or(config.summarizer.chunk_size),
        overlap.unwrap_or(config.summarizer.chunk_overlap),
    )?;

    let chunks = splitter.split(&text);
    info!(file = %file.display(), chunks = chunks.len(), "Split document");

    for (i, chunk) in chunks.iter().enumerate() {
        println!(
            "{} ({} words)",
            style(format!("--- chunk {}", i + 1)).cyan(),
            word_len(chunk)
        );
        println!("{}", chunk);
    }
    println!("\n{} chunk(s)", chunks.len());
    Ok(())
}

async fn run_summarize(config: &Config, file: &Path) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let summarizer = Summarizer::new(EchoModel, &config.summarizer)?;

    info!(file = %file.display(), model = %config.model.name, "Summarizing document");
    let summary = summarizer
        .summarize(&text)
        .await
        .with_context(|| format!("failed to summarize {}", file.display()))?;

    println!("{}", style("Summary").bold());
    println!("{}", summary);
    Ok(())
}
