//! # ragline CLI
//!
//! The `ragline` binary drives the question answering bridge. It provides
//! the two delivery shells (HTTP server, interactive terminal loop) plus
//! one-shot commands for asking a question and inspecting retrieval.
//!
//! ## Usage
//!
//! ```bash
//! ragline --config ./ragline.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ragline serve` | Start the streaming HTTP server (`POST /chat`) |
//! | `ragline repl` | Interactive question loop on the terminal |
//! | `ragline ask "<question>"` | Answer one question and exit |
//! | `ragline search "<query>"` | Print the raw ranked hits for a query |
//!
//! ## Environment
//!
//! | Variable | Purpose |
//! |----------|---------|
//! | `ES_ENDPOINT` | Search service base URL (overrides `[search].endpoint`) |
//! | `ES_API_KEY` | Search service API key |
//! | `OPENAI_API_KEY` | Completion service API key |
//! | `PORT` | Listening port (overrides the port in `[server].bind`) |

mod completion;
mod config;
mod models;
mod pipeline;
mod prompt;
mod repl;
mod search;
mod server;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ragline — a retrieval-grounded question answering bridge.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. The file is optional; every setting has a default or an environment
/// override.
#[derive(Parser)]
#[command(
    name = "ragline",
    about = "ragline — a retrieval-grounded question answering bridge for search-backed chat",
    version,
    long_about = "ragline retrieves top-matching passages from a search index, assembles a \
    grounded prompt, and streams a language-model answer back over HTTP or an interactive \
    terminal loop. Retrieval and generation are delegated to external services."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./ragline.toml`. Missing files fall back to built-in
    /// defaults; API keys always come from the environment.
    #[arg(long, global = true, default_value = "./ragline.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Start the streaming HTTP server.
    ///
    /// Serves `POST /chat` (JSON question in, streamed plain-text answer
    /// out) and `GET /health` on the configured bind address until the
    /// process is terminated.
    Serve,

    /// Start the interactive terminal loop.
    ///
    /// Reads a question per line, streams the answer to stdout, and
    /// re-prompts. Exits on EOF or the `exit`/`quit` commands.
    Repl,

    /// Answer a single question and exit.
    Ask {
        /// The question to answer.
        question: String,
    },

    /// Print the raw ranked hits for a query.
    ///
    /// Bypasses prompt assembly and generation; useful for verifying what
    /// grounding the index returns for a question.
    Search {
        /// The search query string.
        query: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_or_default(&cli.config)?;

    match cli.command {
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Repl => {
            repl::run_repl(&cfg).await?;
        }
        Commands::Ask { question } => {
            repl::run_ask(&cfg, &question).await?;
        }
        Commands::Search { query } => {
            search::run_search(&cfg, &query).await?;
        }
    }

    Ok(())
}
