//! # ragline
//!
//! A retrieval-grounded question answering bridge for search-backed chat.
//!
//! ragline accepts a natural-language question, retrieves top-matching
//! passages from a search index, assembles a grounded system prompt, and
//! streams a language-model answer back to the caller — over HTTP or an
//! interactive terminal loop. Retrieval and generation are delegated to
//! external services; ragline is the pipeline between them.
//!
//! ## Architecture
//!
//! ```text
//! question ──▶ ┌──────────┐   ┌──────────┐   ┌────────────┐
//!              │  Search   │──▶│  Prompt   │──▶│ Completion  │
//!              │  Client   │   │ Assembler │   │  Streamer   │
//!              └──────────┘   └──────────┘   └─────┬──────┘
//!                                                  │ tokens
//!                              ┌───────────────────┤
//!                              ▼                   ▼
//!                        ┌──────────┐        ┌──────────┐
//!                        │   HTTP    │        │ Terminal  │
//!                        │  /chat    │        │   loop    │
//!                        └──────────┘        └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! export ES_ENDPOINT=https://my-cluster.es.example.com
//! export ES_API_KEY=...
//! export OPENAI_API_KEY=...
//!
//! ragline ask "apa itu aturan umum?"   # one-shot answer
//! ragline repl                          # interactive loop
//! ragline serve                         # HTTP shell on [server].bind
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration with environment overrides |
//! | [`models`] | Search response wire types |
//! | [`search`] | Search client and the [`search::Retriever`] seam |
//! | [`prompt`] | Grounded prompt assembly |
//! | [`completion`] | Streaming completion client and SSE parsing |
//! | [`pipeline`] | Question → answer orchestration |
//! | [`server`] | HTTP delivery shell |
//! | [`repl`] | Terminal delivery shell |

pub mod completion;
pub mod config;
pub mod models;
pub mod pipeline;
pub mod prompt;
pub mod repl;
pub mod search;
pub mod server;
