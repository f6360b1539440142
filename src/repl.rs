//! Terminal delivery shell.
//!
//! An explicit read-eval loop: read a question, run the pipeline, print the
//! answer fragments as they arrive, re-prompt. The loop exits on EOF or on
//! the `exit`/`quit` commands. Generation failures are logged to stderr and
//! the loop resumes.

use anyhow::Result;
use futures::stream::StreamExt;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::completion::CompletionClient;
use crate::config::Config;
use crate::pipeline::AnswerPipeline;
use crate::search::{Retriever, SearchClient};

/// Runs the interactive terminal loop until EOF or an exit command.
pub async fn run_repl(config: &Config) -> Result<()> {
    let pipeline = build_pipeline(config)?;
    let interactive = atty::is(atty::Stream::Stdin);

    if interactive {
        println!("ragline interactive shell. Ask a question, or type 'exit' to quit.");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        if interactive {
            print!("> ");
            std::io::stdout().flush()?;
        }

        let Some(line) = lines.next_line().await? else {
            break; // EOF
        };

        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if question == "exit" || question == "quit" {
            break;
        }

        answer_once(&pipeline, question).await?;
    }

    Ok(())
}

/// Runs the pipeline once for a single question and prints the answer.
/// Used by the `ask` command.
pub async fn run_ask(config: &Config, question: &str) -> Result<()> {
    let pipeline = build_pipeline(config)?;
    answer_once(&pipeline, question.trim()).await
}

fn build_pipeline(config: &Config) -> Result<AnswerPipeline<SearchClient>> {
    let search = SearchClient::from_env(config)?;
    let completion = CompletionClient::from_env(config)?;
    let field = search.primary_field().to_string();
    Ok(AnswerPipeline::new(search, completion, field))
}

/// Streams one answer to stdout, flushing per fragment so tokens appear as
/// they arrive. Generation failures are logged, not propagated; only local
/// stdout failures return an error.
async fn answer_once<R: Retriever>(pipeline: &AnswerPipeline<R>, question: &str) -> Result<()> {
    let mut stream = match pipeline.answer_stream(question).await {
        Ok(stream) => stream,
        Err(e) => {
            eprintln!("Error generating completion: {:#}", e);
            return Ok(());
        }
    };

    let mut stdout = std::io::stdout();

    while let Some(item) = stream.next().await {
        match item {
            Ok(fragment) => {
                write!(stdout, "{}", fragment)?;
                stdout.flush()?;
            }
            Err(e) => {
                eprintln!("\nCompletion stream failed mid-answer: {:#}", e);
                break;
            }
        }
    }

    println!();
    Ok(())
}
