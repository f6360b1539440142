//! Question → answer orchestration.
//!
//! Ties the retriever, prompt assembly, and completion streamer together
//! behind explicitly owned handles. Each call is an independent run: retrieve
//! (degrading to no grounding on failure), assemble the instruction string,
//! open the completion stream. Nothing is shared or retained across calls.

use anyhow::Result;
use futures::stream::BoxStream;

use crate::completion::CompletionClient;
use crate::prompt::build_prompt;
use crate::search::Retriever;

/// The retrieval-to-prompt-to-stream pipeline.
pub struct AnswerPipeline<R: Retriever> {
    retriever: R,
    completion: CompletionClient,
    /// Primary source text field of the collection.
    field: String,
}

impl<R: Retriever> AnswerPipeline<R> {
    pub fn new(retriever: R, completion: CompletionClient, field: impl Into<String>) -> Self {
        Self {
            retriever,
            completion,
            field: field.into(),
        }
    }

    /// Run the pipeline for one question and open the answer stream.
    ///
    /// Retrieval failures have already degraded to an empty hit list by the
    /// time the prompt is assembled, so the completion step always runs.
    /// An error here means the completion stream itself could not be opened.
    pub async fn answer_stream(
        &self,
        question: &str,
    ) -> Result<BoxStream<'static, Result<String>>> {
        let hits = self.retriever.retrieve(question).await;
        let instruction = build_prompt(&hits, &self.field);
        self.completion.stream_chat(&instruction, question).await
    }

    /// The instruction string the pipeline would send for a question,
    /// exposed so the assembled prompt can be inspected directly.
    pub async fn assemble_instruction(&self, question: &str) -> String {
        let hits = self.retriever.retrieve(question).await;
        build_prompt(&hits, &self.field)
    }
}
