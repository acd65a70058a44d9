//! Question answering over an ingested collection.
//!
//! [`DocumentQa`] is the context object for one run: it owns the pipeline,
//! the chat model, and the collection name, so independent instances can
//! coexist (e.g. in tests) without any global state.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::chat::ChatModel;
use crate::document::Chunk;
use crate::error::{ChatErrorKind, Result};
use crate::pipeline::RagPipeline;

/// Returned in place of a model answer when the chat call fails.
pub const FALLBACK_ANSWER: &str = "Sorry, I couldn't generate an answer right now.";

const INSTRUCTIONS: &str = "You are an assistant for question-answering tasks. Use the following \
pieces of retrieved context to answer the question. If you don't know the answer, say that you \
don't know. Use three sentences maximum and keep the answer concise.";

/// Build the answer prompt: fixed instructions, then the context block, then the question.
///
/// The context is the chunk texts in retrieval order, separated by a blank line.
pub fn build_prompt<S: AsRef<str>>(question: &str, chunks: &[S]) -> String {
    let context = chunks.iter().map(AsRef::as_ref).collect::<Vec<_>>().join("\n\n");
    format!("{INSTRUCTIONS}\n\nContext:\n{context}\n\nQuestion:\n{question}")
}

/// How an [`Answer`] was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "error")]
pub enum AnswerOutcome {
    /// The text is the model's raw reply.
    Generated,
    /// The chat call failed and the text is [`FALLBACK_ANSWER`].
    Fallback(ChatErrorKind),
}

/// The final answer to a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub outcome: AnswerOutcome,
}

impl Answer {
    pub fn is_fallback(&self) -> bool {
        matches!(self.outcome, AnswerOutcome::Fallback(_))
    }
}

/// Ingestion, retrieval, and answer synthesis bound to one collection.
pub struct DocumentQa {
    pipeline: Arc<RagPipeline>,
    chat_model: Arc<dyn ChatModel>,
    collection: String,
}

impl DocumentQa {
    pub fn new(
        pipeline: Arc<RagPipeline>,
        chat_model: Arc<dyn ChatModel>,
        collection: impl Into<String>,
    ) -> Self {
        Self { pipeline, chat_model, collection: collection.into() }
    }

    pub fn pipeline(&self) -> &Arc<RagPipeline> {
        &self.pipeline
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Create the collection if needed and ingest every matching file in `dir`.
    pub async fn ingest_directory(
        &self,
        dir: impl AsRef<Path>,
        extensions: &[&str],
    ) -> Result<Vec<Chunk>> {
        self.pipeline.create_collection(&self.collection).await?;
        self.pipeline.ingest_directory(&self.collection, dir, extensions).await
    }

    /// Retrieve up to `n_results` chunk texts for `question`, best match first.
    pub async fn query_documents(&self, question: &str, n_results: usize) -> Result<Vec<String>> {
        info!(question, n_results, "querying documents");
        let results = self.pipeline.query(&self.collection, question, n_results).await?;
        Ok(results.into_iter().map(|r| r.chunk.text).collect())
    }

    /// Ask the chat model to answer `question` from `relevant_chunks`.
    ///
    /// Never fails: a chat error is logged and replaced by [`FALLBACK_ANSWER`],
    /// with the error kind kept in [`Answer::outcome`].
    pub async fn generate_response<S: AsRef<str>>(
        &self,
        question: &str,
        relevant_chunks: &[S],
    ) -> Answer {
        let prompt = build_prompt(question, relevant_chunks);
        self.complete(&prompt).await
    }

    /// Retrieve context for `question` and answer it.
    ///
    /// Retrieval failures propagate; only the chat call falls back.
    pub async fn ask(&self, question: &str, n_results: usize) -> Result<Answer> {
        let chunks = self.query_documents(question, n_results).await?;
        Ok(self.generate_response(question, &chunks).await)
    }

    /// Send `question` to the chat model as-is, without retrieval.
    pub async fn ask_direct(&self, question: &str) -> Answer {
        self.complete(question).await
    }

    async fn complete(&self, prompt: &str) -> Answer {
        match self.chat_model.generate(prompt).await {
            Ok(text) => {
                info!(model = self.chat_model.name(), answer_len = text.len(), "generated answer");
                Answer { text, outcome: AnswerOutcome::Generated }
            }
            Err(e) => {
                error!(
                    model = self.chat_model.name(),
                    kind = ?e.kind(),
                    error = %e,
                    "chat model call failed"
                );
                Answer {
                    text: FALLBACK_ANSWER.to_string(),
                    outcome: AnswerOutcome::Fallback(e.kind()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_joins_context_with_blank_lines() {
        let prompt = build_prompt("What launched?", &["first chunk", "second chunk"]);
        assert!(prompt.starts_with("You are an assistant for question-answering tasks."));
        assert!(prompt.contains("Use three sentences maximum"));
        assert!(
            prompt.ends_with("Context:\nfirst chunk\n\nsecond chunk\n\nQuestion:\nWhat launched?")
        );
    }

    #[test]
    fn prompt_with_no_context_keeps_layout() {
        let prompt = build_prompt::<&str>("Q?", &[]);
        assert!(prompt.ends_with("Context:\n\n\nQuestion:\nQ?"));
    }
}
