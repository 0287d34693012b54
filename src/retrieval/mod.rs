//! History-aware retrieval.
//!
//! Rewrites a conversational follow-up into a standalone search query before
//! searching the index, so that "how do I install it?" retrieves against
//! what "it" refers to.

use crate::completion::{ChatMessage, CompletionClient};
use crate::config::Prompts;
use crate::error::Result;
use crate::index::{EmbeddingIndex, ScoredChunk};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// The outcome of one retrieval pass.
#[derive(Debug, Clone)]
pub struct Retrieval {
    /// The search query actually used (rewritten, or the raw input).
    pub query: String,
    /// Retrieved chunks, nearest first.
    pub chunks: Vec<ScoredChunk>,
}

/// Retriever that rewrites the conversation into a standalone query.
pub struct HistoryAwareRetriever {
    completion: Arc<dyn CompletionClient>,
    prompts: Prompts,
    top_k: usize,
}

impl HistoryAwareRetriever {
    /// Create a retriever using the given completion client for rephrasing.
    pub fn new(completion: Arc<dyn CompletionClient>, prompts: Prompts, top_k: usize) -> Self {
        Self {
            completion,
            prompts,
            top_k,
        }
    }

    /// Rewrite the query from the conversation, then search the index.
    #[instrument(skip(self, history, index), fields(history_len = history.len()))]
    pub async fn retrieve(
        &self,
        history: &[ChatMessage],
        input: &str,
        index: &EmbeddingIndex,
    ) -> Result<Retrieval> {
        let query = self.rephrase(history, input).await;
        debug!(query = %query, "Searching index");

        let chunks = index.search(&query, self.top_k).await?;
        Ok(Retrieval { query, chunks })
    }

    /// Produce a standalone search query from the conversation.
    ///
    /// With no history there is nothing to resolve, so the raw input is the
    /// query. A failed rephrase call degrades to the raw input as well; a
    /// bad rewrite should cost answer quality, not the whole request.
    async fn rephrase(&self, history: &[ChatMessage], input: &str) -> String {
        if history.is_empty() {
            return input.to_string();
        }

        let mut messages: Vec<ChatMessage> = history.to_vec();
        messages.push(ChatMessage::user(input));
        messages.push(ChatMessage::user(self.prompts.retrieval.rephrase.clone()));

        match self.completion.complete(&messages).await {
            Ok(query) => query,
            Err(e) => {
                warn!("Query rephrasing failed, falling back to raw input: {}", e);
                input.to_string()
            }
        }
    }
}
