//! End-to-end chat pipeline.
//!
//! One call runs the full cycle: fetch the FAQ corpus, split it, build a
//! fresh embedding index, retrieve against the (rewritten) query, compose
//! the answer. Nothing survives between calls; identical requests redo all
//! of the fetch and embedding work. That trade is deliberate: the corpus can
//! never go stale and no cross-request state needs guarding.

use crate::answer::AnswerComposer;
use crate::chunking::RecursiveSplitter;
use crate::completion::{ChatMessage, CompletionClient, OpenAiCompletionClient};
use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OpenAiEmbedder};
use crate::error::Result;
use crate::index::{EphemeralIndexBuilder, IndexBuilder, ScoredChunk};
use crate::retrieval::HistoryAwareRetriever;
use crate::source::{FaqSource, StrapiFaqSource};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// The pipeline's reply: the answer plus retrieval diagnostics.
#[derive(Debug, Clone)]
pub struct ChatReply {
    /// The model's answer, verbatim.
    pub answer: String,
    /// The standalone search query the retriever actually used.
    pub rewritten_query: String,
    /// The chunks stuffed into the answer prompt, nearest first.
    pub context: Vec<ScoredChunk>,
}

/// Retrieval-augmented chat pipeline.
pub struct ChatPipeline {
    source: Arc<dyn FaqSource>,
    splitter: RecursiveSplitter,
    index_builder: Arc<dyn IndexBuilder>,
    retriever: HistoryAwareRetriever,
    composer: AnswerComposer,
}

impl ChatPipeline {
    /// Assemble the pipeline from settings, wiring up the live Strapi source
    /// and OpenAI-backed embedder and completion client.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let source = Arc::new(StrapiFaqSource::new(
            &settings.faq_endpoint(),
            Duration::from_secs(settings.source.timeout_seconds),
        )?);

        let embedder = Arc::new(OpenAiEmbedder::new(
            &settings.embedding.model,
            settings.embedding.dimensions as usize,
        ));

        let completion: Arc<dyn CompletionClient> = Arc::new(OpenAiCompletionClient::new(
            &settings.answer.model,
            settings.answer.temperature,
            Duration::from_secs(settings.answer.timeout_seconds),
        ));

        Self::new(source, settings, embedder, completion)
    }

    /// Assemble the pipeline from explicit stage implementations.
    pub fn new(
        source: Arc<dyn FaqSource>,
        settings: &Settings,
        embedder: Arc<dyn Embedder>,
        completion: Arc<dyn CompletionClient>,
    ) -> Result<Self> {
        let prompts = Prompts::from_settings(settings);
        let splitter = RecursiveSplitter::new(
            settings.chunking.chunk_size,
            settings.chunking.chunk_overlap,
        )?;

        Ok(Self {
            source,
            splitter,
            index_builder: Arc::new(EphemeralIndexBuilder::new(embedder)),
            retriever: HistoryAwareRetriever::new(
                Arc::clone(&completion),
                prompts.clone(),
                settings.retrieval.top_k,
            ),
            composer: AnswerComposer::new(completion, prompts, &settings.answer.domain),
        })
    }

    /// Answer one user message given the running conversation.
    #[instrument(skip(self, history, input), fields(history_len = history.len()))]
    pub async fn answer(&self, history: &[ChatMessage], input: &str) -> Result<ChatReply> {
        // An unreachable FAQ source degrades to an empty corpus; the model
        // then has no context and falls back to its refusal phrasing.
        let entries = match self.source.fetch().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("FAQ source unavailable, continuing with empty corpus: {}", e);
                Vec::new()
            }
        };

        let chunks = self.splitter.split_entries(&entries);
        info!(entries = entries.len(), chunks = chunks.len(), "Corpus prepared");

        let index = self.index_builder.build(chunks).await?;

        let retrieval = self.retriever.retrieve(history, input, &index).await?;

        let answer = self
            .composer
            .compose(history, input, &retrieval.chunks)
            .await?;

        Ok(ChatReply {
            answer,
            rewritten_query: retrieval.query,
            context: retrieval.chunks,
        })
    }
}
