//! Request-scoped embedding index.
//!
//! The index is rebuilt from the freshly fetched corpus on every chat
//! request and dropped when the reply is produced. Building is isolated
//! behind [`IndexBuilder`] so a cached or incremental implementation can be
//! substituted without touching the endpoint logic.

use crate::chunking::Chunk;
use crate::embedding::Embedder;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A retrieved chunk with its similarity score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    /// The matched chunk.
    pub chunk: Chunk,
    /// Similarity score (higher is better).
    pub score: f32,
}

/// Immutable nearest-neighbor index over embedded chunks.
pub struct EmbeddingIndex {
    embedder: Arc<dyn Embedder>,
    entries: Vec<(Chunk, Vec<f32>)>,
}

impl std::fmt::Debug for EmbeddingIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingIndex")
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl EmbeddingIndex {
    /// Embed the query and return the k nearest chunks by cosine similarity,
    /// descending, ties broken by insertion order.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        let query_embedding = self.embedder.embed(query).await?;

        let mut results: Vec<ScoredChunk> = self
            .entries
            .iter()
            .map(|(chunk, embedding)| ScoredChunk {
                chunk: chunk.clone(),
                score: cosine_similarity(&query_embedding, embedding),
            })
            .collect();

        // Stable sort keeps insertion order among equal scores.
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(k);

        Ok(results)
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Trait for building an index from a chunked corpus.
#[async_trait]
pub trait IndexBuilder: Send + Sync {
    /// Embed all chunks and assemble the index.
    ///
    /// Fails with [`crate::SvarError::Embedding`] if the embedding call
    /// fails; the caller is expected to surface that as a request failure
    /// rather than serve an empty index.
    async fn build(&self, chunks: Vec<Chunk>) -> Result<EmbeddingIndex>;
}

/// Builder for the per-request in-memory index.
pub struct EphemeralIndexBuilder {
    embedder: Arc<dyn Embedder>,
}

impl EphemeralIndexBuilder {
    /// Create a builder using the given embedder for both corpus and query.
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }
}

#[async_trait]
impl IndexBuilder for EphemeralIndexBuilder {
    async fn build(&self, chunks: Vec<Chunk>) -> Result<EmbeddingIndex> {
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        Ok(EmbeddingIndex {
            embedder: Arc::clone(&self.embedder),
            entries: chunks.into_iter().zip(embeddings).collect(),
        })
    }
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SvarError;

    /// Embedder that maps known phrases onto fixed axis vectors.
    struct AxisEmbedder;

    fn axis_for(text: &str) -> Vec<f32> {
        if text.contains("alpha") {
            vec![1.0, 0.0, 0.0]
        } else if text.contains("beta") {
            vec![0.0, 1.0, 0.0]
        } else {
            vec![0.0, 0.0, 1.0]
        }
    }

    #[async_trait]
    impl Embedder for AxisEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(axis_for(text))
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| axis_for(t)).collect())
        }

        fn dimensions(&self) -> usize {
            3
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(SvarError::Embedding("service down".to_string()))
        }

        async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Err(SvarError::Embedding("service down".to_string()))
        }

        fn dimensions(&self) -> usize {
            3
        }
    }

    fn chunks(texts: &[&str]) -> Vec<Chunk> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| Chunk::new(*t, "q", i))
            .collect()
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &[1.0, 0.0, 0.0]) - 1.0).abs() < 0.001);
        assert!(cosine_similarity(&a, &[0.0, 1.0, 0.0]).abs() < 0.001);
        assert!((cosine_similarity(&a, &[-1.0, 0.0, 0.0]) + 1.0).abs() < 0.001);
        assert_eq!(cosine_similarity(&a, &[]), 0.0);
    }

    #[tokio::test]
    async fn test_search_ranks_nearest_first() {
        let builder = EphemeralIndexBuilder::new(Arc::new(AxisEmbedder));
        let index = builder
            .build(chunks(&["about alpha", "about beta", "about gamma"]))
            .await
            .unwrap();

        let results = index.search("tell me about beta", 10).await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].chunk.text, "about beta");
        for pair in results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[tokio::test]
    async fn test_search_returns_at_most_k() {
        let builder = EphemeralIndexBuilder::new(Arc::new(AxisEmbedder));
        let index = builder
            .build(chunks(&["alpha one", "alpha two", "alpha three", "alpha four", "alpha five"]))
            .await
            .unwrap();

        let results = index.search("alpha", 4).await.unwrap();
        assert_eq!(results.len(), 4);
    }

    #[tokio::test]
    async fn test_equal_scores_keep_insertion_order() {
        let builder = EphemeralIndexBuilder::new(Arc::new(AxisEmbedder));
        let index = builder
            .build(chunks(&["alpha first", "alpha second", "alpha third"]))
            .await
            .unwrap();

        let results = index.search("alpha", 3).await.unwrap();
        let order: Vec<usize> = results.iter().map(|r| r.chunk.order).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_build_failure_propagates() {
        let builder = EphemeralIndexBuilder::new(Arc::new(FailingEmbedder));
        let err = builder.build(chunks(&["anything"])).await.unwrap_err();
        assert!(matches!(err, SvarError::Embedding(_)));
    }

    #[tokio::test]
    async fn test_empty_index_search() {
        let builder = EphemeralIndexBuilder::new(Arc::new(AxisEmbedder));
        let index = builder.build(Vec::new()).await.unwrap();
        assert!(index.is_empty());

        let results = index.search("anything", 4).await.unwrap();
        assert!(results.is_empty());
    }
}
