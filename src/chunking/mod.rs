//! Corpus chunking for breaking FAQ entries into embeddable segments.

mod recursive;

pub use recursive::RecursiveSplitter;

use serde::{Deserialize, Serialize};

/// An overlapping text segment derived from a FAQ entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Text content of this chunk.
    pub text: String,
    /// Source question, kept as metadata for traceability.
    pub question: String,
    /// Insertion order across the whole corpus.
    pub order: usize,
}

impl Chunk {
    /// Create a new chunk.
    pub fn new(text: impl Into<String>, question: impl Into<String>, order: usize) -> Self {
        Self {
            text: text.into(),
            question: question.into(),
            order,
        }
    }
}
