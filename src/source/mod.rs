//! FAQ source abstraction.
//!
//! Provides a trait-based interface for fetching the FAQ corpus from a
//! content API.

mod strapi;

pub use strapi::StrapiFaqSource;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A normalized FAQ record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FaqEntry {
    /// The question text.
    pub question: String,
    /// The answer text.
    pub answer: String,
}

impl FaqEntry {
    /// Create a new FAQ entry.
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }

    /// The text that gets chunked and embedded for this entry.
    pub fn indexable_text(&self) -> String {
        format!("{}\n{}", self.question, self.answer)
    }
}

/// Trait for FAQ source implementations.
#[async_trait]
pub trait FaqSource: Send + Sync {
    /// Fetch the full FAQ corpus from the upstream content API.
    ///
    /// Fails with [`crate::SvarError::Source`] on network failure, a non-2xx
    /// status, or a payload that doesn't match the expected shape.
    async fn fetch(&self) -> Result<Vec<FaqEntry>>;
}
