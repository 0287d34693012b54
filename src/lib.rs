//! Svar - Retrieval-Augmented FAQ Chatbot
//!
//! A backend that answers user questions from a Strapi-managed FAQ
//! collection. The name "Svar" comes from the Norwegian/Scandinavian word
//! for "answer."
//!
//! # Overview
//!
//! On every chat request, Svar:
//! - Fetches the FAQ collection from the configured Strapi content API
//! - Splits each entry into small overlapping chunks
//! - Builds a fresh in-memory embedding index over the chunks
//! - Rewrites the conversation into a standalone search query and retrieves
//!   the nearest chunks
//! - Stuffs the retrieved chunks into a restricted-domain prompt and asks a
//!   chat model for the answer
//!
//! The index is deliberately request-scoped: the corpus can never go stale
//! and concurrent requests share nothing mutable, at the cost of redoing
//! fetch and embedding work per call.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration and prompt templates
//! - `source` - FAQ source abstraction (Strapi content API)
//! - `chunking` - Recursive character splitting
//! - `embedding` - Embedding generation
//! - `index` - Request-scoped nearest-neighbor index
//! - `retrieval` - History-aware retrieval
//! - `answer` - Answer composition
//! - `completion` - Chat completion abstraction
//! - `pipeline` - End-to-end request pipeline
//!
//! # Example
//!
//! ```rust,no_run
//! use svar::config::Settings;
//! use svar::pipeline::ChatPipeline;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let pipeline = ChatPipeline::from_settings(&settings)?;
//!
//!     let reply = pipeline.answer(&[], "How do I create a collection type?").await?;
//!     println!("{}", reply.answer);
//!
//!     Ok(())
//! }
//! ```

pub mod answer;
pub mod chunking;
pub mod cli;
pub mod completion;
pub mod config;
pub mod embedding;
pub mod error;
pub mod index;
pub mod pipeline;
pub mod retrieval;
pub mod source;

pub use error::{Result, SvarError};
