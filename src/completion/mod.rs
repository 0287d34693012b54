//! Chat completion abstraction.
//!
//! Defines the role-tagged message representation used throughout the
//! pipeline and a trait seam over the completion model so stages can be
//! exercised against mocks.

mod openai;

pub use openai::{create_openai_client, OpenAiCompletionClient};

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Dialogue role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single dialogue turn.
///
/// Doubles as the wire representation of conversation history entries and
/// the message type handed to the completion client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Trait for chat completion implementations.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Run one completion over the given messages and return the model's
    /// text verbatim.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_format() {
        let msg: ChatMessage = serde_json::from_str(r#"{"role":"user","content":"hi"}"#).unwrap();
        assert_eq!(msg, ChatMessage::user("hi"));

        let out = serde_json::to_string(&ChatMessage::assistant("hello")).unwrap();
        assert_eq!(out, r#"{"role":"assistant","content":"hello"}"#);
    }
}
