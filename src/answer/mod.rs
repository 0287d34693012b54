//! Answer composition.
//!
//! Stuffs the retrieved chunks into a restricted-domain system prompt,
//! appends the conversation, and runs one completion.

use crate::completion::{ChatMessage, CompletionClient};
use crate::config::Prompts;
use crate::error::Result;
use crate::index::ScoredChunk;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Composes the final answer from retrieved context.
pub struct AnswerComposer {
    completion: Arc<dyn CompletionClient>,
    prompts: Prompts,
    domain: String,
}

impl AnswerComposer {
    /// Create a composer restricted to the given domain.
    pub fn new(completion: Arc<dyn CompletionClient>, prompts: Prompts, domain: &str) -> Self {
        Self {
            completion,
            prompts,
            domain: domain.to_string(),
        }
    }

    /// Build the stuffed prompt and return the model's completion verbatim.
    ///
    /// The system prompt instructs the model to answer only from the
    /// supplied context and to use fixed refusal phrases otherwise; whether
    /// the model actually obeys is not enforced here.
    #[instrument(skip(self, history, chunks), fields(context_chunks = chunks.len()))]
    pub async fn compose(
        &self,
        history: &[ChatMessage],
        input: &str,
        chunks: &[ScoredChunk],
    ) -> Result<String> {
        let context = format_context(chunks);

        let mut vars = HashMap::new();
        vars.insert("domain".to_string(), self.domain.clone());
        vars.insert("context".to_string(), context);

        let system = self
            .prompts
            .render_with_custom(&self.prompts.answer.system, &vars);

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(system));
        messages.extend(history.iter().cloned());
        messages.push(ChatMessage::user(input));

        debug!("Requesting completion over {} context chunks", chunks.len());
        self.completion.complete(&messages).await
    }
}

/// Join retrieved chunk texts into the context block stuffed into the
/// system prompt.
fn format_context(chunks: &[ScoredChunk]) -> String {
    chunks
        .iter()
        .map(|c| c.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::Chunk;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Completion client that records the prompt and returns a canned reply.
    struct Recorder {
        reply: String,
        seen: Mutex<Vec<ChatMessage>>,
    }

    impl Recorder {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CompletionClient for Recorder {
        async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
            *self.seen.lock().unwrap() = messages.to_vec();
            Ok(self.reply.clone())
        }
    }

    fn scored(text: &str, order: usize) -> ScoredChunk {
        ScoredChunk {
            chunk: Chunk::new(text, "q", order),
            score: 0.9,
        }
    }

    #[tokio::test]
    async fn test_refusal_passthrough_with_no_context() {
        let completion = Arc::new(Recorder::new("I don't have that information."));
        let composer =
            AnswerComposer::new(Arc::clone(&completion) as _, Prompts::default(), "Strapi");

        let answer = composer
            .compose(&[], "What is the capital of France?", &[])
            .await
            .unwrap();

        // The model's text is returned verbatim, no post-processing.
        assert_eq!(answer, "I don't have that information.");
    }

    #[tokio::test]
    async fn test_system_prompt_carries_context_and_refusals() {
        let completion = Arc::new(Recorder::new("ok"));
        let composer =
            AnswerComposer::new(Arc::clone(&completion) as _, Prompts::default(), "Strapi");

        let chunks = vec![
            scored("Strapi is a headless CMS.", 0),
            scored("Plugins extend the admin panel.", 1),
        ];
        composer
            .compose(&[], "What is Strapi?", &chunks)
            .await
            .unwrap();

        let seen = completion.seen.lock().unwrap();
        let system = &seen[0];
        assert_eq!(system.role, crate::completion::Role::System);
        assert!(system.content.contains("Strapi is a headless CMS."));
        assert!(system.content.contains("Plugins extend the admin panel."));
        assert!(system.content.contains("I don't have that information."));
        assert!(system
            .content
            .contains("I can only help with Strapi related questions."));
    }

    #[tokio::test]
    async fn test_history_precedes_final_user_turn() {
        let completion = Arc::new(Recorder::new("ok"));
        let composer =
            AnswerComposer::new(Arc::clone(&completion) as _, Prompts::default(), "Strapi");

        let history = vec![
            ChatMessage::user("What is Strapi?"),
            ChatMessage::assistant("A headless CMS."),
        ];
        composer
            .compose(&history, "How do I install it?", &[])
            .await
            .unwrap();

        let seen = completion.seen.lock().unwrap();
        assert_eq!(seen.len(), 4);
        assert_eq!(seen[1], ChatMessage::user("What is Strapi?"));
        assert_eq!(seen[2], ChatMessage::assistant("A headless CMS."));
        assert_eq!(seen[3], ChatMessage::user("How do I install it?"));
    }
}
