//! Ask command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::ChatPipeline;
use anyhow::Result;

/// Run the ask command: one question, no conversation history.
pub async fn run_ask(question: &str, settings: Settings) -> Result<()> {
    let pipeline = ChatPipeline::from_settings(&settings)?;

    match pipeline.answer(&[], question).await {
        Ok(reply) => {
            println!("\n{}\n", reply.answer);

            if !reply.context.is_empty() {
                Output::header("Context");
                for scored in &reply.context {
                    Output::context_chunk(&scored.chunk.question, scored.score, &scored.chunk.text);
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
