//! HTTP chat server.
//!
//! Exposes the retrieval-augmented pipeline as `POST /chat` for the browser
//! chat widget, plus a health probe. The handler is the single place where
//! pipeline errors become structured JSON error responses; nothing escapes
//! to crash the process.

use crate::cli::Output;
use crate::completion::ChatMessage;
use crate::config::Settings;
use crate::error::SvarError;
use crate::index::ScoredChunk;
use crate::pipeline::{ChatPipeline, ChatReply};
use axum::{
    extract::rejection::JsonRejection,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

/// Shared application state.
struct AppState {
    pipeline: ChatPipeline,
}

/// Run the HTTP chat server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    let pipeline = ChatPipeline::from_settings(&settings)?;
    let state = Arc::new(AppState { pipeline });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health))
        .route("/chat", post(chat))
        .layer(cors)
        .with_state(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Svar Chat Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Chat", "POST /chat");
    println!();
    Output::kv("FAQ source", &settings.faq_endpoint());
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Debug, Deserialize)]
struct ChatRequest {
    /// Full conversation so far; the server holds no session state.
    #[serde(rename = "chatHistory")]
    chat_history: Vec<ChatMessage>,
    input: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatResponse {
    answer: String,
    /// The standalone search query the retriever used, for diagnostics.
    rewritten_query: String,
    /// The chunks the answer was conditioned on, nearest first.
    context: Vec<ContextItem>,
}

#[derive(Debug, Serialize)]
struct ContextItem {
    text: String,
    question: String,
    score: f32,
}

impl From<ChatReply> for ChatResponse {
    fn from(reply: ChatReply) -> Self {
        Self {
            answer: reply.answer,
            rewritten_query: reply.rewritten_query,
            context: reply.context.into_iter().map(ContextItem::from).collect(),
        }
    }
}

impl From<ScoredChunk> for ContextItem {
    fn from(scored: ScoredChunk) -> Self {
        Self {
            text: scored.chunk.text,
            question: scored.chunk.question,
            score: scored.score,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(json) => json,
        Err(rejection) => {
            return error_response(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    match handle_chat(&state, request).await {
        Ok(reply) => Json(reply).into_response(),
        Err((status, message)) => error_response(status, message),
    }
}

/// The testable core of the chat handler: validate, run the pipeline,
/// translate errors into a status plus message.
async fn handle_chat(
    state: &AppState,
    request: ChatRequest,
) -> Result<ChatResponse, (StatusCode, String)> {
    if request.input.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "input must not be empty".to_string(),
        ));
    }

    state
        .pipeline
        .answer(&request.chat_history, &request.input)
        .await
        .map(ChatResponse::from)
        .map_err(|e| {
            error!("Chat pipeline failed: {}", e);
            let status = match e {
                SvarError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, e.to_string())
        })
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(ErrorResponse { error: message })).into_response()
}
