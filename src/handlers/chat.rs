// POST /api/chat - run the tool-calling agent over the submitted conversation
// and stream events back as NDJSON. The capability executes inside this
// request; nothing is queued or retried.

use crate::agent::{capability::CapabilitySet, generate_video::GenerateVideo, ChatAgent};
use crate::models::{ChatRequest, ChatStreamEvent, ErrorResponse};
use crate::AppState;
use axum::{
    body::Body,
    extract::Extension,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::post,
    Router,
};
use futures::StreamExt;
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::wrappers::UnboundedReceiverStream;

pub fn chat_routes() -> Router {
    Router::new().route("/api/chat", post(chat))
}

async fn chat(
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Response {
    let gemini = match state.gemini.as_ref() {
        Some(gemini) => gemini.clone(),
        None => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Gemini client is not configured".to_string(),
                }),
            )
                .into_response();
        }
    };

    let capabilities = CapabilitySet::new().register(Arc::new(GenerateVideo::new(state.clone())));
    let agent = ChatAgent::new(gemini, capabilities);

    let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<ChatStreamEvent>();
    tokio::spawn(async move {
        agent.run(&request.messages, &tx).await;
        let _ = tx.send(ChatStreamEvent::Done {
            finished_at: chrono::Utc::now(),
        });
    });

    let stream = UnboundedReceiverStream::new(rx)
        .map(|event| Ok::<String, Infallible>(event.to_ndjson()));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/x-ndjson")
        .body(Body::from_stream(stream))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
