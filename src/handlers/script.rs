// POST /api/generate-script - ask the model for a Manim script and return the
// cleaned code. No structural validation happens here; callers that intend to
// render are expected to hit /api/render-video, which does.

use crate::models::{ErrorResponse, GenerateScriptRequest, GenerateScriptResponse};
use crate::pipeline;
use crate::AppState;
use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::post,
    Router,
};
use std::sync::Arc;

pub fn script_routes() -> Router {
    Router::new().route("/api/generate-script", post(generate_script))
}

async fn generate_script(
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<GenerateScriptRequest>,
) -> impl IntoResponse {
    let gemini = match state.gemini.as_ref() {
        Some(gemini) => gemini,
        None => {
            return script_failure("Gemini client is not configured");
        }
    };

    match pipeline::generate_clean_script(gemini, &request.messages).await {
        Ok(code) => Json(GenerateScriptResponse { code }).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "script generation failed");
            script_failure(&e.to_string())
        }
    }
}

fn script_failure(reason: &str) -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: format!("Failed to generate script: {}", reason),
        }),
    )
        .into_response()
}
