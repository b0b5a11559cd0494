// POST /api/render-video - validate Manim code and proxy it to the external
// rendering worker. Validation failures never reach the worker.

use crate::models::{ErrorResponse, RenderVideoRequest, RenderVideoResponse};
use crate::script;
use crate::AppState;
use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::post,
    Router,
};
use std::sync::Arc;

pub fn render_routes() -> Router {
    Router::new().route("/api/render-video", post(render_video))
}

async fn render_video(
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<RenderVideoRequest>,
) -> impl IntoResponse {
    let code = match request.manim_code.as_deref() {
        Some(code) if !code.is_empty() => code,
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "No manimCode provided".to_string(),
                }),
            )
                .into_response();
        }
    };

    if let Some(marker) = script::find_missing_marker(code) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: marker.rejection_message().to_string(),
            }),
        )
            .into_response();
    }

    let renderer = match state.renderer.as_ref() {
        Some(renderer) => renderer,
        None => {
            tracing::error!("render requested but no rendering service is configured");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Rendering service is not configured".to_string(),
                }),
            )
                .into_response();
        }
    };

    match renderer.render(code).await {
        Ok(video_url) => Json(RenderVideoResponse { video_url }).into_response(),
        Err(e) => (
            e.status_code(),
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}
