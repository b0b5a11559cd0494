// GET /api/status - health check reporting which upstreams are configured.

use crate::AppState;
use axum::{extract::Extension, response::Json, routing::get, Router};
use serde_json::{json, Value};
use std::sync::Arc;

pub fn status_routes() -> Router {
    Router::new().route("/api/status", get(api_status))
}

async fn api_status(Extension(state): Extension<Arc<AppState>>) -> Json<Value> {
    let gemini_status = if state.gemini.is_some() {
        "configured"
    } else {
        "not_configured"
    };
    let renderer_status = if state.renderer.is_some() {
        "configured"
    } else {
        "not_configured"
    };

    Json(json!({
        "status": "operational",
        "version": env!("CARGO_PKG_VERSION"),
        "time": chrono::Utc::now().to_rfc3339(),
        "services": {
            "gemini_ai": gemini_status,
            "renderer": renderer_status,
        },
        "endpoints": {
            "chat": "/api/chat",
            "generate_script": "/api/generate-script",
            "render_video": "/api/render-video",
            "status": "/api/status",
        }
    }))
}
