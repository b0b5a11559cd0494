pub mod agent;
pub mod config;
pub mod gemini_client;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod pipeline;
pub mod renderer_client;
pub mod script;

use axum::{Extension, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Shared state for all request handlers. Clients are built once at startup;
/// a missing client disables the endpoints that need it without taking the
/// process down.
pub struct AppState {
    pub config: config::AppConfig,
    pub gemini: Option<gemini_client::GeminiClient>,
    pub renderer: Option<renderer_client::RendererClient>,
}

impl AppState {
    /// Build clients from configuration, warning about anything missing.
    pub fn from_config(config: config::AppConfig) -> Self {
        let gemini = match config.gemini_api_key.clone() {
            Some(api_key) => {
                tracing::info!(model = %config.gemini_model, "initializing Gemini client");
                Some(gemini_client::GeminiClient::new(
                    api_key,
                    config.gemini_model.clone(),
                ))
            }
            None => {
                tracing::warn!("GEMINI_API_KEY not set. Chat and script generation are disabled.");
                None
            }
        };

        let renderer = match config.renderer.as_ref() {
            Some(renderer_config) => {
                tracing::info!(url = %renderer_config.url, timeout_secs = renderer_config.timeout_secs, "initializing renderer client");
                Some(renderer_client::RendererClient::new(renderer_config))
            }
            None => {
                tracing::warn!(
                    "MANIM_RENDERER_URL / WORKER_AUTH_TOKEN not set. Video rendering is disabled."
                );
                None
            }
        };

        Self {
            config,
            gemini,
            renderer,
        }
    }
}

/// The full application router over shared state.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(handlers::chat::chat_routes())
        .merge(handlers::script::script_routes())
        .merge(handlers::render::render_routes())
        .merge(handlers::status::status_routes())
        .layer(axum::middleware::from_fn(
            middleware::logging::request_logging_middleware,
        ))
        .layer(CorsLayer::permissive())
        .layer(Extension(state))
}
