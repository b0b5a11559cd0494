// Client for the external Manim rendering worker. This service never renders
// anything itself; it forwards validated code with a bearer token and
// translates whatever comes back.

use crate::config::RendererConfig;
use axum::http::StatusCode;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Authentication failed with rendering service")]
    Unauthorized,
    #[error("Manim rendering failed. Please check your animation code.")]
    RenderFailed,
    #[error("Video rendering service failed with status {0}.")]
    UpstreamStatus(u16),
    #[error("Video rendering timed out. Your animation might be too complex or the service is overloaded.")]
    Timeout,
    #[error("Cannot connect to rendering service. Please try again later.")]
    Unreachable,
    #[error("Rendering service did not return a video URL")]
    MissingVideoUrl,
    #[error("An unexpected error occurred during video rendering: {0}")]
    Transport(String),
}

impl RenderError {
    /// Status code this error maps to on our own API surface.
    pub fn status_code(&self) -> StatusCode {
        match self {
            RenderError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            RenderError::Unreachable => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
struct RenderRequest<'a> {
    code: &'a str,
}

#[derive(Debug, Deserialize)]
struct RenderResponse {
    #[serde(rename = "videoUrl")]
    video_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RendererClient {
    client: Client,
    url: String,
    auth_token: String,
}

impl RendererClient {
    pub fn new(config: &RendererConfig) -> Self {
        // The whole render happens within this one request, so the client
        // timeout is the render budget.
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            url: config.url.clone(),
            auth_token: config.auth_token.clone(),
        }
    }

    /// Forward a validated script to the worker and return the video URL.
    pub async fn render(&self, code: &str) -> Result<String, RenderError> {
        tracing::info!(renderer = %self.url, code_len = code.len(), "dispatching code to renderer");

        let response = self
            .client
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", self.auth_token))
            .json(&RenderRequest { code })
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), body = %body, "renderer service failed");
            return Err(map_upstream_status(status.as_u16()));
        }

        let parsed: RenderResponse = response
            .json()
            .await
            .map_err(|e| RenderError::Transport(e.to_string()))?;

        match parsed.video_url {
            Some(url) if !url.is_empty() => {
                tracing::info!(video_url = %url, "video rendered successfully");
                Ok(url)
            }
            _ => Err(RenderError::MissingVideoUrl),
        }
    }
}

fn classify_transport_error(err: reqwest::Error) -> RenderError {
    if err.is_timeout() {
        RenderError::Timeout
    } else if err.is_connect() {
        RenderError::Unreachable
    } else {
        RenderError::Transport(err.to_string())
    }
}

/// Translate a non-2xx worker status into the error reported to our caller.
fn map_upstream_status(status: u16) -> RenderError {
    match status {
        401 => RenderError::Unauthorized,
        500 => RenderError::RenderFailed,
        other => RenderError::UpstreamStatus(other),
    }
}
