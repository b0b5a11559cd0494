// Process configuration, read once at startup and shared through AppState.
// Request handlers never touch the environment directly.

use std::env;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash-exp";
const DEFAULT_RENDER_TIMEOUT_SECS: u64 = 300;

/// Settings for the external Manim rendering worker. Present only when both
/// the worker URL and the bearer token are configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendererConfig {
    pub url: String,
    pub auth_token: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub renderer: Option<RendererConfig>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_env_with(|key| env::var(key).ok())
    }

    fn from_env_with(mut get_var: impl FnMut(&str) -> Option<String>) -> Self {
        let renderer = match (
            get_var("MANIM_RENDERER_URL"),
            get_var("WORKER_AUTH_TOKEN"),
        ) {
            (Some(url), Some(token)) if !url.is_empty() && !token.is_empty() => {
                Some(RendererConfig {
                    url,
                    auth_token: token,
                    timeout_secs: parse_timeout_secs(get_var("RENDER_TIMEOUT_SECS").as_deref()),
                })
            }
            _ => None,
        };

        Self {
            bind_addr: get_var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            gemini_api_key: get_var("GEMINI_API_KEY").filter(|key| !key.is_empty()),
            gemini_model: get_var("GEMINI_MODEL")
                .filter(|model| !model.is_empty())
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            renderer,
        }
    }
}

fn parse_timeout_secs(raw: Option<&str>) -> u64 {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_RENDER_TIMEOUT_SECS)
}
