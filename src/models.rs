use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One turn of the conversation as submitted by the client. Roles are
/// "user" and "assistant"; anything else is treated as "user".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateScriptRequest {
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
pub struct RenderVideoRequest {
    #[serde(rename = "manimCode", default)]
    pub manim_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RenderVideoResponse {
    #[serde(rename = "videoUrl")]
    pub video_url: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateScriptResponse {
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Events pushed over the chat response stream, one JSON object per line.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatStreamEvent {
    Text { content: String },
    ToolCall { name: String, args: Value },
    ToolResult { name: String, result: Value },
    Error { message: String },
    Done { finished_at: chrono::DateTime<chrono::Utc> },
}

impl ChatStreamEvent {
    /// Serialized form with the trailing newline the NDJSON stream expects.
    pub fn to_ndjson(&self) -> String {
        let mut line = serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string());
        line.push('\n');
        line
    }
}
