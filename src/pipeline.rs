// The sequential generation pipeline. Each stage takes typed input and
// returns a typed result; the HTTP handlers and the chat capability both run
// through these functions, so validation and cleanup happen exactly once per
// request no matter which door the script came in through.

use crate::gemini_client::{Content, GeminiClient, GeminiError};
use crate::models::ChatMessage;
use crate::script;
use thiserror::Error;

/// Instruction given to the model for every script generation call. The
/// quality guidance is advisory; only the structural rules are checked
/// afterwards.
pub const SCRIPT_SYSTEM_PROMPT: &str = r#"You are an expert Manim developer who creates engaging, educational mathematical animations.

CRITICAL REQUIREMENTS:
- Generate ONLY raw Python code, no markdown formatting, no explanations
- Do NOT use ```python or any code blocks
- Return pure Python code that can be directly executed

ANIMATION QUALITY STANDARDS:
- Use smooth, visually appealing animations with proper timing
- Include multiple animation techniques: Create(), Write(), Transform(), FadeIn(), FadeOut(), etc.
- Add appropriate wait times between animations (self.wait())
- Use colors, scaling, and positioning effectively
- Create educational content that builds concepts step by step

CODE STRUCTURE REQUIREMENTS:
- Start with: from manim import *
- Class name: ConceptScene(Scene)
- Method: construct(self)
- Use clear variable names and logical animation sequences
- Include at least 3-5 different animation techniques per video
- Total animation duration should be 8-15 seconds

VISUAL DESIGN:
- Use varied colors from Manim's color palette (BLUE, RED, GREEN, YELLOW, PURPLE, etc.)
- Employ different shapes, text, and mathematical objects
- Use positioning (UP, DOWN, LEFT, RIGHT, or specific coordinates)
- Create visual hierarchy with font sizes and object sizes

EDUCATIONAL VALUE:
- Build concepts progressively
- Use clear labeling and text explanations
- Make complex concepts accessible through animation

Generate animations that are both mathematically accurate and visually engaging."#;

#[derive(Debug, Error)]
pub enum ScriptGenError {
    #[error("{0}")]
    Model(#[from] GeminiError),
}

/// Convert client-submitted conversation turns into Gemini contents. Gemini
/// names the assistant role "model"; unknown roles are treated as user input.
pub fn messages_to_contents(messages: &[ChatMessage]) -> Vec<Content> {
    messages
        .iter()
        .map(|message| {
            let role = match message.role.as_str() {
                "assistant" | "model" => "model",
                _ => "user",
            };
            Content::text(role, message.content.clone())
        })
        .collect()
}

/// Stage one: ask the model for a script, reassemble it if it arrived as
/// data-stream lines, and strip the markdown the model was told not to emit.
/// The result is clean but NOT yet validated; callers decide how strictly to
/// check it and how to phrase rejections.
pub async fn generate_clean_script(
    gemini: &GeminiClient,
    messages: &[ChatMessage],
) -> Result<String, ScriptGenError> {
    let contents = messages_to_contents(messages);
    let raw = gemini.generate_text(SCRIPT_SYSTEM_PROMPT, contents).await?;

    let text = script::reassemble_data_stream(&raw);
    let code = script::clean_script(&text);

    tracing::debug!(code_len = code.len(), "script generated and cleaned");
    Ok(code)
}
