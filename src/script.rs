// Cleanup and validation for model-generated Manim scripts. The model is
// instructed not to emit markdown, but it often does anyway, so everything
// that reaches the renderer goes through clean_script + find_missing_marker.

use lazy_static::lazy_static;
use regex::Regex;

pub const MANIM_IMPORT: &str = "from manim import *";
pub const SCENE_CLASS: &str = "class ConceptScene(Scene)";
pub const CONSTRUCT_METHOD: &str = "def construct(self)";

lazy_static! {
    static ref PYTHON_FENCE: Regex = Regex::new(r"```python\n?").unwrap();
    static ref BARE_FENCE: Regex = Regex::new(r"```\n?").unwrap();
    static ref FENCE_LINE: Regex = Regex::new(r"(?m)^\s*```.*$").unwrap();
}

/// A structural element every renderable script must contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptMarker {
    Imports,
    SceneClass,
    ConstructMethod,
}

impl ScriptMarker {
    /// Message used when rejecting code handed to the render endpoint.
    pub fn rejection_message(&self) -> &'static str {
        match self {
            ScriptMarker::Imports => "Invalid Manim code: missing required imports",
            ScriptMarker::SceneClass => "Invalid Manim code: missing ConceptScene class",
            ScriptMarker::ConstructMethod => "Invalid Manim code: missing construct method",
        }
    }

    /// Message used when freshly generated output fails validation.
    pub fn generation_message(&self) -> &'static str {
        match self {
            ScriptMarker::Imports => "Generated script missing manim imports",
            ScriptMarker::SceneClass => "Generated script missing Scene class",
            ScriptMarker::ConstructMethod => "Generated script missing construct method",
        }
    }
}

/// Strip markdown fences, anchor the text at the Manim import, and trim.
/// Idempotent: cleaning already-clean text returns it unchanged.
pub fn clean_script(raw: &str) -> String {
    let code = PYTHON_FENCE.replace_all(raw, "");
    let code = BARE_FENCE.replace_all(&code, "");
    let code = FENCE_LINE.replace_all(&code, "");
    let mut code = code.trim().to_string();

    // Models sometimes prepend prose before the actual script. Everything up
    // to the first import is noise.
    if !code.starts_with(MANIM_IMPORT) {
        if let Some(index) = code.find(MANIM_IMPORT) {
            code = code[index..].to_string();
        }
    }

    code.trim().to_string()
}

/// Returns the first required marker the script lacks, or None if all three
/// are present. Checked in the order imports, scene class, construct method.
pub fn find_missing_marker(code: &str) -> Option<ScriptMarker> {
    if !code.contains(MANIM_IMPORT) {
        Some(ScriptMarker::Imports)
    } else if !code.contains(SCENE_CLASS) {
        Some(ScriptMarker::SceneClass)
    } else if !code.contains(CONSTRUCT_METHOD) {
        Some(ScriptMarker::ConstructMethod)
    } else {
        None
    }
}

/// Reassemble text that arrived as data-stream protocol lines (`0:{json}`
/// per chunk). Plain text passes through untouched; malformed stream lines
/// are skipped.
pub fn reassemble_data_stream(raw: &str) -> String {
    if !raw.lines().any(|line| line.starts_with("0:")) {
        return raw.to_string();
    }

    let mut content = String::new();
    for line in raw.lines() {
        if let Some(payload) = line.strip_prefix("0:") {
            if let Ok(value) = serde_json::from_str::<serde_json::Value>(payload) {
                if let Some(chunk) = value.get("content").and_then(|c| c.as_str()) {
                    content.push_str(chunk);
                }
            }
        }
    }
    content
}
