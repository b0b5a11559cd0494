// The one capability this service exposes to the model: turn an educational
// concept into a rendered animation. Runs the whole pipeline in-process —
// script generation, cleanup, validation, render dispatch — and reports a
// structured success or failure object for the model to narrate.

use crate::agent::capability::Capability;
use crate::gemini_client::{FunctionDeclaration, Parameters, PropertyDefinition};
use crate::pipeline;
use crate::models::ChatMessage;
use crate::script;
use crate::AppState;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

pub struct GenerateVideo {
    state: Arc<AppState>,
}

impl GenerateVideo {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Generate, validate, and render. Any failure short-circuits with the
    /// message that ends up in the failure object; no stage is retried.
    async fn run(&self, concept: &str, description: &str) -> Result<String, String> {
        let gemini = self
            .state
            .gemini
            .as_ref()
            .ok_or_else(|| "Gemini client is not configured".to_string())?;

        let prompt = format!(
            "Create an animated video explaining: {}. {}",
            concept, description
        );
        let code = pipeline::generate_clean_script(
            gemini,
            &[ChatMessage {
                role: "user".to_string(),
                content: prompt,
            }],
        )
        .await
        .map_err(|e| format!("Failed to generate Manim script: {}", e))?;

        if let Some(marker) = script::find_missing_marker(&code) {
            return Err(marker.generation_message().to_string());
        }

        tracing::info!(concept = %concept, "script validated, dispatching render");

        let renderer = self
            .state
            .renderer
            .as_ref()
            .ok_or_else(|| "Rendering service is not configured".to_string())?;

        renderer.render(&code).await.map_err(|e| e.to_string())
    }
}

#[async_trait]
impl Capability for GenerateVideo {
    fn declaration(&self) -> FunctionDeclaration {
        let mut properties = HashMap::new();
        properties.insert(
            "concept".to_string(),
            PropertyDefinition {
                prop_type: "string".to_string(),
                description:
                    "The mathematical or educational concept to animate and explain (extract from user message)"
                        .to_string(),
            },
        );
        properties.insert(
            "description".to_string(),
            PropertyDefinition {
                prop_type: "string".to_string(),
                description:
                    "A comprehensive description of how to animate and explain this concept visually, including a step-by-step visual breakdown"
                        .to_string(),
            },
        );

        FunctionDeclaration {
            name: "generate_video".to_string(),
            description:
                "IMMEDIATELY generate an educational animated video using Manim when the user requests any video, animation, or visual explanation. Do NOT ask for more details - just create the video based on the concept mentioned."
                    .to_string(),
            parameters: Parameters {
                param_type: "object".to_string(),
                properties,
                required: vec!["concept".to_string(), "description".to_string()],
            },
        }
    }

    async fn invoke(&self, args: &HashMap<String, Value>) -> Value {
        let concept = args
            .get("concept")
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or("");
        let description = args
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or("");

        if concept.is_empty() {
            return json!({
                "success": false,
                "error": "generate_video called without a concept",
                "concept": "",
                "message": "Failed to create video: no concept was provided",
            });
        }

        tracing::info!(concept = %concept, "generating video");

        match self.run(concept, description).await {
            Ok(video_url) => json!({
                "success": true,
                "videoUrl": video_url,
                "concept": concept,
                "message": format!("Successfully created an animated video explaining \"{}\"", concept),
            }),
            Err(error) => {
                tracing::error!(concept = %concept, error = %error, "video generation failed");
                json!({
                    "success": false,
                    "error": error,
                    "concept": concept,
                    "message": format!("Failed to create video for \"{}\": {}", concept, error),
                })
            }
        }
    }
}
