// Iterative tool-calling loop over the Gemini API. The model decides when to
// invoke a capability; the loop executes it, feeds the result back, and
// forwards everything to the client as stream events.

pub mod capability;
pub mod generate_video;

use crate::gemini_client::{
    Content, FunctionCallingConfig, FunctionCallingMode, FunctionResponse, GeminiClient,
    GenerateContentRequest, GenerationConfig, Part, Tool, ToolConfig,
};
use crate::models::{ChatMessage, ChatStreamEvent};
use crate::pipeline::messages_to_contents;
use capability::CapabilitySet;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::mpsc::UnboundedSender;

/// Conversation instruction: call the tool immediately, never stall asking
/// for clarification.
pub const CHAT_SYSTEM_PROMPT: &str = r#"You are an AI assistant that creates educational animated videos. When a user mentions any educational concept or asks for a video/animation, IMMEDIATELY use the generate_video tool. Do NOT ask for clarification or more details - just proceed with creating the video based on what they mentioned.

Examples of when to use the generate_video tool:
- "create pythagoras theorem video" -> USE TOOL
- "animate calculus" -> USE TOOL
- "show me derivatives" -> USE TOOL
- "explain quadratic equations" -> USE TOOL
- "pythagorean theorem" -> USE TOOL

Be proactive and decisive - create videos immediately when requested."#;

/// Upper bound on model turns per request, tool round-trips included.
const MAX_STEPS: usize = 5;

pub struct ChatAgent {
    gemini: GeminiClient,
    capabilities: CapabilitySet,
}

impl ChatAgent {
    pub fn new(gemini: GeminiClient, capabilities: CapabilitySet) -> Self {
        Self {
            gemini,
            capabilities,
        }
    }

    /// Drive the conversation until the model stops calling capabilities or
    /// the step budget runs out. Events are pushed as they happen; a dropped
    /// receiver (client went away) ends the loop quietly.
    pub async fn run(&self, messages: &[ChatMessage], events: &UnboundedSender<ChatStreamEvent>) {
        let mut conversation = vec![Content::text("user", CHAT_SYSTEM_PROMPT)];
        conversation.extend(messages_to_contents(messages));

        for step in 1..=MAX_STEPS {
            let request = GenerateContentRequest {
                contents: conversation.clone(),
                tools: Some(vec![Tool {
                    function_declarations: self.capabilities.declarations(),
                }]),
                generation_config: Some(GenerationConfig::standard()),
                tool_config: Some(ToolConfig {
                    function_calling_config: FunctionCallingConfig {
                        mode: FunctionCallingMode::Auto,
                    },
                }),
            };

            let response = match self.gemini.generate_content(request).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!(error = %e, "chat model call failed");
                    let _ = events.send(ChatStreamEvent::Error {
                        message: e.to_string(),
                    });
                    return;
                }
            };

            let content = match response
                .candidates
                .into_iter()
                .next()
                .and_then(|candidate| candidate.content)
            {
                Some(content) => content,
                None => {
                    tracing::warn!(step, "chat model returned no content");
                    return;
                }
            };

            let mut tool_responses = Vec::new();
            for part in &content.parts {
                match part {
                    Part::Text { text } => {
                        if events
                            .send(ChatStreamEvent::Text {
                                content: text.clone(),
                            })
                            .is_err()
                        {
                            return;
                        }
                    }
                    Part::FunctionCall { function_call } => {
                        tracing::info!(capability = %function_call.name, step, "model invoked capability");
                        if events
                            .send(ChatStreamEvent::ToolCall {
                                name: function_call.name.clone(),
                                args: args_to_value(&function_call.args),
                            })
                            .is_err()
                        {
                            return;
                        }

                        let result = self
                            .capabilities
                            .dispatch(&function_call.name, &function_call.args)
                            .await;

                        if events
                            .send(ChatStreamEvent::ToolResult {
                                name: function_call.name.clone(),
                                result: result.clone(),
                            })
                            .is_err()
                        {
                            return;
                        }

                        let mut response_map = HashMap::new();
                        response_map.insert("result".to_string(), result);
                        tool_responses.push(Part::FunctionResponse {
                            function_response: FunctionResponse {
                                name: function_call.name.clone(),
                                response: response_map,
                            },
                        });
                    }
                    Part::FunctionResponse { .. } => {}
                }
            }

            conversation.push(content);

            if tool_responses.is_empty() {
                return;
            }
            conversation.push(Content {
                parts: tool_responses,
                role: Some("user".to_string()),
            });
        }

        tracing::warn!(max_steps = MAX_STEPS, "chat loop hit the step budget");
    }
}

fn args_to_value(args: &HashMap<String, Value>) -> Value {
    serde_json::to_value(args).unwrap_or(Value::Null)
}
