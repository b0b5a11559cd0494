// A capability is a model-invokable function: a declaration the model sees
// plus a handler the agent loop runs. The loop stays agnostic to what the
// capabilities actually do.

use crate::gemini_client::FunctionDeclaration;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

#[async_trait]
pub trait Capability: Send + Sync {
    fn declaration(&self) -> FunctionDeclaration;

    /// Execute the capability. The returned value is reported back to the
    /// model verbatim, so failures are encoded as structured objects rather
    /// than errors; a capability never aborts the conversation.
    async fn invoke(&self, args: &HashMap<String, Value>) -> Value;
}

#[derive(Default)]
pub struct CapabilitySet {
    entries: Vec<(String, Arc<dyn Capability>)>,
}

impl CapabilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, capability: Arc<dyn Capability>) -> Self {
        let name = capability.declaration().name;
        self.entries.push((name, capability));
        self
    }

    pub fn declarations(&self) -> Vec<FunctionDeclaration> {
        self.entries
            .iter()
            .map(|(_, capability)| capability.declaration())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub async fn dispatch(&self, name: &str, args: &HashMap<String, Value>) -> Value {
        match self.entries.iter().find(|(entry_name, _)| entry_name == name) {
            Some((_, capability)) => capability.invoke(args).await,
            None => {
                tracing::warn!(capability = %name, "model called an undeclared capability");
                json!({
                    "success": false,
                    "error": format!("Unknown capability '{}'", name),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini_client::Parameters;

    struct Echo;

    #[async_trait]
    impl Capability for Echo {
        fn declaration(&self) -> FunctionDeclaration {
            FunctionDeclaration {
                name: "echo".to_string(),
                description: "Echoes its arguments".to_string(),
                parameters: Parameters {
                    param_type: "object".to_string(),
                    properties: HashMap::new(),
                    required: vec![],
                },
            }
        }

        async fn invoke(&self, args: &HashMap<String, Value>) -> Value {
            json!({ "success": true, "args": args })
        }
    }

    #[tokio::test]
    async fn dispatch_routes_to_registered_capability() {
        let set = CapabilitySet::new().register(Arc::new(Echo));
        let mut args = HashMap::new();
        args.insert("k".to_string(), json!("v"));

        let result = set.dispatch("echo", &args).await;
        assert_eq!(result["success"], true);
        assert_eq!(result["args"]["k"], "v");
    }

    #[tokio::test]
    async fn dispatch_reports_unknown_capability_as_failure() {
        let set = CapabilitySet::new().register(Arc::new(Echo));
        let result = set.dispatch("missing", &HashMap::new()).await;
        assert_eq!(result["success"], false);
        assert!(result["error"].as_str().unwrap().contains("missing"));
    }

    #[test]
    fn declarations_cover_all_registered_capabilities() {
        let set = CapabilitySet::new().register(Arc::new(Echo));
        let declarations = set.declarations();
        assert_eq!(declarations.len(), 1);
        assert_eq!(declarations[0].name, "echo");
        assert!(!set.is_empty());
    }
}
