//! Event step descriptions.
//!
//! A step is a handler triggered by events on a topic instead of direct
//! calls. Each event trigger becomes a `subscribe` trigger on the engine,
//! and the whole [`StepConfig`] travels as the step function's metadata.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What causes a step to run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Trigger {
    /// An event published on `topic`. `input` is the JSON Schema of the event data.
    Event {
        topic: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        input: Option<Value>,
    },
}

/// Registration record for an event step.
///
/// # Example
///
/// ```
/// use quickstart_worker::handler::StepConfig;
/// use quickstart_worker::validation::input_schema;
///
/// #[derive(serde::Deserialize, schemars::JsonSchema)]
/// struct Input { extra: String }
///
/// let config = StepConfig::new("Greeter")
///     .description("Say hello")
///     .event_trigger("hello", input_schema::<Input>())
///     .emits("hello.response")
///     .flow("hello");
///
/// assert_eq!(config.subscribed_topics().collect::<Vec<_>>(), vec!["hello"]);
/// assert!(config.may_emit("hello.response"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub triggers: Vec<Trigger>,
    #[serde(default)]
    pub emits: Vec<String>,
    #[serde(default)]
    pub flows: Vec<String>,
    #[serde(default)]
    pub virtual_emits: Vec<String>,
    #[serde(default)]
    pub virtual_subscribes: Vec<String>,
}

impl StepConfig {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            triggers: Vec::new(),
            emits: Vec::new(),
            flows: Vec::new(),
            virtual_emits: Vec::new(),
            virtual_subscribes: Vec::new(),
        }
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Subscribe to `topic`, advertising the input schema.
    pub fn event_trigger(mut self, topic: &str, input: Value) -> Self {
        self.triggers.push(Trigger::Event {
            topic: topic.to_string(),
            input: Some(input),
        });
        self
    }

    /// Declare a topic this step emits.
    pub fn emits(mut self, topic: &str) -> Self {
        self.emits.push(topic.to_string());
        self
    }

    /// Add the step to a named flow (used by the bridge for grouping).
    pub fn flow(mut self, flow: &str) -> Self {
        self.flows.push(flow.to_string());
        self
    }

    /// Function id the step is registered under.
    pub fn function_id(&self) -> String {
        format!("steps::{}", self.name)
    }

    /// Topics of all event triggers.
    pub fn subscribed_topics(&self) -> impl Iterator<Item = &str> {
        self.triggers.iter().map(|t| match t {
            Trigger::Event { topic, .. } => topic.as_str(),
        })
    }

    /// Whether the step declared `topic` in `emits` or `virtualEmits`.
    pub fn may_emit(&self, topic: &str) -> bool {
        self.emits.iter().chain(&self.virtual_emits).any(|t| t == topic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::input_schema;
    use serde_json::json;

    #[derive(serde::Deserialize, schemars::JsonSchema)]
    #[allow(dead_code)]
    struct Input {
        extra: String,
    }

    #[test]
    fn test_serializes_camel_case() {
        let config = StepConfig::new("HelloFromPython")
            .description("Say hello from Python!")
            .event_trigger("hello", input_schema::<Input>())
            .emits("hello.response.python")
            .flow("hello");

        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["name"], "HelloFromPython");
        assert_eq!(value["triggers"][0]["type"], "event");
        assert_eq!(value["triggers"][0]["topic"], "hello");
        assert_eq!(
            value["triggers"][0]["input"]["properties"]["extra"],
            json!({ "type": "string" })
        );
        assert_eq!(value["emits"], json!(["hello.response.python"]));
        assert_eq!(value["virtualEmits"], json!([]));
        assert_eq!(value["virtualSubscribes"], json!([]));
        assert_eq!(config.function_id(), "steps::HelloFromPython");
    }

    #[test]
    fn test_deserialize_minimal() {
        let config: StepConfig = serde_json::from_value(json!({
            "name": "S",
            "triggers": [{ "type": "event", "topic": "t" }]
        }))
        .unwrap();

        assert_eq!(config.subscribed_topics().collect::<Vec<_>>(), vec!["t"]);
        assert!(config.emits.is_empty());
        assert!(config.description.is_none());
    }

    #[test]
    fn test_may_emit_includes_virtual() {
        let mut config = StepConfig::new("S").emits("real");
        config.virtual_emits.push("virtual".to_string());

        assert!(config.may_emit("real"));
        assert!(config.may_emit("virtual"));
        assert!(!config.may_emit("other"));
    }
}
