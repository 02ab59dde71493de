//! `HelloFromPython`: answers `hello` events.

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;

use crate::error::Result;
use crate::handler::{Context, StepConfig};
use crate::validation::input_schema;
use crate::WorkerBuilder;

pub const STEP_NAME: &str = "HelloFromPython";
pub const TRIGGER_TOPIC: &str = "hello";
pub const RESPONSE_TOPIC: &str = "hello.response.python";

/// Event data for `hello`. Advertised to the engine under the name `Input`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[schemars(rename = "Input")]
pub struct HelloInput {
    #[schemars(title = "Extra")]
    pub extra: String,
}

/// Registration record for the step.
pub fn config() -> StepConfig {
    StepConfig::new(STEP_NAME)
        .description("Say hello from Python!")
        .event_trigger(TRIGGER_TOPIC, input_schema::<HelloInput>())
        .emits(RESPONSE_TOPIC)
        .flow("hello")
}

pub async fn handle(_input: HelloInput, ctx: Context) -> Result<()> {
    ctx.logger().info("Hello from Python!");
    ctx.emit(RESPONSE_TOPIC, &json!({ "extra": "py" })).await
}

pub fn register(builder: WorkerBuilder) -> WorkerBuilder {
    builder.step(config(), handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{EmittedEvent, MemoryBridge};
    use crate::handler::FunctionRegistry;
    use std::sync::Arc;

    fn registry() -> FunctionRegistry {
        let mut registry = FunctionRegistry::new();
        registry.register_step(config(), handle);
        registry
    }

    #[test]
    fn test_config_wire_shape() {
        let value = serde_json::to_value(config()).unwrap();
        assert_eq!(value["name"], "HelloFromPython");
        assert_eq!(value["description"], "Say hello from Python!");
        assert_eq!(value["triggers"][0]["type"], "event");
        assert_eq!(value["triggers"][0]["topic"], "hello");
        assert_eq!(value["emits"], json!(["hello.response.python"]));
        assert_eq!(value["flows"], json!(["hello"]));
        assert_eq!(value["virtualEmits"], json!([]));
        assert_eq!(value["virtualSubscribes"], json!([]));
    }

    #[test]
    fn test_trigger_input_schema() {
        let value = serde_json::to_value(config()).unwrap();
        let input = &value["triggers"][0]["input"];

        assert_eq!(input["title"], "Input");
        assert_eq!(input["type"], "object");
        assert_eq!(input["required"], json!(["extra"]));
        assert_eq!(
            input["properties"]["extra"],
            json!({ "title": "Extra", "type": "string" })
        );
    }

    #[test]
    fn test_subscribes_to_hello_only() {
        let config = config();
        assert_eq!(config.subscribed_topics().collect::<Vec<_>>(), vec!["hello"]);
        assert_eq!(config.function_id(), "steps::HelloFromPython");
    }

    #[tokio::test]
    async fn test_emits_response() {
        let bridge = Arc::new(MemoryBridge::new());
        registry()
            .run_step(STEP_NAME, json!({ "extra": "hi" }), Some(bridge.clone()))
            .await
            .unwrap();

        assert_eq!(
            bridge.emitted(),
            vec![EmittedEvent {
                topic: "hello.response.python".to_string(),
                data: json!({ "extra": "py" }),
            }]
        );
    }

    #[tokio::test]
    async fn test_invalid_event_emits_nothing() {
        let bridge = Arc::new(MemoryBridge::new());
        for data in [json!({ "extra": 3 }), json!({}), json!(null)] {
            registry()
                .run_step(STEP_NAME, data, Some(bridge.clone()))
                .await
                .unwrap();
        }
        assert!(bridge.emitted().is_empty());
    }
}
