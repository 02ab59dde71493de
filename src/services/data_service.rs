//! `data-service.transform`: echo a mapping back with its top-level keys.

use std::time::Duration;

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::handler::{Context, HandlerResult};
use crate::WorkerBuilder;

pub const FUNCTION_PATH: &str = "data-service.transform";
pub const SOURCE: &str = "data-service";

/// Simulated processing latency.
pub const PROCESSING_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct TransformInput {
    #[schemars(title = "Data")]
    pub data: Map<String, Value>,
}

pub async fn transform(input: TransformInput, ctx: Context) -> HandlerResult {
    ctx.logger().info("Processing data with data-service...");
    tokio::time::sleep(PROCESSING_DELAY).await;

    let keys: Vec<&String> = input.data.keys().collect();
    Ok(json!({
        "transformed": &input.data,
        "keys": keys,
        "source": SOURCE,
    }))
}

pub fn register(builder: WorkerBuilder) -> WorkerBuilder {
    builder.function(FUNCTION_PATH, transform)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::FunctionRegistry;
    use tokio::time::Instant;

    fn registry() -> FunctionRegistry {
        let mut registry = FunctionRegistry::new();
        registry.register_validated(FUNCTION_PATH, transform);
        registry
    }

    async fn call(payload: Value) -> Value {
        registry()
            .invoke(FUNCTION_PATH, payload, Context::detached(FUNCTION_PATH))
            .await
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_transform_scenario() {
        let out = call(json!({ "data": { "a": 1, "b": 2 } })).await;
        assert_eq!(
            out,
            json!({
                "transformed": { "a": 1, "b": 2 },
                "keys": ["a", "b"],
                "source": "data-service",
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_keys_keep_insertion_order() {
        let out = call(json!({ "data": { "zeta": 1, "alpha": 2, "mid": 3 } })).await;
        assert_eq!(out["keys"], json!(["zeta", "alpha", "mid"]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_mapping_is_valid() {
        let out = call(json!({ "data": {} })).await;
        assert_eq!(out["keys"], json!([]));
        assert_eq!(out["transformed"], json!({}));
        assert_eq!(out["source"], "data-service");
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_data_is_rejected() {
        let out = call(json!({})).await;
        assert_eq!(out["error"], "Invalid payload");
        assert_eq!(out["details"][0]["field"], "data");
        assert!(out.get("source").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wrong_type_is_rejected() {
        let out = call(json!({ "data": [1, 2] })).await;
        assert_eq!(out["error"], "Invalid payload");
        assert_eq!(out["details"][0]["field"], "data");
        let problem = out["details"][0]["problem"].as_str().unwrap();
        assert!(problem.contains("\"object\""), "{}", problem);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_mapping_payload_is_rejected() {
        for payload in [Value::Null, json!([]), json!("x")] {
            let out = call(payload).await;
            assert_eq!(out["details"][0]["field"], "$");
            let problem = out["details"][0]["problem"].as_str().unwrap();
            assert!(problem.contains("is not of type \"object\""), "{}", problem);
        }
    }

    #[test]
    fn test_request_format() {
        let schema = crate::validation::input_schema::<TransformInput>();
        assert_eq!(schema["required"], json!(["data"]));
        assert_eq!(schema["properties"]["data"]["type"], "object");
        assert_eq!(schema["properties"]["data"]["title"], "Data");
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_input_same_output() {
        let payload = json!({ "data": { "k": [1, 2, { "n": null }] } });
        assert_eq!(call(payload.clone()).await, call(payload).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_processing_delay() {
        let start = Instant::now();
        call(json!({ "data": { "a": 1 } })).await;
        assert!(start.elapsed() >= PROCESSING_DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejection_skips_delay() {
        let start = Instant::now();
        call(json!({})).await;
        assert!(start.elapsed() < PROCESSING_DELAY);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn arb_leaf() -> impl Strategy<Value = Value> {
            prop_oneof![
                Just(Value::Null),
                any::<bool>().prop_map(Value::from),
                any::<i64>().prop_map(Value::from),
                "[a-z0-9 ]{0,12}".prop_map(Value::from),
            ]
        }

        fn arb_value() -> impl Strategy<Value = Value> {
            arb_leaf().prop_recursive(3, 24, 4, |inner| {
                prop_oneof![
                    prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                    prop::collection::vec(("[a-z]{1,6}", inner), 0..4)
                        .prop_map(|pairs| Value::Object(pairs.into_iter().collect())),
                ]
            })
        }

        fn arb_mapping() -> impl Strategy<Value = Map<String, Value>> {
            prop::collection::vec(("[a-zA-Z_][a-zA-Z0-9_]{0,8}", arb_value()), 0..8)
                .prop_map(|pairs| pairs.into_iter().collect())
        }

        fn arb_non_mapping() -> impl Strategy<Value = Value> {
            prop_oneof![
                arb_leaf(),
                prop::collection::vec(arb_value(), 0..4).prop_map(Value::Array),
            ]
        }

        fn run(payload: Value) -> Value {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .start_paused(true)
                .build()
                .unwrap();
            rt.block_on(call(payload))
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            #[test]
            fn keys_and_transformed_match_input(data in arb_mapping()) {
                let out = run(json!({ "data": &data }));

                let keys: Vec<Value> = data.keys().cloned().map(Value::from).collect();
                prop_assert_eq!(&out["keys"], &Value::Array(keys));
                prop_assert_eq!(&out["transformed"], &Value::Object(data));
                prop_assert_eq!(&out["source"], "data-service");
            }

            #[test]
            fn transform_is_idempotent(data in arb_mapping()) {
                let payload = json!({ "data": data });
                prop_assert_eq!(run(payload.clone()), run(payload));
            }

            #[test]
            fn non_mapping_data_is_rejected(data in arb_non_mapping()) {
                let out = run(json!({ "data": data }));

                prop_assert_eq!(&out["error"], "Invalid payload");
                prop_assert!(out.get("source").is_none());
                let details = out["details"].as_array().unwrap();
                prop_assert!(details.iter().any(|d| d["field"] == "data"), "{}", out);
            }
        }
    }
}
