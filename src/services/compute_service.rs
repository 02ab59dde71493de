//! `compute-service::compute`: double an optional counter.
//!
//! `n` is read leniently: anything other than a non-negative integer
//! (missing, `null`, text, negative, fractional, or a payload that is not a
//! mapping at all) counts as absent and the default is used.

use std::time::Duration;

use schemars::JsonSchema;
use serde_json::{json, Value};

use crate::handler::{Context, HandlerResult};
use crate::validation::{input_schema, FieldError, ValidationErrors};
use crate::WorkerBuilder;

pub const FUNCTION_PATH: &str = "compute-service::compute";
pub const SOURCE: &str = "compute-service";

/// Value used when the caller omits `n`.
pub const DEFAULT_N: u64 = 10;

pub const PROCESSING_DELAY: Duration = Duration::from_millis(100);

/// Advertised input shape.
#[derive(Debug, Clone, Default, PartialEq, JsonSchema)]
pub struct ComputeInput {
    #[schemars(title = "N")]
    pub n: Option<u64>,
}

impl ComputeInput {
    pub fn from_payload(payload: &Value) -> Self {
        Self {
            n: payload.get("n").and_then(Value::as_u64),
        }
    }
}

pub async fn compute(payload: Value, ctx: Context) -> HandlerResult {
    let n = ComputeInput::from_payload(&payload).n.unwrap_or(DEFAULT_N);

    let Some(result) = n.checked_mul(2) else {
        let errors = ValidationErrors::new(vec![FieldError::new("n", "too large to double")]);
        ctx.logger().warn(&format!("rejected payload: {}", errors));
        return Ok(errors.to_payload());
    };

    ctx.logger().debug(&format!("computing for n={}", n));
    tokio::time::sleep(PROCESSING_DELAY).await;

    Ok(json!({
        "result": result,
        "input": n,
        "source": SOURCE,
    }))
}

pub fn register(builder: WorkerBuilder) -> WorkerBuilder {
    builder.described_function(FUNCTION_PATH, input_schema::<ComputeInput>(), compute)
}
