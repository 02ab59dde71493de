//! `hello-service.greet`: greeting that reports the deployed worker version.
//!
//! The version lives in the bridge state store under `config/worker_version`.
//! If it is missing or the read fails, the reply carries `"unknown"`.

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::handler::{Context, HandlerResult};
use crate::WorkerBuilder;

pub const FUNCTION_PATH: &str = "hello-service.greet";
pub const SOURCE: &str = "hello-service";

pub const VERSION_SCOPE: &str = "config";
pub const VERSION_KEY: &str = "worker_version";
pub const UNKNOWN_VERSION: &str = "unknown";

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GreetInput {
    #[schemars(title = "Extra")]
    pub extra: String,
}

pub async fn greet(input: GreetInput, ctx: Context) -> HandlerResult {
    ctx.logger().info("Greeting caller");
    let version = worker_version(&ctx).await;

    Ok(json!({
        "message": format!("Hello from {}! You said: {}", SOURCE, input.extra),
        "workerVersion": version,
        "source": SOURCE,
    }))
}

async fn worker_version(ctx: &Context) -> String {
    match ctx.state_get(VERSION_SCOPE, VERSION_KEY).await {
        Ok(Some(Value::String(version))) => version,
        Ok(Some(other)) => other.to_string(),
        Ok(None) => UNKNOWN_VERSION.to_string(),
        Err(e) => {
            ctx.logger()
                .warn(&format!("could not read worker version, using default: {}", e));
            UNKNOWN_VERSION.to_string()
        }
    }
}

pub fn register(builder: WorkerBuilder) -> WorkerBuilder {
    builder.function(FUNCTION_PATH, greet)
}
