//! Execution context for handlers.
//!
//! Passed by value into every handler call. Provides:
//! - `logger` - leveled logging tagged with the function and invocation
//! - `emit` - publish an event through the bridge
//! - `state_get` - read a value from the bridge's state store
//!
//! # Example
//!
//! ```ignore
//! async fn greet(input: GreetInput, ctx: Context) -> HandlerResult {
//!     ctx.logger().info("Greeting...");
//!     let version = ctx.state_get("config", "worker_version").await?;
//!     ctx.emit("greeted", &serde_json::json!({ "extra": input.extra })).await?;
//!     Ok(serde_json::json!({ "version": version }))
//! }
//! ```

use std::sync::Arc;

use serde_json::Value;

use super::{Logger, StepConfig};
use crate::bridge::Bridge;
use crate::error::{Result, WorkerError};

/// Context passed to function and step handlers.
///
/// `Context` is `Clone` and can be moved into spawned tasks.
#[derive(Clone)]
pub struct Context {
    function_path: Arc<str>,
    invocation_id: Option<String>,
    logger: Logger,
    bridge: Option<Arc<dyn Bridge>>,
    step: Option<Arc<StepConfig>>,
}

impl Context {
    /// Create a context with no bridge (for testing).
    ///
    /// `emit` succeeds without sending; `state_get` returns `None`.
    pub fn detached(function_path: &str) -> Self {
        Self {
            function_path: Arc::from(function_path),
            invocation_id: None,
            logger: Logger::new(function_path, None),
            bridge: None,
            step: None,
        }
    }

    /// Create a context for a direct function call.
    pub fn for_invocation(
        function_path: &str,
        invocation_id: &str,
        bridge: Arc<dyn Bridge>,
    ) -> Self {
        Self {
            function_path: Arc::from(function_path),
            invocation_id: Some(invocation_id.to_string()),
            logger: Logger::new(function_path, Some(invocation_id)),
            bridge: Some(bridge),
            step: None,
        }
    }

    /// Create a context for an event delivered to a step.
    ///
    /// Emits are restricted to the topics the step declares.
    pub fn for_step(step: Arc<StepConfig>, bridge: Option<Arc<dyn Bridge>>) -> Self {
        Self {
            function_path: Arc::from(step.name.as_str()),
            invocation_id: None,
            logger: Logger::new(&step.name, None),
            bridge,
            step: Some(step),
        }
    }

    /// Function path or step name being executed.
    #[inline]
    pub fn function_path(&self) -> &str {
        &self.function_path
    }

    /// Invocation id (`None` for events).
    #[inline]
    pub fn invocation_id(&self) -> Option<&str> {
        self.invocation_id.as_deref()
    }

    #[inline]
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Publish `data` on `topic`.
    pub async fn emit<T: serde::Serialize>(&self, topic: &str, data: &T) -> Result<()> {
        if let Some(step) = &self.step {
            if !step.may_emit(topic) {
                return Err(WorkerError::UndeclaredEmit {
                    step: step.name.clone(),
                    topic: topic.to_string(),
                });
            }
        }

        let data = serde_json::to_value(data)?;
        match &self.bridge {
            Some(bridge) => bridge.emit(topic, data).await,
            None => {
                self.logger.debug(&format!("detached emit to {}", topic));
                Ok(())
            }
        }
    }

    /// Fetch `key` from the `scope` state store.
    ///
    /// Errors from the bridge (`State`, `StateTimeout`, `ConnectionClosed`)
    /// are returned as-is; the handler picks its own fallback policy.
    pub async fn state_get(&self, scope: &str, key: &str) -> Result<Option<Value>> {
        match &self.bridge {
            Some(bridge) => bridge.state_get(scope, key).await,
            None => Ok(None),
        }
    }
}
