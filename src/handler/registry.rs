//! Function and step registry.
//!
//! Maps function paths to handlers and keeps the list of event steps.
//! Validation happens here, before user code runs: a payload that fails its
//! schema never reaches the handler and is answered with the rejection
//! payload instead. The worker registers every entry with the engine and
//! routes invocations back through [`FunctionRegistry::invoke`] and
//! [`FunctionRegistry::run_step`].
//!
//! # Example
//!
//! ```ignore
//! use quickstart_worker::handler::FunctionRegistry;
//!
//! let mut registry = FunctionRegistry::new();
//!
//! registry.register_validated("data-service.transform", |input: TransformInput, ctx| async move {
//!     Ok(serde_json::json!({ "keys": input.data.keys().collect::<Vec<_>>() }))
//! });
//!
//! registry.register_step(hello_config(), |input: HelloInput, ctx| async move {
//!     ctx.emit("hello.response", &input).await
//! });
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use super::{Context, StepConfig};
use crate::bridge::Bridge;
use crate::error::{Result, WorkerError};
use crate::validation::{input_schema, validate, Validate};

/// Result type for function handlers: the output payload.
pub type HandlerResult = Result<Value>;

/// Boxed future for handler results.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A callable function.
pub trait Handler: Send + Sync + 'static {
    /// Handle a call with its raw payload.
    fn call(&self, payload: Value, ctx: Context) -> BoxFuture<'static, HandlerResult>;

    /// JSON Schema advertised to the engine as the function's input.
    fn request_format(&self) -> Option<Value> {
        None
    }
}

/// A callable event step.
pub trait StepHandler: Send + Sync + 'static {
    /// Handle an event with its raw data.
    fn call(&self, payload: Value, ctx: Context) -> BoxFuture<'static, Result<()>>;
}

/// Validates the payload against `T`'s schema before calling the handler.
///
/// Rejections become the `{"error": "Invalid payload", "details": [...]}`
/// output and the handler is not called.
pub struct ValidatedHandler<F, T, Fut>
where
    F: Fn(T, Context) -> Fut + Send + Sync + 'static,
    T: Validate,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    handler: F,
    _phantom: PhantomData<fn(T) -> Fut>,
}

impl<F, T, Fut> ValidatedHandler<F, T, Fut>
where
    F: Fn(T, Context) -> Fut + Send + Sync + 'static,
    T: Validate,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    pub fn new(handler: F) -> Self {
        Self {
            handler,
            _phantom: PhantomData,
        }
    }
}

impl<F, T, Fut> Handler for ValidatedHandler<F, T, Fut>
where
    F: Fn(T, Context) -> Fut + Send + Sync + 'static,
    T: Validate,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, payload: Value, ctx: Context) -> BoxFuture<'static, HandlerResult> {
        match validate::<T>(&payload) {
            Ok(input) => Box::pin((self.handler)(input, ctx)),
            Err(errors) => {
                ctx.logger().warn(&format!("rejected payload: {}", errors));
                let rejection = errors.to_payload();
                Box::pin(async move { Ok(rejection) })
            }
        }
    }

    fn request_format(&self) -> Option<Value> {
        Some(input_schema::<T>())
    }
}

/// Passes the raw payload straight to the handler.
pub struct RawHandler<F, Fut>
where
    F: Fn(Value, Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    handler: F,
    request_format: Option<Value>,
}

impl<F, Fut> RawHandler<F, Fut>
where
    F: Fn(Value, Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    pub fn new(handler: F) -> Self {
        Self {
            handler,
            request_format: None,
        }
    }

    /// Advertise `schema` as the input without enforcing it.
    pub fn with_request_format(mut self, schema: Value) -> Self {
        self.request_format = Some(schema);
        self
    }
}

impl<F, Fut> Handler for RawHandler<F, Fut>
where
    F: Fn(Value, Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, payload: Value, ctx: Context) -> BoxFuture<'static, HandlerResult> {
        Box::pin((self.handler)(payload, ctx))
    }

    fn request_format(&self) -> Option<Value> {
        self.request_format.clone()
    }
}

/// Validates event data before calling a step.
///
/// Events have no caller to answer, so a rejection is logged and the event
/// is dropped.
pub struct ValidatedStep<F, T, Fut>
where
    F: Fn(T, Context) -> Fut + Send + Sync + 'static,
    T: Validate,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    handler: F,
    _phantom: PhantomData<fn(T) -> Fut>,
}

impl<F, T, Fut> StepHandler for ValidatedStep<F, T, Fut>
where
    F: Fn(T, Context) -> Fut + Send + Sync + 'static,
    T: Validate,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    fn call(&self, payload: Value, ctx: Context) -> BoxFuture<'static, Result<()>> {
        match validate::<T>(&payload) {
            Ok(input) => Box::pin((self.handler)(input, ctx)),
            Err(errors) => {
                ctx.logger().warn(&format!("dropped event with invalid data: {}", errors));
                Box::pin(async { Ok(()) })
            }
        }
    }
}

impl<F, T, Fut> ValidatedStep<F, T, Fut>
where
    F: Fn(T, Context) -> Fut + Send + Sync + 'static,
    T: Validate,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    pub fn new(handler: F) -> Self {
        Self {
            handler,
            _phantom: PhantomData,
        }
    }
}

struct StepEntry {
    config: Arc<StepConfig>,
    handler: Box<dyn StepHandler>,
}

/// Registry of functions (by path) and event steps.
#[derive(Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, Box<dyn Handler>>,
    /// Function paths in registration order.
    order: Vec<String>,
    steps: Vec<StepEntry>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler that receives schema-validated input.
    pub fn register_validated<F, T, Fut>(&mut self, path: &str, handler: F)
    where
        F: Fn(T, Context) -> Fut + Send + Sync + 'static,
        T: Validate,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.insert(path, Box::new(ValidatedHandler::new(handler)));
    }

    /// Register a handler over the untyped payload.
    pub fn register_raw<F, Fut>(&mut self, path: &str, handler: F)
    where
        F: Fn(Value, Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.insert(path, Box::new(RawHandler::new(handler)));
    }

    /// Register a prepared handler.
    pub fn register_handler<H: Handler>(&mut self, path: &str, handler: H) {
        self.insert(path, Box::new(handler));
    }

    /// Register an event step.
    ///
    /// Step names are unique; registering a name again replaces the step.
    pub fn register_step<F, T, Fut>(&mut self, config: StepConfig, handler: F)
    where
        F: Fn(T, Context) -> Fut + Send + Sync + 'static,
        T: Validate,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let entry = StepEntry {
            config: Arc::new(config),
            handler: Box::new(ValidatedStep::new(handler)),
        };

        match self.steps.iter_mut().find(|s| s.config.name == entry.config.name) {
            Some(existing) => {
                tracing::warn!(step = %entry.config.name, "replacing previously registered step");
                *existing = entry;
            }
            None => self.steps.push(entry),
        }
    }

    /// One handler per path: registering a path again replaces the handler.
    fn insert(&mut self, path: &str, handler: Box<dyn Handler>) {
        if self.functions.insert(path.to_string(), handler).is_some() {
            tracing::warn!(function = path, "replacing previously registered handler");
        } else {
            self.order.push(path.to_string());
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.functions.contains_key(path)
    }

    /// Registered function paths, in registration order.
    pub fn function_paths(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    /// Registered step configurations.
    pub fn steps(&self) -> impl Iterator<Item = &StepConfig> {
        self.steps.iter().map(|s| s.config.as_ref())
    }

    /// Input schema advertised for the function at `path`.
    pub fn request_format(&self, path: &str) -> Option<Value> {
        self.functions.get(path).and_then(|h| h.request_format())
    }

    /// Call the function registered under `path`.
    pub async fn invoke(&self, path: &str, payload: Value, ctx: Context) -> HandlerResult {
        let handler = self
            .functions
            .get(path)
            .ok_or_else(|| WorkerError::FunctionNotFound(path.to_string()))?;

        handler.call(payload, ctx).await
    }

    /// Run the step named `name` on one event.
    ///
    /// Invalid event data is logged and dropped inside the step wrapper, so
    /// only unknown steps and handler failures are errors.
    pub async fn run_step(
        &self,
        name: &str,
        payload: Value,
        bridge: Option<Arc<dyn Bridge>>,
    ) -> Result<()> {
        let entry = self
            .steps
            .iter()
            .find(|s| s.config.name == name)
            .ok_or_else(|| WorkerError::FunctionNotFound(name.to_string()))?;

        let ctx = Context::for_step(entry.config.clone(), bridge);
        entry.handler.call(payload, ctx).await
    }
}
