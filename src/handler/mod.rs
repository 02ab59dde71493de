//! Handler module - function/step registration and dispatch.
//!
//! Provides:
//! - [`FunctionRegistry`] - maps function paths to handlers, holds steps
//! - [`Context`] - logger, emit and state access for a single call
//! - [`StepConfig`] - registration record for event steps
//!
//! # Example
//!
//! ```ignore
//! use quickstart_worker::handler::{FunctionRegistry, StepConfig};
//!
//! let mut registry = FunctionRegistry::new();
//!
//! // Direct call with validated input
//! registry.register_validated("data-service.transform", |input: TransformInput, ctx| async move {
//!     ctx.logger().info("Processing data with data-service...");
//!     Ok(serde_json::json!({ "transformed": input.data }))
//! });
//!
//! // Event step
//! registry.register_step(StepConfig::new("Echo").event_trigger("ping", input_schema::<Ping>()).emits("pong"),
//!     |input: Ping, ctx| async move { ctx.emit("pong", &input).await });
//! ```

mod context;
mod logger;
mod registry;
mod step;

pub use context::Context;
pub use logger::Logger;
pub use registry::{
    BoxFuture, FunctionRegistry, Handler, HandlerResult, RawHandler, StepHandler,
    ValidatedHandler, ValidatedStep,
};
pub use step::{StepConfig, Trigger};
