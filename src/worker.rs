//! Worker builder and engine registration.
//!
//! The [`WorkerBuilder`] collects functions, steps and settings. On
//! [`WorkerBuilder::connect`] the worker:
//! 1. Opens an engine client (`ws://` or `wss://`)
//! 2. Registers every function with its input schema as `request_format`
//! 3. Registers every step as `steps::<name>` plus one `subscribe` trigger
//!    per event topic
//!
//! The client owns the connection (reconnects, reply correlation); each
//! call the engine routes here goes through a bounded dispatcher into
//! the [`FunctionRegistry`].
//!
//! # Example
//!
//! ```ignore
//! use quickstart_worker::Worker;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let worker = Worker::builder()
//!         .worker_name("data-service")
//!         .function("data-service.transform", transform)
//!         .connect()
//!         .await?;
//!
//!     worker.run_until_shutdown().await?;
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use iii_sdk::protocol::RegisterTriggerInput;
use iii_sdk::runtime::WorkerMetadata;
use iii_sdk::{IIIClient, InitOptions, RegisterFunction};
use serde_json::{json, Value};
use tokio::sync::Semaphore;

use crate::bridge::{Bridge, EngineBridge};
use crate::config::WorkerConfig;
use crate::error::{error_codes, Result, WorkerError};
use crate::handler::{Context, FunctionRegistry, HandlerResult, RawHandler, StepConfig, Trigger};
use crate::validation::Validate;

/// Trigger type the engine uses for topic subscriptions.
pub const SUBSCRIBE_TRIGGER: &str = "subscribe";

/// How often `run_until_shutdown` checks the client for a fatal error.
const FATAL_ERROR_POLL: Duration = Duration::from_millis(500);

/// Builder for configuring and starting a worker.
pub struct WorkerBuilder {
    registry: FunctionRegistry,
    config: WorkerConfig,
}

impl WorkerBuilder {
    /// Create a builder with default configuration.
    pub fn new() -> Self {
        Self::from_config(WorkerConfig::default())
    }

    /// Create a builder from an existing configuration.
    pub fn from_config(config: WorkerConfig) -> Self {
        Self {
            registry: FunctionRegistry::new(),
            config,
        }
    }

    /// Register a function whose input is validated against `T`'s schema.
    pub fn function<F, T, Fut>(mut self, path: &str, handler: F) -> Self
    where
        F: Fn(T, Context) -> Fut + Send + Sync + 'static,
        T: Validate,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.registry.register_validated(path, handler);
        self
    }

    /// Register a function over the raw payload.
    pub fn raw_function<F, Fut>(mut self, path: &str, handler: F) -> Self
    where
        F: Fn(Value, Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.registry.register_raw(path, handler);
        self
    }

    /// Register a function over the raw payload that advertises `request_format`.
    ///
    /// The schema is informational: payloads reach the handler unchecked.
    pub fn described_function<F, Fut>(mut self, path: &str, request_format: Value, handler: F) -> Self
    where
        F: Fn(Value, Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.registry.register_handler(
            path,
            RawHandler::new(handler).with_request_format(request_format),
        );
        self
    }

    /// Register an event step.
    pub fn step<F, T, Fut>(mut self, config: StepConfig, handler: F) -> Self
    where
        F: Fn(T, Context) -> Fut + Send + Sync + 'static,
        T: Validate,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.registry.register_step(config, handler);
        self
    }

    /// Name sent to the engine at registration.
    pub fn worker_name(mut self, name: &str) -> Self {
        self.config.worker_name = name.to_string();
        self
    }

    /// Engine URL (`ws://host:port` or `wss://host:port`).
    pub fn bridge_url(mut self, url: &str) -> Self {
        self.config.bridge_url = url.to_string();
        self
    }

    /// Maximum number of invocations and events handled at once.
    ///
    /// Calls beyond the limit are answered with `worker_busy`; events are dropped.
    /// Default: 256
    pub fn max_concurrent_invocations(mut self, limit: usize) -> Self {
        self.config.max_concurrent_invocations = limit;
        self
    }

    /// How long a handler waits for a state read.
    ///
    /// Default: 5 seconds
    pub fn state_timeout(mut self, timeout: Duration) -> Self {
        self.config.state_timeout = timeout;
        self
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Connect to the configured engine and register every handler.
    ///
    /// The connection itself is opened in the background; use
    /// [`Worker::wait_until_registered`] to wait for the engine's answer.
    pub async fn connect(self) -> Result<Worker> {
        self.config.validate_bridge_url()?;
        self.check_ids()?;

        tracing::info!(
            bridge = %self.config.bridge_url,
            worker = %self.config.worker_name,
            "connecting to engine"
        );

        let options = InitOptions {
            metadata: Some(WorkerMetadata {
                name: self.config.worker_name.clone(),
                ..WorkerMetadata::default()
            }),
            ..InitOptions::default()
        };
        let client = iii_sdk::register_worker(&self.config.bridge_url, options);

        Worker::start(client, self.registry, &self.config)
    }

    /// Function and step ids must be non-empty and distinct.
    fn check_ids(&self) -> Result<()> {
        if self.registry.function_paths().any(|p| p.trim().is_empty()) {
            return Err(WorkerError::Config("function path is empty".to_string()));
        }
        for step in self.registry.steps() {
            if step.name.trim().is_empty() {
                return Err(WorkerError::Config("step name is empty".to_string()));
            }
            if self.registry.contains(&step.function_id()) {
                return Err(WorkerError::Config(format!(
                    "step {} collides with function {}",
                    step.name,
                    step.function_id()
                )));
            }
        }
        Ok(())
    }
}

impl Default for WorkerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A connected worker.
///
/// Use `emit()` / `state_get()` for calls outside a handler.
/// Use `run_until_shutdown()` to hand the process over to the worker.
pub struct Worker {
    client: IIIClient,
    bridge: Arc<EngineBridge>,
    registry: Arc<FunctionRegistry>,
}

impl Worker {
    pub fn builder() -> WorkerBuilder {
        WorkerBuilder::new()
    }

    fn start(client: IIIClient, registry: FunctionRegistry, config: &WorkerConfig) -> Result<Self> {
        let bridge = Arc::new(EngineBridge::new(client.clone(), config.state_timeout));
        let registry = Arc::new(registry);
        let dispatcher = Arc::new(Dispatcher::new(
            registry.clone(),
            bridge.clone(),
            config.max_concurrent_invocations,
        ));

        for path in registry.function_paths() {
            let mut registration = dispatcher.function_registration(path);
            if let Some(schema) = registry.request_format(path) {
                registration = registration.request_format(schema);
            }
            client.register_function(path, registration);
        }

        for step in registry.steps() {
            let function_id = step.function_id();
            client.register_function(&function_id, dispatcher.step_registration(step)?);

            for topic in step.subscribed_topics() {
                client.register_trigger(RegisterTriggerInput::new(
                    SUBSCRIBE_TRIGGER,
                    &function_id,
                    json!({ "topic": topic }),
                ))?;
            }
        }

        tracing::info!(
            worker = %config.worker_name,
            functions = registry.function_paths().count(),
            steps = registry.steps().count(),
            "registered handlers with engine"
        );

        Ok(Worker {
            client,
            bridge,
            registry,
        })
    }

    /// Registered function paths.
    pub fn function_paths(&self) -> Vec<String> {
        self.registry.function_paths().map(str::to_string).collect()
    }

    /// The underlying engine client.
    pub fn client(&self) -> &IIIClient {
        &self.client
    }

    /// Wait until the engine accepts the registration.
    pub async fn wait_until_registered(&self, timeout: Duration) -> Result<()> {
        self.client.wait_until_registered(timeout).await?;
        Ok(())
    }

    /// Publish an event outside of any handler.
    pub async fn emit<T: serde::Serialize>(&self, topic: &str, data: &T) -> Result<()> {
        let data = serde_json::to_value(data)?;
        self.bridge.emit(topic, data).await
    }

    /// Read shared state outside of any handler.
    pub async fn state_get(&self, scope: &str, key: &str) -> Result<Option<Value>> {
        self.bridge.state_get(scope, key).await
    }

    /// Stop the engine client.
    pub async fn shutdown(self) {
        self.client.shutdown_async().await;
        tracing::info!("engine connection closed");
    }

    /// Block until Ctrl-C, or until the engine rejects the worker for good.
    pub async fn run_until_shutdown(self) -> Result<()> {
        let result = tokio::select! {
            err = fatal_error(&self.client) => {
                tracing::error!("engine stopped the worker: {}", err);
                Err(WorkerError::Engine(err))
            }
            signal = tokio::signal::ctrl_c() => match signal {
                Ok(()) => {
                    tracing::info!("interrupt received, shutting down");
                    Ok(())
                }
                Err(e) => Err(WorkerError::Io(e)),
            }
        };

        self.shutdown().await;
        result
    }
}

async fn fatal_error(client: &IIIClient) -> iii_sdk::Error {
    let mut interval = tokio::time::interval(FATAL_ERROR_POLL);
    loop {
        interval.tick().await;
        if let Some(err) = client.fatal_error() {
            return err;
        }
    }
}

/// Routes engine calls into the registry under a concurrency limit.
struct Dispatcher {
    registry: Arc<FunctionRegistry>,
    bridge: Arc<dyn Bridge>,
    semaphore: Arc<Semaphore>,
    next_invocation: AtomicU64,
}

impl Dispatcher {
    fn new(registry: Arc<FunctionRegistry>, bridge: Arc<dyn Bridge>, limit: usize) -> Self {
        Self {
            registry,
            bridge,
            semaphore: Arc::new(Semaphore::new(limit.max(1))),
            next_invocation: AtomicU64::new(1),
        }
    }

    fn function_registration(self: &Arc<Self>, path: &str) -> RegisterFunction {
        let dispatcher = self.clone();
        let path = path.to_string();

        RegisterFunction::new_async(move |payload: Value| {
            let dispatcher = dispatcher.clone();
            let path = path.clone();
            async move { dispatcher.invoke(&path, payload).await }
        })
    }

    fn step_registration(self: &Arc<Self>, step: &StepConfig) -> Result<RegisterFunction> {
        let dispatcher = self.clone();
        let name = step.name.clone();

        let mut registration = RegisterFunction::new_async(move |payload: Value| {
            let dispatcher = dispatcher.clone();
            let name = name.clone();
            async move { dispatcher.deliver(&name, payload).await }
        })
        .metadata(serde_json::to_value(step)?);

        if let Some(description) = &step.description {
            registration = registration.description(description.as_str());
        }
        if let Some(input) = step.triggers.iter().find_map(|t| match t {
            Trigger::Event { input, .. } => input.clone(),
        }) {
            registration = registration.request_format(input);
        }
        Ok(registration)
    }

    async fn invoke(&self, path: &str, payload: Value) -> std::result::Result<Value, iii_sdk::Error> {
        let Ok(_permit) = self.semaphore.clone().try_acquire_owned() else {
            tracing::warn!(function = %path, "Handler capacity reached, rejecting invocation");
            return Err(busy());
        };

        let invocation_id = format!("inv-{}", self.next_invocation.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(function = %path, invocation = %invocation_id, "invoke");
        let ctx = Context::for_invocation(path, &invocation_id, self.bridge.clone());

        self.registry.invoke(path, payload, ctx).await.map_err(|e| {
            match &e {
                WorkerError::FunctionNotFound(_) => {
                    tracing::warn!(function = %path, "invocation for unknown function")
                }
                _ => tracing::error!(function = %path, "Handler error: {}", e),
            }
            e.into()
        })
    }

    async fn deliver(&self, step: &str, payload: Value) -> std::result::Result<Value, iii_sdk::Error> {
        let Ok(_permit) = self.semaphore.clone().try_acquire_owned() else {
            tracing::warn!(step = %step, "Handler capacity reached, dropping event");
            return Err(busy());
        };

        match self.registry.run_step(step, payload, Some(self.bridge.clone())).await {
            Ok(()) => Ok(Value::Null),
            Err(e) => {
                tracing::error!(step = %step, "step failed: {}", e);
                Err(e.into())
            }
        }
    }
}

fn busy() -> iii_sdk::Error {
    iii_sdk::Error::Remote {
        code: error_codes::WORKER_BUSY.to_string(),
        message: "worker is at its concurrent invocation limit".to_string(),
        stacktrace: None,
    }
}
