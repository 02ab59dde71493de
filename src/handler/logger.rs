//! Per-invocation logger.

use std::sync::Arc;

/// Leveled logger handed to handlers through their context.
///
/// Every line is a `tracing` event tagged with the function path and,
/// for direct calls, the invocation id.
#[derive(Debug, Clone)]
pub struct Logger {
    function: Arc<str>,
    invocation: Option<Arc<str>>,
}

impl Logger {
    pub fn new(function: &str, invocation: Option<&str>) -> Self {
        Self {
            function: Arc::from(function),
            invocation: invocation.map(Arc::from),
        }
    }

    fn invocation(&self) -> &str {
        self.invocation.as_deref().unwrap_or("-")
    }

    pub fn debug(&self, message: &str) {
        tracing::debug!(function = %self.function, invocation = self.invocation(), "{}", message);
    }

    pub fn info(&self, message: &str) {
        tracing::info!(function = %self.function, invocation = self.invocation(), "{}", message);
    }

    pub fn warn(&self, message: &str) {
        tracing::warn!(function = %self.function, invocation = self.invocation(), "{}", message);
    }

    pub fn error(&self, message: &str) {
        tracing::error!(function = %self.function, invocation = self.invocation(), "{}", message);
    }
}
