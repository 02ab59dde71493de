//! Worker configuration.
//!
//! Defaults can be overridden in code through [`crate::WorkerBuilder`] or
//! from the environment with [`WorkerConfig::with_env`]:
//!
//! - `III_BRIDGE_URL` (or `III_URL`): engine address (default `ws://127.0.0.1:49134`)
//! - `III_WORKER_NAME`: name sent at registration
//! - `III_MAX_CONCURRENT_INVOCATIONS`: in-flight handler limit (default 256)
//! - `III_STATE_TIMEOUT_MS`: state read timeout (default 5000)

use std::str::FromStr;
use std::time::Duration;

use crate::bridge::DEFAULT_STATE_TIMEOUT;
use crate::error::{Result, WorkerError};

/// Default engine address.
pub const DEFAULT_BRIDGE_URL: &str = iii_sdk::DEFAULT_ENGINE_URL;

/// Default maximum concurrent handler invocations.
pub const DEFAULT_MAX_CONCURRENT_INVOCATIONS: usize = 256;

/// Default worker name.
pub const DEFAULT_WORKER_NAME: &str = "quickstart-worker";

pub const ENV_BRIDGE_URL: &str = "III_BRIDGE_URL";
pub const ENV_ENGINE_URL: &str = "III_URL";
pub const ENV_WORKER_NAME: &str = "III_WORKER_NAME";
pub const ENV_MAX_CONCURRENT_INVOCATIONS: &str = "III_MAX_CONCURRENT_INVOCATIONS";
pub const ENV_STATE_TIMEOUT_MS: &str = "III_STATE_TIMEOUT_MS";

/// Settings for a worker process.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerConfig {
    pub bridge_url: String,
    pub worker_name: String,
    pub max_concurrent_invocations: usize,
    pub state_timeout: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            bridge_url: DEFAULT_BRIDGE_URL.to_string(),
            worker_name: DEFAULT_WORKER_NAME.to_string(),
            max_concurrent_invocations: DEFAULT_MAX_CONCURRENT_INVOCATIONS,
            state_timeout: DEFAULT_STATE_TIMEOUT,
        }
    }
}

impl WorkerConfig {
    /// Defaults with `name` as the worker name.
    ///
    /// `III_WORKER_NAME` still wins when applied with [`WorkerConfig::with_env`].
    pub fn for_worker(name: &str) -> Self {
        Self {
            worker_name: name.to_string(),
            ..Self::default()
        }
    }

    /// Defaults overridden by `III_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::default().with_env()
    }

    /// Defaults overridden by values from `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::default().with_lookup(lookup)
    }

    /// Override these settings with `III_*` environment variables.
    pub fn with_env(self) -> Result<Self> {
        self.with_lookup(|key| std::env::var(key).ok())
    }

    /// Override these settings with values from `lookup`.
    pub fn with_lookup<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BRIDGE_URL).or_else(|| lookup(ENV_ENGINE_URL)) {
            self.bridge_url = url;
        }
        if let Some(name) = lookup(ENV_WORKER_NAME) {
            if name.trim().is_empty() {
                return Err(WorkerError::Config(format!("{} is empty", ENV_WORKER_NAME)));
            }
            self.worker_name = name;
        }
        if let Some(v) = lookup(ENV_MAX_CONCURRENT_INVOCATIONS) {
            self.max_concurrent_invocations = parse_positive(ENV_MAX_CONCURRENT_INVOCATIONS, &v)?;
        }
        if let Some(v) = lookup(ENV_STATE_TIMEOUT_MS) {
            self.state_timeout = Duration::from_millis(parse_positive(ENV_STATE_TIMEOUT_MS, &v)?);
        }

        self.validate_bridge_url()?;
        Ok(self)
    }

    /// Check that the engine address is a `ws://` or `wss://` URL with a host.
    pub fn validate_bridge_url(&self) -> Result<()> {
        let Some((scheme, rest)) = self.bridge_url.split_once("://") else {
            return Err(WorkerError::Config(format!(
                "bridge URL has no scheme: {:?}",
                self.bridge_url
            )));
        };

        match scheme {
            "ws" | "wss" if !rest.trim_matches('/').is_empty() => Ok(()),
            "ws" | "wss" => Err(WorkerError::Config(format!(
                "bridge URL has no host: {:?}",
                self.bridge_url
            ))),
            other => Err(WorkerError::Config(format!(
                "unsupported bridge scheme: {}",
                other
            ))),
        }
    }
}

fn parse_positive<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr + PartialOrd + Default,
{
    match value.trim().parse::<T>() {
        Ok(n) if n > T::default() => Ok(n),
        _ => Err(WorkerError::Config(format!(
            "{} must be a positive integer, got {:?}",
            key, value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = WorkerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, WorkerConfig::default());
        assert_eq!(config.bridge_url, "ws://127.0.0.1:49134");
        assert_eq!(config.worker_name, "quickstart-worker");
        assert_eq!(config.max_concurrent_invocations, 256);
        assert_eq!(config.state_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_overrides() {
        let config = WorkerConfig::from_lookup(lookup(&[
            ("III_BRIDGE_URL", "ws://localhost:49134"),
            ("III_WORKER_NAME", "data-service"),
            ("III_MAX_CONCURRENT_INVOCATIONS", "8"),
            ("III_STATE_TIMEOUT_MS", "250"),
        ]))
        .unwrap();

        assert_eq!(config.bridge_url, "ws://localhost:49134");
        assert_eq!(config.worker_name, "data-service");
        assert_eq!(config.max_concurrent_invocations, 8);
        assert_eq!(config.state_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_engine_url_fallback() {
        let config = WorkerConfig::from_lookup(lookup(&[("III_URL", "wss://engine.example:443")]))
            .unwrap();
        assert_eq!(config.bridge_url, "wss://engine.example:443");

        let config = WorkerConfig::from_lookup(lookup(&[
            ("III_URL", "ws://ignored:1"),
            ("III_BRIDGE_URL", "ws://preferred:2"),
        ]))
        .unwrap();
        assert_eq!(config.bridge_url, "ws://preferred:2");
    }

    #[test]
    fn test_worker_default_name() {
        let config = WorkerConfig::for_worker("compute-service")
            .with_lookup(lookup(&[]))
            .unwrap();
        assert_eq!(config.worker_name, "compute-service");
        assert_eq!(config.bridge_url, DEFAULT_BRIDGE_URL);

        let config = WorkerConfig::for_worker("compute-service")
            .with_lookup(lookup(&[("III_WORKER_NAME", "compute-eu")]))
            .unwrap();
        assert_eq!(config.worker_name, "compute-eu");
    }

    #[test]
    fn test_invalid_values() {
        for (key, value) in [
            ("III_BRIDGE_URL", "tcp://127.0.0.1:49134"),
            ("III_BRIDGE_URL", "localhost:49134"),
            ("III_BRIDGE_URL", "ws://"),
            ("III_WORKER_NAME", "  "),
            ("III_MAX_CONCURRENT_INVOCATIONS", "0"),
            ("III_STATE_TIMEOUT_MS", "-1"),
            ("III_STATE_TIMEOUT_MS", "lots"),
        ] {
            let result = WorkerConfig::from_lookup(lookup(&[(key, value)]));
            assert!(
                matches!(result, Err(WorkerError::Config(_))),
                "{}={} should be rejected",
                key,
                value
            );
        }
    }
}
