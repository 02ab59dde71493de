//! Engine-backed bridge.
//!
//! Emits go out as fire-and-forget `publish` calls; state reads are
//! `state::get` calls answered by the engine's state store. Correlating the
//! reply and expiring the request are left to the client: the state timeout
//! is handed to it as the call's `timeout_ms`, so a read that gives up leaves
//! nothing waiting behind.

use std::time::Duration;

use iii_sdk::protocol::TriggerRequest;
use iii_sdk::{IIIClient, TriggerAction};
use serde_json::{json, Value};

use super::Bridge;
use crate::error::{Result, WorkerError};
use crate::handler::BoxFuture;

/// Default time a handler waits for a state read.
pub const DEFAULT_STATE_TIMEOUT: Duration = Duration::from_secs(5);

/// Engine function that publishes an event on a topic.
pub const PUBLISH_FUNCTION: &str = "publish";

/// Engine function that reads a value from the state store.
pub const STATE_GET_FUNCTION: &str = "state::get";

/// Bridge over a connected engine client.
#[derive(Clone)]
pub struct EngineBridge {
    client: IIIClient,
    state_timeout: Duration,
}

impl EngineBridge {
    pub fn new(client: IIIClient, state_timeout: Duration) -> Self {
        Self {
            client,
            state_timeout,
        }
    }

    pub fn client(&self) -> &IIIClient {
        &self.client
    }

    fn state_request(&self, scope: &str, key: &str) -> TriggerRequest {
        TriggerRequest {
            function_id: STATE_GET_FUNCTION.to_string(),
            payload: json!({ "scope": scope, "key": key }),
            action: None,
            timeout_ms: Some(self.state_timeout.as_millis().max(1) as u64),
        }
    }
}

impl Bridge for EngineBridge {
    fn emit<'a>(&'a self, topic: &'a str, data: Value) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let request = TriggerRequest {
                function_id: PUBLISH_FUNCTION.to_string(),
                payload: json!({ "topic": topic, "data": data }),
                action: Some(TriggerAction::Void),
                timeout_ms: None,
            };
            self.client.trigger(request).await.map_err(|e| match e {
                iii_sdk::Error::NotConnected => WorkerError::ConnectionClosed,
                other => WorkerError::Engine(other),
            })?;
            Ok(())
        })
    }

    fn state_get<'a>(
        &'a self,
        scope: &'a str,
        key: &'a str,
    ) -> BoxFuture<'a, Result<Option<Value>>> {
        Box::pin(async move {
            let value = self
                .client
                .trigger(self.state_request(scope, key))
                .await
                .map_err(state_error)?;

            Ok(match value {
                Value::Null => None,
                value => Some(value),
            })
        })
    }
}

fn state_error(err: iii_sdk::Error) -> WorkerError {
    match err {
        iii_sdk::Error::Timeout => WorkerError::StateTimeout,
        iii_sdk::Error::NotConnected => WorkerError::ConnectionClosed,
        iii_sdk::Error::Remote { code, message, .. } => {
            WorkerError::State(format!("{} ({})", message, code))
        }
        other => WorkerError::Engine(other),
    }
}
