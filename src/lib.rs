//! # quickstart-worker
//!
//! Quickstart handlers for a bridge-connected worker, and the worker
//! plumbing they run on.
//!
//! A handler receives an untyped payload, validates it against a declared
//! schema, and returns either its output mapping or a structured
//! `{"error": "Invalid payload", "details": [...]}` rejection. Validation
//! rejections are ordinary results; only faults (unknown function, handler
//! error) travel back to the bridge as error results.
//!
//! ## Architecture
//!
//! - **Handlers** ([`services`]): data transform, compute, greeting, hello step
//! - **Validation** ([`validation`]): `schemars` input schemas checked with
//!   `jsonschema`, field-level rejection payloads
//! - **Registry** ([`handler`]): validation, dispatch, per-call [`Context`]
//! - **Engine link** ([`bridge`], [`Worker`]): the `iii-sdk` client over
//!   WebSocket; functions, `subscribe` triggers, `publish` and `state::get`
//!
//! ## Example
//!
//! ```ignore
//! use quickstart_worker::{services, WorkerBuilder, WorkerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = WorkerConfig::for_worker("quickstart").with_env()?;
//!     let worker = services::register_all(WorkerBuilder::from_config(config))
//!         .connect()
//!         .await?;
//!
//!     worker.run_until_shutdown().await?;
//!     Ok(())
//! }
//! ```

pub mod bridge;
pub mod config;
pub mod error;
pub mod handler;
pub mod services;
pub mod validation;

mod worker;

pub use config::WorkerConfig;
pub use error::WorkerError;
pub use handler::Context;
pub use worker::{Worker, WorkerBuilder};
