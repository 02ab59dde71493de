//! Greeting Service - reads shared state.
//!
//! Registers `hello-service.greet`, which includes the `config/worker_version`
//! state value in its reply (or `"unknown"` when it is not set).

use quickstart_worker::services::greeting_service;
use quickstart_worker::{WorkerBuilder, WorkerConfig};
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quickstart_worker=info,greeting_service=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = WorkerConfig::for_worker("hello-service").with_env()?;

    let worker = greeting_service::register(WorkerBuilder::from_config(config))
        .connect()
        .await?;
    tracing::info!("Greeting service started - listening for calls");

    // Runs until Ctrl-C or the engine rejects the worker
    worker.run_until_shutdown().await?;

    Ok(())
}
