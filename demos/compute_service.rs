//! Compute Service - doubles `n`.
//!
//! Registers `compute-service::compute`. `n` is optional and defaults to 10.

use quickstart_worker::services::compute_service;
use quickstart_worker::{WorkerBuilder, WorkerConfig};
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quickstart_worker=info,compute_service=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = WorkerConfig::for_worker("compute-service").with_env()?;

    let worker = compute_service::register(WorkerBuilder::from_config(config))
        .connect()
        .await?;
    tracing::info!("Compute service started - listening for calls");

    // Runs until Ctrl-C or the engine rejects the worker
    worker.run_until_shutdown().await?;

    Ok(())
}
