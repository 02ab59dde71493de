//! Data Service - validated transform.
//!
//! Registers `data-service.transform`, which checks `{ data: mapping }` and
//! replies with the mapping, its keys and a `source` tag.
//!
//! ```text
//! III_BRIDGE_URL=ws://127.0.0.1:49134 cargo run --example data_service
//! ```

use quickstart_worker::services::data_service;
use quickstart_worker::{WorkerBuilder, WorkerConfig};
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quickstart_worker=info,data_service=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = WorkerConfig::for_worker("data-service").with_env()?;

    let worker = data_service::register(WorkerBuilder::from_config(config))
        .connect()
        .await?;
    tracing::info!("Data service started - listening for calls");

    // Runs until Ctrl-C or the engine rejects the worker
    worker.run_until_shutdown().await?;

    Ok(())
}
