//! Hello step - event-driven handler.
//!
//! Subscribes `HelloFromPython` to the `hello` topic; every valid event is
//! answered on `hello.response.python`.

use quickstart_worker::services::hello_step;
use quickstart_worker::{WorkerBuilder, WorkerConfig};
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quickstart_worker=info,hello_step=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = WorkerConfig::for_worker("hello-step").with_env()?;

    let worker = hello_step::register(WorkerBuilder::from_config(config))
        .connect()
        .await?;
    tracing::info!("Hello step started - waiting for events");

    // Runs until Ctrl-C or the engine rejects the worker
    worker.run_until_shutdown().await?;

    Ok(())
}
