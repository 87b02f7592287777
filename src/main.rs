//! Worker binary: load configuration from the environment, take the data
//! root from the first process argument, connect to the queues, and run the
//! consume loop until interrupted.

use anyhow::{bail, Context};
use tokio::signal;
use tracing::info;

use flopy_worker::config::WorkerConfig;
use flopy_worker::logging::init_logging;
use flopy_worker::messaging::QueueClient;
use flopy_worker::simulation::EngineProcessAdapter;
use flopy_worker::worker::{CalculationConsumer, JobProcessor, WorkspaceManager};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let Some(data_root) = std::env::args().nth(1) else {
        bail!("usage: flopy-worker <data-root>");
    };
    let data_root = std::fs::canonicalize(&data_root)
        .with_context(|| format!("data root '{data_root}' is not an existing directory"))?;

    let config = WorkerConfig::from_env().context("incomplete worker configuration")?;

    info!(
        data_root = %data_root.display(),
        input_queue = %config.calculation_queue,
        output_queue = %config.finished_queue,
        "Starting flopy calculation worker"
    );

    let queue = QueueClient::connect_with_backoff(
        &config.broker,
        &config.tuning,
        &[&config.calculation_queue, &config.finished_queue],
    )
    .await
    .context("could not establish queue connection")?;

    let processor = JobProcessor::new(
        WorkspaceManager::new(data_root),
        EngineProcessAdapter::from_env(),
    );
    let consumer = CalculationConsumer::new(queue, processor, config);

    tokio::select! {
        result = consumer.run() => {
            result.context("consume loop terminated")?;
        }
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received, stopping worker");
        }
    }

    Ok(())
}
