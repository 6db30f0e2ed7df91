mod core;
mod features;
mod modules;
mod shared;

use std::sync::Arc;

use crate::core::config::Config;
use crate::core::logging;
use crate::features::auth::CoreAuthClient;
use crate::features::reports::{CoreReportClient, PollScheduler, ReportProcessor, ReportRenderer};
use crate::modules::storage::MinIOClient;

fn main() -> anyhow::Result<()> {
    // Reports are handled strictly one at a time; a small runtime is enough
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

async fn async_main() -> anyhow::Result<()> {
    // Load configuration BEFORE initializing logger so RUST_LOG is available
    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    let log_file = logging::init(&config.log)?;

    tracing::info!(
        "Configuration loaded successfully (core: {}, pid: {})",
        config.core_api.base_url,
        std::process::id()
    );
    tracing::info!("Writing logs to {}", log_file.display());

    let auth_client = Arc::new(
        CoreAuthClient::new(config.core_api.clone())
            .map_err(|e| anyhow::anyhow!("Failed to create auth client: {}", e))?,
    );
    let report_client = Arc::new(
        CoreReportClient::new(config.core_api.clone())
            .map_err(|e| anyhow::anyhow!("Failed to create report client: {}", e))?,
    );
    tracing::info!("Core API clients initialized");

    let minio_client = Arc::new(
        MinIOClient::new(config.minio.clone())
            .map_err(|e| anyhow::anyhow!("Failed to initialize MinIO client: {}", e))?,
    );
    minio_client
        .ensure_bucket_exists()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to ensure MinIO bucket exists: {}", e))?;
    tracing::info!(
        "MinIO client initialized for bucket: {}",
        minio_client.bucket_name()
    );

    tokio::fs::create_dir_all(&config.worker.temp_dir).await?;

    let renderer = ReportRenderer::new(minio_client.clone(), &config.worker);
    let processor = ReportProcessor::new(report_client.clone(), minio_client, renderer);
    let scheduler = PollScheduler::new(
        auth_client,
        report_client,
        processor,
        config.worker.poll_interval,
    );

    tokio::select! {
        _ = scheduler.run() => {}
        result = tokio::signal::ctrl_c() => {
            result?;
            tracing::info!("Shutdown signal received, stopping report delivery worker");
        }
    }

    Ok(())
}
