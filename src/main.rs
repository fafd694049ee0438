use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use dataproduct_api::config;
use dataproduct_api::pipeline::Pipeline;
use dataproduct_api::routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so DATABASE_URL and PIPELINE_* settings are picked up
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config::config();
    tracing::info!("Starting Data Product API in {:?} mode", config.environment);

    let pipeline = Pipeline::from_config(&config.pipeline).context("failed to build pipeline")?;
    tracing::info!(
        "Pipeline ready: contract={} uploads={} target={}",
        config.pipeline.contract_path.display(),
        config.pipeline.uploads_dir.display(),
        config.pipeline.forward_url
    );

    let app = routes::app(Arc::new(pipeline));

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Data Product API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
