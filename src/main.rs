/// API сервер предсказания оттока

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use churn_predict::{
    api::{self, AppState},
    config::AppConfig,
    results::ResultStore,
    ModelBundle, PredictionPipeline,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Инициализация логирования
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;

    // Бандл загружается один раз и дальше только читается
    let bundle = ModelBundle::load_or_placeholder(&config.model_path);
    let results = ResultStore::new(&config.results_dir)
        .with_context(|| {
            format!("Failed to create results directory {}", config.results_dir.display())
        })?
        .with_retention(config.results_retention);

    let state = AppState {
        pipeline: Arc::new(PredictionPipeline::new(bundle, config.pipeline.clone())),
        results: Arc::new(results),
        max_upload_bytes: config.max_upload_bytes,
    };

    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    tracing::info!("Server listening on http://{}", config.listen_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
