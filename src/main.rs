use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use budgetlens::api::{app_router, ApiContext};
use budgetlens::config::{self, AppConfig};
use budgetlens::db::sqlite::open_database;
use budgetlens::jobs::queue::{JobQueue, ProcessingTrigger};
use budgetlens::jobs::{start_sweep, start_workers};
use budgetlens::pipeline::backend::backend_from_config;
use budgetlens::pipeline::explain::ExplanationGenerator;
use budgetlens::pipeline::orchestrator::DocumentPipeline;
use budgetlens::pipeline::summarize::Summarizer;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    if let Err(e) = run().await {
        tracing::error!(error = %e, "Fatal error");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env();

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    // Open once up front so migrations run (and failures surface)
    // before anything is serving.
    open_database(&config.database_path)?;
    tracing::info!(path = %config.database_path.display(), "Database ready");

    let summarizer = Summarizer::new(backend_from_config(&config)?);
    let explainer = ExplanationGenerator::new(backend_from_config(&config)?);
    let pipeline = Arc::new(DocumentPipeline::new(summarizer, explainer));

    let queue = Arc::new(JobQueue::new());
    let _workers = start_workers(
        Arc::clone(&queue),
        pipeline,
        config.database_path.clone(),
        config.worker_count,
    );
    let _sweep = start_sweep(
        config.database_path.clone(),
        Arc::clone(&queue) as Arc<dyn ProcessingTrigger>,
    );

    let ctx = ApiContext::new(
        config.database_path.clone(),
        Arc::clone(&queue) as Arc<dyn ProcessingTrigger>,
    );
    let app = app_router(ctx);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "API listening");
    axum::serve(listener, app).await?;

    Ok(())
}
