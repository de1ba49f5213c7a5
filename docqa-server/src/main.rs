use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use docqa_rag::ServiceLifecycle;
use docqa_server::server::{AppState, run_server};
use docqa_server::startup::build_service;
use docqa_server::telemetry::init_logging;
use docqa_server::{Cli, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.log_json);

    let config = ServerConfig::try_from(cli).context("invalid configuration")?;

    let lifecycle = Arc::new(ServiceLifecycle::new());
    lifecycle
        .initialize(build_service(&config))
        .await
        .with_context(|| format!("failed to index {}", config.document.display()))?;

    run_server(&config, AppState::new(lifecycle)).await
}
