//! procure - procurement workflow client
//!
//! Moves inventory requests through product quotations to purchase orders.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use procurement_client::gateway::{ApiClient, FileSessionStore};
use procurement_client::services::AuthService;
use procurement_client::{Config, Orchestrator};

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "procure=info,procurement_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;
    let cli = cli::Cli::parse();

    tracing::debug!("Environment: {}", config.environment);
    tracing::debug!("API: {}", config.api.base_url);

    let sessions = Arc::new(FileSessionStore::new(config.session.store_path.clone()));
    let api = ApiClient::new(&config.api, config.retry.clone(), &config.gateway, sessions)?;
    let auth = AuthService::new(api.clone());
    let mut orchestrator =
        Orchestrator::new(api, config.requestor.clone(), config.orchestrator.clone());

    if let Err(e) = cli::run(cli, &mut orchestrator, &auth).await {
        cli::print_notice(&e.notice());
        std::process::exit(1);
    }

    Ok(())
}
