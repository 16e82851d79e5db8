//! Respondo entry point.
//!
//! Commands:
//! - `serve`    — Start the HTTP API server
//! - `migrate`  — Create the database schema and exit

use anyhow::Context;
use clap::{Parser, Subcommand};
use respondo_agent::Responder;
use respondo_config::AppConfig;
use respondo_core::MessageDelivery;
use respondo_gateway::{GatewayState, LogDelivery, WebhookDelivery};
use respondo_providers::ProviderRegistry;
use respondo_store::Store;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "respondo",
    about = "Respondo - conversational AI responder for multi-tenant CRM",
    version
)]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, global = true, env = "RESPONDO_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Create the database schema and exit
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { port } => serve(config, port).await,
        Commands::Migrate => migrate(config).await,
    }
}

fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(AppConfig::from_env()),
    }
}

async fn serve(mut config: AppConfig, port_override: Option<u16>) -> anyhow::Result<()> {
    if let Some(port) = port_override {
        config.server.port = port;
    }

    let store = Store::open(&config.database.url)
        .await
        .with_context(|| format!("failed to open database at {}", config.database.url))?;

    let providers = ProviderRegistry::from_config(&config);
    if providers.is_empty() {
        warn!("no AI provider configured, every invocation will fail");
    }

    let delivery: Arc<dyn MessageDelivery> = match &config.delivery.webhook_url {
        Some(url) => Arc::new(WebhookDelivery::new(url.clone())),
        None => Arc::new(LogDelivery),
    };

    let responder = Responder::new(store, Arc::new(providers), delivery);
    let router = respondo_gateway::build_router(Arc::new(GatewayState { responder }));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "respondo listening");

    axum::serve(listener, router)
        .await
        .context("server error")?;
    Ok(())
}

async fn migrate(config: AppConfig) -> anyhow::Result<()> {
    Store::open(&config.database.url)
        .await
        .with_context(|| format!("failed to open database at {}", config.database.url))?;
    info!(database = %config.database.url, "schema is up to date");
    Ok(())
}
