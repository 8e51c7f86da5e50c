//! F1 Forecast
//!
//! Web server and CLI serving Formula 1 statistics and AI race predictions.

mod ai;
mod cli;
mod config;
mod ergast;
mod error;
mod pages;
mod retry;
mod routes;
mod storage;
mod telemetry;
mod types;

use clap::Parser;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands};
use crate::config::AppConfig;
use crate::routes::AppState;
use crate::storage::Repository;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "f1_forecast=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Serve { host, port } => run_server(host, port).await,
        Commands::Predict { input } => cli::run_predict(input).await,
        Commands::DriverStats { driver_id } => cli::run_driver_stats(driver_id).await,
        Commands::Standings { season } => cli::run_standings(season).await,
        Commands::AnalyzeDriver { name } => cli::run_analyze_driver(name).await,
    }
}

/// Run the web server.
async fn run_server(host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    // Load configuration
    let mut config = AppConfig::load()?;

    // Override with CLI args
    if let Some(h) = host {
        config.server.host = h;
    }
    if let Some(p) = port {
        config.server.port = p;
    }

    tracing::info!("Configuration loaded");
    tracing::info!("Stats API: {}", config.ergast.base_url);
    tracing::info!("Database: {}", config.database.path);

    let repository = Arc::new(Repository::new(Path::new(&config.database.path))?);
    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    let state = Arc::new(AppState::new(config, repository)?);

    let app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
