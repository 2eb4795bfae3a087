pub mod api;
pub mod config;
pub mod db;
pub mod entities;
pub mod predictor;
pub mod services;
pub mod state;

pub use config::Config;

use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Build the tokio runtime from config. `worker_threads = 0` means use
/// the core-count default rather than an explicit thread count.
pub fn build_runtime(config: &Config) -> std::io::Result<tokio::runtime::Runtime> {
    let mut builder = tokio::runtime::Builder::new_multi_thread();

    if config.general.worker_threads > 0 {
        builder.worker_threads(config.general.worker_threads);
    }

    builder.enable_all().build()
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    let port = config.server.port;

    let state = api::create_app_state_from_config(config).await?;
    let app = api::router(state).await;

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install shutdown handler: {e}");
        return;
    }
    tracing::info!("Shutdown signal received");
}

fn print_help() {
    println!("Usage: vitalis [COMMAND]");
    println!();
    println!("Commands:");
    println!("  serve    Start the HTTP server (default)");
    println!("  init     Write a default config file if none exists");
    println!("  help     Show this message");
}

pub async fn run() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let config = Config::load()?;
    config.validate()?;

    init_tracing(&config);

    let command = std::env::args().nth(1);
    match command.as_deref() {
        None | Some("serve") => run_server(config).await,
        Some("init") => {
            if Config::create_default_if_missing()? {
                println!("Wrote default config.toml");
            } else {
                println!("config.toml already exists, leaving it alone");
            }
            Ok(())
        }
        Some("help" | "--help" | "-h") => {
            print_help();
            Ok(())
        }
        Some(other) => {
            eprintln!("Unknown command: {other}");
            print_help();
            std::process::exit(2);
        }
    }
}

/// Build an app for tests without binding a socket.
pub async fn test_app(config: Config) -> anyhow::Result<(axum::Router, Arc<api::AppState>)> {
    let state = api::create_app_state_from_config(config).await?;
    let app = api::router(state.clone()).await;
    Ok((app, state))
}
