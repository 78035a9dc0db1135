//! Parley REST API entry point.
//!
//! Binary name: `parley`
//!
//! Loads configuration, initializes tracing, the database and services, then
//! serves the REST API until Ctrl+C or SIGTERM.

mod cli;
mod http;
mod state;

use std::path::Path;

use anyhow::Context;
use clap::Parser;
use clap_complete::generate;

use parley_infra::config::{apply_process_env, load_config};
use parley_observe::tracing_setup::{TracingOptions, init_tracing, shutdown_tracing};
use parley_types::config::AppConfig;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            generate(shell, &mut cmd, "parley", &mut std::io::stdout());
            Ok(())
        }
        Commands::Serve { host, port, config } => {
            let config_exists = tokio::fs::try_exists(&config).await.unwrap_or(false);
            let mut app_config = apply_process_env(load_config(&config).await);
            if let Some(host) = host {
                app_config.server.host = host;
            }
            if let Some(port) = port {
                app_config.server.port = port;
            }

            init_tracing(&tracing_options(&app_config, cli.verbose, cli.json_logs))
                .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;
            if !config_exists {
                tracing::warn!(path = %config.display(), "Config file not found, using defaults");
            }

            let result = serve(&app_config, &config).await;
            shutdown_tracing();
            result
        }
    }
}

fn tracing_options(config: &AppConfig, verbose: u8, json_logs: bool) -> TracingOptions {
    let filter = match verbose {
        0 => config.logging.filter.clone(),
        1 => "debug,sqlx=warn".to_string(),
        _ => "trace".to_string(),
    };
    TracingOptions {
        filter,
        json: json_logs || config.logging.json,
        otel: config.logging.otel,
    }
}

async fn serve(config: &AppConfig, config_path: &Path) -> anyhow::Result<()> {
    let state = AppState::init(config).await?;
    tracing::info!(
        config = %config_path.display(),
        model = %config.ai.model,
        history_window = config.chat.history_window,
        "Services initialized"
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "Parley API listening");

    let router = http::router::build_router(state);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
