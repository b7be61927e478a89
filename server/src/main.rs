use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use unfair_chess_server::ai::{AiMover, MoveProvider, OpenRouterProvider};
use unfair_chess_server::config::ServerConfig;
use unfair_chess_server::{api, build_state};

#[derive(Parser, Debug)]
#[command(name = "unfair-chess-server", version, about = "Unfair Chess HTTP server")]
struct Args {
    /// Address to listen on (overrides UNFAIR_CHESS_BIND)
    #[arg(long)]
    bind: Option<String>,

    /// Data directory (overrides UNFAIR_CHESS_DATA_DIR)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Write daily log files here (overrides UNFAIR_CHESS_LOG_DIR)
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut config = ServerConfig::from_env();
    if let Some(bind) = args.bind {
        config.bind = bind;
    }
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    if let Some(dir) = args.log_dir {
        config.log_dir = Some(dir);
    }

    let _log_guard = init_tracing(&config);

    tracing::info!("Starting Unfair Chess server");
    tracing::info!("Using data directory: {}", config.data_dir.display());

    let provider = OpenRouterProvider::from_config(&config.ai)
        .context("building the AI provider")?
        .map(|p| Arc::new(p) as Arc<dyn MoveProvider>);
    match &provider {
        Some(_) => tracing::info!(models = ?config.ai.models, "AI provider configured"),
        None => tracing::warn!("No AI API key set, bots will play random moves"),
    }
    let ai = Arc::new(AiMover::new(provider, &config.ai));

    let state = build_state(&config.data_dir, config.rps_deadline, ai)
        .await
        .context("restoring server state")?;
    let app = api::build_router(state.clone());

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("binding {}", config.bind))?;
    tracing::info!("Server listening on {}", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.games.shutdown().await;
    state.matches.shutdown().await;
    tracing::info!("Server stopped");
    Ok(())
}

/// Console output always, plus a daily rolling file when a log dir is set.
fn init_tracing(config: &ServerConfig) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "unfair-chess.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_span_events(FmtSpan::CLOSE);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_span_events(FmtSpan::CLOSE))
        .with(file_layer)
        .init();
    guard
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
