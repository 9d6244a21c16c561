use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use shelfmark::config::{Cli, Config, default_config_path};
use shelfmark::handler::AppState;
use shelfmark::routes::router;
use shelfmark::scanner::ScanSessions;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() {
    let args = Cli::parse();

    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    tracing::info!("shelfmark.svc starting");

    let config_path = args
        .config_path
        .map(std::path::PathBuf::from)
        .unwrap_or_else(default_config_path);

    let mut cfg = Config::new(&config_path.to_string_lossy()).unwrap_or_else(|e| {
        tracing::error!(error = %e, path = ?config_path, "failed to load config file");
        std::process::exit(1);
    });
    if let Some(port) = args.port {
        cfg.app.set_port(port);
    }

    let state = AppState::new(&cfg).unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to build http client");
        std::process::exit(1);
    });

    let address = format!("0.0.0.0:{}", cfg.app.get_port());
    let cancellation_token = CancellationToken::new();

    let sweep = spawn_session_sweeper(
        state.scans.clone(),
        cfg.app.session_idle(),
        cancellation_token.clone(),
    );

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&address).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to setup tcp listener");
        std::process::exit(1);
    });

    tracing::info!("shelfmark.svc running on {}", &address);
    let shutdown = cancellation_token.clone();
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if signal::ctrl_c().await.is_ok() {
                tracing::info!("ctrl+c signal received, preparing to shutdown");
            }
            shutdown.cancel();
        })
        .await;

    if let Err(err) = served {
        tracing::error!(error = %err, "server error");
        cancellation_token.cancel();
        let _ = sweep.await;
        std::process::exit(1);
    }

    let _ = sweep.await;
    tracing::info!("shelfmark.svc going off, graceful shutdown complete");
}

fn spawn_session_sweeper(
    scans: Arc<ScanSessions>,
    max_idle: Duration,
    token: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let expired = scans.expire_idle(max_idle);
                    if expired > 0 {
                        tracing::info!(expired, "expired idle scan sessions");
                    }
                }
                _ = token.cancelled() => {
                    tracing::info!("scan session sweeper shutting down");
                    break;
                }
            }
        }
    })
}
