/**
 * TELEMETRY KERNEL - Point d'entrée du service de télémétrie navires
 *
 * RÔLE : Bootstrap : config, store partagé, sweeper, serveur HTTP.
 * Vérifie que le listener répond avant de se déclarer démarré, s'arrête
 * proprement sur SIGINT/SIGTERM.
 *
 * ARCHITECTURE : un TelemetryStore unique passé par Arc aux handlers Axum
 * et à la tâche de purge ; arrêt coordonné par un CancellationToken.
 */

mod codes;
mod config;
mod http;
mod identity;
mod models;
mod params;
mod store;
mod sweeper;

use crate::config::{config_path, load_config};
use crate::http::AppState;
use crate::identity::InstanceIdentity;
use crate::store::TelemetryStore;
use crate::sweeper::spawn_sweeper;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

const STARTUP_CHECK_TIMEOUT: Duration = Duration::from_secs(3);

#[tokio::main]
async fn main() {
    // .env optionnel (RUST_LOG, TELEMETRY_KERNEL_CONFIG)
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run().await {
        log::error!("[kernel] {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let path = config_path();
    let cfg = load_config(&path)
        .await
        .with_context(|| format!("failed to load config {}", path.display()))?;

    let identity = InstanceIdentity::new();
    log::info!("[kernel] instance {} - port {}", identity.uuid(), cfg.port);

    let store = TelemetryStore::shared();
    let shutdown = CancellationToken::new();
    let sweeper = spawn_sweeper(store.clone(), cfg.sweep.to_settings(), shutdown.child_token());

    log::info!("[kernel] starting server...");
    let listener = TcpListener::bind(("localhost", cfg.port))
        .await
        .with_context(|| format!("failed to bind localhost:{}", cfg.port))?;
    let addr = listener.local_addr()?;

    let app_state = AppState { store: store.clone(), identity: identity.clone() };
    let mut server = tokio::spawn(http::serve(listener, app_state, shutdown.clone()));

    verify_listener(addr).await?;
    log::info!("[kernel] server started on http://{addr}");

    let early_exit = tokio::select! {
        _ = shutdown_signal() => {
            log::info!("[kernel] shutdown signal received");
            None
        }
        res = &mut server => Some(res),
    };
    let stopped_early = early_exit.is_some();

    shutdown.cancel();
    let server_result = match early_exit {
        Some(res) => res,
        None => server.await,
    };
    sweeper.stop().await;
    server_result??;
    if stopped_early {
        anyhow::bail!("server stopped unexpectedly");
    }

    log::info!(
        "[kernel] stopped after {}s ({} vessels in memory)",
        identity.uptime_seconds(), store.len()
    );
    Ok(())
}

/// Auto-connexion au listener : le serveur doit accepter avant qu'on annonce le démarrage
async fn verify_listener(addr: SocketAddr) -> Result<()> {
    let stream = tokio::time::timeout(STARTUP_CHECK_TIMEOUT, TcpStream::connect(addr))
        .await
        .with_context(|| format!("server did not start: connect to {addr} timed out"))?
        .with_context(|| format!("server did not start: connect to {addr} failed"))?;
    drop(stream);
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("[kernel] failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                log::error!("[kernel] failed to listen for SIGTERM: {}", e);
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
