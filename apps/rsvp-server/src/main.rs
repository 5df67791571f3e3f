// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use rsvp_server::{
    api::router,
    clock::SystemClock,
    config::AppConfig,
    logging,
    state::AppState,
    storage::{MemoryStore, RedbStore, Store},
};
use tokio::{net::TcpListener, signal};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            std::process::exit(2);
        }
    };
    logging::init(config.log_format);
    if config.uses_development_secret() {
        tracing::warn!("JWT_SECRET is not set; using an insecure development secret");
    }

    let store: Arc<dyn Store> = match config.database_path() {
        Some(path) => {
            tracing::info!(path = %path.display(), "opening event database");
            Arc::new(RedbStore::open(&path)?)
        }
        None => {
            tracing::warn!("DATA_DIR is not set; events are kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    let state = AppState::new(&config, store, Arc::new(SystemClock));
    let app = router(state);

    let address = config.bind_address();
    let listener = TcpListener::bind(&address).await?;
    tracing::info!(%address, "RSVP server listening (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
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
    tracing::info!("shutdown signal received");
}
