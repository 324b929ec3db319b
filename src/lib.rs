//! "Which is better?" voting service.
//!
//! Visitors are shown a random pairing they have not voted on yet, pick a
//! side, and get the running left/right split back. Each visitor key counts
//! at most once per pairing.
//!
//! # Routes
//! - `GET /api/challenges/current` picks a pairing for the caller
//! - `POST /api/vote` records `{"challengeId", "choice"}` and returns the tally
//! - `GET /api/results/:challengeId` returns the tally
//! - everything else is served from `PUBLIC_DIR`

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod tasks;
pub mod voting;

use std::net::SocketAddr;
use std::sync::Arc;

use log::{error, info};
use tokio::net::TcpListener;
use tokio::signal;

use config::Config;
use db::Database;
use handlers::AppState;

pub async fn start_server(config: Config) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Storage must be ready before the listener exists, so no request can
    // reach a handler ahead of it.
    let database = Arc::new(Database::new(&config).await?);
    info!("Database initialized");

    if config.seed_default_pairings {
        database.seed_default_pairings().await?;
    }

    let state = AppState {
        database,
        trust_forwarded_for: config.trust_forwarded_for,
    };
    let app = handlers::router(state, &config.public_dir);

    let address = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on http://localhost:{}", config.port);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
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
