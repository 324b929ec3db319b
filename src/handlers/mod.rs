mod vote;

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::{ConnectInfo, FromRequestParts, State},
    http::request::Parts,
    response::IntoResponse,
    routing::{get, post},
};
use log::warn;
use tower_http::services::ServeDir;

use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::Pairing;
use crate::voting;

const FORWARDED_FOR: &str = "x-forwarded-for";

#[derive(Clone)]
pub struct AppState {
    pub database: Arc<Database>,
    pub trust_forwarded_for: bool,
}

pub fn router(state: AppState, public_dir: &str) -> Router {
    Router::new()
        .route("/api/challenges/current", get(current_challenge))
        .route("/api/vote", post(vote::submit_vote))
        .route("/api/results/:challenge_id", get(vote::results))
        .route("/health", get(health))
        .fallback_service(ServeDir::new(public_dir))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    "OK"
}

/// GET /api/challenges/current
async fn current_challenge(
    State(state): State<AppState>,
    VisitorKey(visitor_key): VisitorKey,
) -> Result<Json<Pairing>> {
    let pairing = voting::select_pairing(&state.database, &visitor_key).await?;
    Ok(Json(pairing))
}

/// Best-effort visitor identity: the first `X-Forwarded-For` hop when the
/// proxy is trusted, otherwise the peer address.
pub struct VisitorKey(pub String);

#[async_trait]
impl FromRequestParts<AppState> for VisitorKey {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        if state.trust_forwarded_for {
            let forwarded = parts
                .headers
                .get(FORWARDED_FOR)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.split(',').next())
                .map(str::trim)
                .filter(|hop| !hop.is_empty());

            if let Some(hop) = forwarded {
                return Ok(VisitorKey(hop.to_string()));
            }
        }

        match ConnectInfo::<SocketAddr>::from_request_parts(parts, state).await {
            Ok(ConnectInfo(addr)) => Ok(VisitorKey(addr.ip().to_string())),
            Err(rejection) => {
                warn!("Request without a usable visitor address: {}", rejection);
                Err(Error::InvalidArgument("cannot determine visitor key".into()))
            }
        }
    }
}
