use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use log::error;
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Storage unreachable or timed out. Callers may retry.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Uniqueness collision on insert. Consumed by the storage layer and
    /// turned into the idempotent path; never returned from the ledger.
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                Error::Conflict(db_err.message().to_string())
            }
            sqlx::Error::PoolTimedOut => {
                Error::Unavailable("timed out waiting for a connection".into())
            }
            sqlx::Error::PoolClosed => Error::Unavailable("connection pool closed".into()),
            other => {
                // Raw driver detail stays in the log.
                error!("Storage error: {:?}", other);
                Error::Unavailable("storage error".into())
            }
        }
    }
}

impl From<tokio::time::error::Elapsed> for Error {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        Error::Unavailable("storage operation timed out".into())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match self {
            Error::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::Conflict(_) => StatusCode::CONFLICT,
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_timeout_is_unavailable() {
        let err: Error = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, Error::Unavailable(_)));
    }

    #[test]
    fn driver_errors_do_not_leak_detail() {
        let err: Error = sqlx::Error::RowNotFound.into();
        match err {
            Error::Unavailable(msg) => assert_eq!(msg, "storage error"),
            other => panic!("expected Unavailable, got {:?}", other),
        }
    }

    #[test]
    fn status_codes() {
        assert_eq!(
            Error::InvalidArgument("x".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::NotFound("x".into()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::Unavailable("x".into()).into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
