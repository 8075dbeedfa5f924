//! Domain error to HTTP response mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use super::ApiResponse;
use crate::domain::DomainError;

pub type ApiResult<T> = Result<T, ApiError>;

/// A `DomainError` on its way out of a handler.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            DomainError::Validation(_) => StatusCode::BAD_REQUEST,
            DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
            DomainError::Conflict(_) => StatusCode::CONFLICT,
            DomainError::PoolExhausted { .. } | DomainError::PoolNotInitialized => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            DomainError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            DomainError::Storage { .. }
            | DomainError::PoolInit(_)
            | DomainError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to the client. Storage causes stay in the logs.
    pub fn public_message(&self) -> String {
        match &self.0 {
            DomainError::Storage { operation, .. } => {
                format!("Storage failure during {}", operation)
            }
            DomainError::PoolInit(_) | DomainError::Configuration(_) => {
                "Service is misconfigured".to_string()
            }
            DomainError::PoolNotInitialized | DomainError::PoolExhausted { .. } => {
                "Database temporarily unavailable".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(category = self.0.category(), "Request failed: {:?}", self.0);
        }
        let body = ApiResponse::<()>::error(self.public_message());
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn status_per_category() {
        let cases = [
            (DomainError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (DomainError::not_found("ParkingSpot", "id", 9), StatusCode::NOT_FOUND),
            (DomainError::Conflict("held".into()), StatusCode::CONFLICT),
            (DomainError::PoolExhausted { max_size: 2 }, StatusCode::SERVICE_UNAVAILABLE),
            (DomainError::PoolNotInitialized, StatusCode::SERVICE_UNAVAILABLE),
            (
                DomainError::Timeout {
                    operation: "list_spots",
                    after: Duration::from_secs(1),
                },
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (
                DomainError::storage("add_spot")(sea_orm::DbErr::Custom("disk".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError(err).status(), status);
        }
    }

    #[test]
    fn storage_cause_is_not_exposed() {
        let err = ApiError(DomainError::storage("add_spot")(sea_orm::DbErr::Custom(
            "secret table layout".into(),
        )));
        let msg = err.public_message();
        assert!(msg.contains("add_spot"));
        assert!(!msg.contains("secret"));
    }
}
