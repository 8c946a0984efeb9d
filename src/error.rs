//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::{ActorRole, DomainError};
use crate::gateway::GatewayError;
use crate::store::StoreError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),

    // Server errors (5xx)
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::VersionConflict { ride_id, expected } => {
                AppError::Domain(DomainError::VersionConflict { ride_id, expected })
            }
            StoreError::NotFound(id) => AppError::Domain(DomainError::RideNotFound(id)),
            StoreError::Database(e) => AppError::Database(e),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::NotFound {
                role: ActorRole::Driver,
                id,
            } => AppError::Domain(DomainError::DriverNotFound(id)),
            GatewayError::NotFound {
                role: ActorRole::Passenger,
                id,
            } => AppError::Domain(DomainError::PassengerNotFound(id)),
            unavailable @ GatewayError::Unavailable { .. } => {
                AppError::ServiceUnavailable(unavailable.to_string())
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, details) = match &self {
            // 400 Bad Request
            AppError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", Some(msg.clone()))
            }

            // Domain errors - map to appropriate HTTP status
            AppError::Domain(domain_err) => match domain_err {
                DomainError::RideNotFound(id) => {
                    (StatusCode::NOT_FOUND, "ride_not_found", Some(id.to_string()))
                }
                DomainError::DriverNotFound(id) => {
                    (StatusCode::NOT_FOUND, "driver_not_found", Some(id.to_string()))
                }
                DomainError::PassengerNotFound(id) => {
                    (StatusCode::NOT_FOUND, "passenger_not_found", Some(id.to_string()))
                }
                DomainError::InvalidProposedStatus { .. } => {
                    (StatusCode::CONFLICT, "invalid_proposed_status", None)
                }
                DomainError::CanceledStatus { .. } => {
                    (StatusCode::CONFLICT, "canceled_status", None)
                }
                DomainError::IrrelevantDriverStatus { .. } => {
                    (StatusCode::CONFLICT, "irrelevant_driver_status", None)
                }
                DomainError::RideClosed(id) => {
                    (StatusCode::CONFLICT, "ride_closed", Some(id.to_string()))
                }
                DomainError::InvalidParameterCount => {
                    (StatusCode::BAD_REQUEST, "invalid_parameter_count", None)
                }
                DomainError::VersionConflict { expected, .. } => (
                    StatusCode::CONFLICT,
                    "version_conflict",
                    Some(format!("expected version {}", expected)),
                ),
            },

            // 503 Service Unavailable
            AppError::ServiceUnavailable(msg) => {
                tracing::warn!("Dependency unavailable: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", Some(msg.clone()))
            }

            // 500 Internal Server Error
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
            AppError::Config(e) => {
                tracing::error!("Config error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "config_error", None)
            }
        };

        let body = ErrorResponse {
            error: self.to_string(),
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_not_found_mapping() {
        assert_eq!(
            status_of(DomainError::RideNotFound(Uuid::new_v4()).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(
                GatewayError::NotFound {
                    role: ActorRole::Passenger,
                    id: 5
                }
                .into()
            ),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_gateway_not_found_keeps_role() {
        let err: AppError = GatewayError::NotFound {
            role: ActorRole::Driver,
            id: 9,
        }
        .into();
        assert!(matches!(err, AppError::Domain(DomainError::DriverNotFound(9))));
    }

    #[test]
    fn test_unavailable_is_503() {
        let err: AppError = GatewayError::Unavailable {
            role: ActorRole::Driver,
            reason: "circuit breaker open".to_string(),
        }
        .into();
        assert_eq!(status_of(err), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_conflicts_are_409() {
        let ride_id = Uuid::new_v4();
        let store: AppError = StoreError::VersionConflict {
            ride_id,
            expected: 3,
        }
        .into();
        assert_eq!(status_of(store), StatusCode::CONFLICT);
        assert_eq!(
            status_of(DomainError::RideClosed(ride_id).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(DomainError::InvalidParameterCount.into()),
            StatusCode::BAD_REQUEST
        );
    }
}
