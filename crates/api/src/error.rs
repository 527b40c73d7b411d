//! API error types with HTTP response mapping.

use application::{ApplicationError, GeoError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DomainError;
use persistence::PersistenceError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Use case error.
    Application(ApplicationError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Application(err) => application_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn application_error_to_response(err: ApplicationError) -> (StatusCode, String) {
    let status = match &err {
        ApplicationError::InvalidCommand(_) => StatusCode::BAD_REQUEST,
        ApplicationError::Domain(e) if e.is_validation() => StatusCode::BAD_REQUEST,
        ApplicationError::Domain(DomainError::NotFound { .. }) => StatusCode::NOT_FOUND,
        ApplicationError::Persistence(PersistenceError::NotFound { .. }) => StatusCode::NOT_FOUND,
        ApplicationError::Persistence(
            PersistenceError::VersionConflict { .. } | PersistenceError::AlreadyExists { .. },
        ) => StatusCode::CONFLICT,
        ApplicationError::Geo(GeoError::StreetNotFound(_)) => StatusCode::BAD_REQUEST,
        ApplicationError::Geo(GeoError::Unavailable(_)) | ApplicationError::Timeout { .. } => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        tracing::error!(error = %err, "request failed");
    }
    (status, err.to_string())
}

impl From<ApplicationError> for ApiError {
    fn from(err: ApplicationError) -> Self {
        ApiError::Application(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{OrderId, Version};
    use domain::OrderStatus;

    fn status_of(err: ApplicationError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn test_validation_errors_are_bad_requests() {
        assert_eq!(
            status_of(ApplicationError::InvalidCommand("street".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(DomainError::ValueRequired { field: "name" }.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(GeoError::StreetNotFound("Arbat".into()).into()),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_not_found_and_conflicts() {
        assert_eq!(
            status_of(
                PersistenceError::NotFound {
                    aggregate_type: "Courier",
                    id: "42".into(),
                }
                .into()
            ),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(
                PersistenceError::VersionConflict {
                    aggregate_type: "Order",
                    id: OrderId::new().to_string(),
                    expected: Version::initial(),
                }
                .into()
            ),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_other_errors_are_internal() {
        assert_eq!(
            status_of(
                DomainError::InvalidState {
                    current: OrderStatus::Completed,
                    target: OrderStatus::Assigned,
                }
                .into()
            ),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
