//! Mapping of domain errors to HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bahi_core::settlement::SettlementError;
use bahi_shared::AppError;
use serde_json::json;
use tracing::error;

/// Error returned by handlers, rendered as `{ "error": CODE, "message": text }`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    /// Creates an error with an explicit status.
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    /// HTTP status of this error.
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Error code of this error.
    pub const fn code(&self) -> &'static str {
        self.code
    }

    fn from_parts(status: u16, code: &'static str, message: String) -> Self {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            error!(code, error = %message, "Request failed");
            return Self::new(status, code, "An error occurred");
        }

        Self::new(status, code, message)
    }
}

impl From<SettlementError> for ApiError {
    fn from(e: SettlementError) -> Self {
        Self::from_parts(e.http_status_code(), e.error_code(), e.to_string())
    }
}

impl From<AppError> for ApiError {
    fn from(e: AppError) -> Self {
        Self::from_parts(e.status_code(), e.error_code(), e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({
                "error": self.code,
                "message": self.message
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bahi_core::settlement::StoreError;
    use bahi_shared::types::{CustomerId, SettlementId};

    #[test]
    fn test_validation_errors_keep_message() {
        let err = ApiError::from(SettlementError::TooManyRows { count: 11, max: 10 });

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "TOO_MANY_ROWS");
        assert!(err.message.contains("11"));
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let err = ApiError::from(SettlementError::NotFound(SettlementId::new()));

        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.code(), "SETTLEMENT_NOT_FOUND");
    }

    #[test]
    fn test_store_failures_hide_details() {
        let err = ApiError::from(SettlementError::persist(
            CustomerId::new(),
            StoreError::Backend("connection reset".into()),
        ));

        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "SUBMISSION_FAILED");
        assert_eq!(err.message, "An error occurred");
    }

    #[test]
    fn test_app_error_mapping() {
        let err = ApiError::from(AppError::Validation("bad input".into()));

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }
}
