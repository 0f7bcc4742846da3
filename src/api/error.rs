//! Translation of service failures into HTTP responses.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{error, warn};
use validator::Validate;

use crate::domain::error::codes;
use crate::domain::{AppError, ErrorResponse, ValidationError};

/// Error returned by every connector handler
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    /// Shape `err` for a handler family.
    ///
    /// Validation errors become 400 with their violations, domain errors pass
    /// through, anything else is reported as unexpected under `code`.
    #[must_use]
    pub fn from_app(err: AppError, code: &str) -> Self {
        match err {
            AppError::Validation(validation) => Self::validation(&validation),
            AppError::Domain(domain) => Self {
                status: StatusCode::FORBIDDEN,
                body: ErrorResponse {
                    message: domain.message,
                    code: domain.code,
                    errors: Vec::new(),
                },
            },
            other => {
                error!(error = %other, code, "Unexpected error");
                Self {
                    status: StatusCode::FORBIDDEN,
                    body: ErrorResponse {
                        message: format!("Unexpected error occurred. Reason: {}", other.reason()),
                        code: code.to_string(),
                        errors: Vec::new(),
                    },
                }
            }
        }
    }

    #[must_use]
    pub fn validation(err: &ValidationError) -> Self {
        warn!(error = %err, "Request rejected");
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorResponse {
                message: "Validation failed".to_string(),
                code: codes::VALIDATION.to_string(),
                errors: err.violations(),
            },
        }
    }

    fn malformed(message: String) -> Self {
        Self::validation(&ValidationError::Malformed(message))
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn body(&self) -> &ErrorResponse {
        &self.body
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::malformed(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::malformed(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::malformed(rejection.body_text())
    }
}

/// Run the derived validation rules of an extracted value.
pub(crate) fn validate<T: Validate>(value: &T) -> Result<(), ApiError> {
    value
        .validate()
        .map_err(|e| ApiError::validation(&ValidationError::from(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DomainError, UpstreamError};

    #[test]
    fn test_domain_error_passes_through() {
        let err = ApiError::from_app(
            DomainError::transaction_not_found().into(),
            codes::MULTI_TOKEN,
        );
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.body().code, codes::TX_NOT_FOUND);
    }

    #[test]
    fn test_unexpected_error_is_wrapped_with_family_code() {
        let upstream = UpstreamError::from_response(
            400,
            r#"{"message":{"message":"overspend"}}"#,
        );
        let err = ApiError::from_app(upstream.into(), codes::ALGO);
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.body().message, "Unexpected error occurred. Reason: overspend");
        assert_eq!(err.body().code, "algo.error");
    }

    #[test]
    fn test_validation_error_lists_violations() {
        let err = ApiError::from_app(
            ValidationError::InvalidField {
                field: "txData".to_string(),
                message: "Transaction data must be hex".to_string(),
            }
            .into(),
            codes::ALGO,
        );
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.body().errors.len(), 1);
        assert_eq!(err.body().errors[0].field, "txData");
    }
}
