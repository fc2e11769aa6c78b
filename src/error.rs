use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

/// Every failure the ledger core reports to its callers.
///
/// Each variant carries a human readable message; [`AppError::kind`] is the
/// stable machine readable tag that goes out on the wire.
#[derive(Debug, Display, PartialEq)]
pub enum AppError {
    #[display(fmt = "{}", _0)]
    NotFound(String),

    #[display(fmt = "{}", _0)]
    Conflict(String),

    #[display(fmt = "{}", _0)]
    ValidationFailed(String),

    #[display(fmt = "{}", _0)]
    ConfigurationMissing(String),

    #[display(fmt = "{}", _0)]
    PermissionDenied(String),

    #[display(fmt = "{}", _0)]
    Unauthorized(String),

    #[display(fmt = "data integrity error: {}", _0)]
    Integrity(String),

    #[display(fmt = "database error: {}", _0)]
    Database(String),
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        AppError::Conflict(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::ValidationFailed(msg.into())
    }

    pub fn open_batch(batch_id: &str) -> Self {
        AppError::Conflict(format!(
            "Batch {} already exists and is not rejected/withdrawn",
            batch_id
        ))
    }

    pub fn stale_batch(batch_id: &str) -> Self {
        AppError::Conflict(format!(
            "Batch {} changed while it was being reviewed",
            batch_id
        ))
    }

    pub fn denied(msg: impl Into<String>) -> Self {
        AppError::PermissionDenied(msg.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::ValidationFailed(_) => "validation_failed",
            AppError::ConfigurationMissing(_) => "configuration_missing",
            AppError::PermissionDenied(_) => "permission_denied",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Integrity(_) => "data_integrity",
            AppError::Database(_) => "internal",
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        tracing::error!(error = %e, "Database operation failed");
        AppError::Database(e.to_string())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::ConfigurationMissing(_) | AppError::Integrity(_) | AppError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        // storage details stay in the logs
        let message = match self {
            AppError::Database(_) => "Internal Server Error".to_string(),
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({
            "kind": self.kind(),
            "message": message
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_http_status() {
        assert_eq!(AppError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::conflict("x").status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::validation("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::denied("x").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::ConfigurationMissing("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn display_is_the_message() {
        let err = AppError::conflict("batch already exists");
        assert_eq!(err.to_string(), "batch already exists");
        assert_eq!(err.kind(), "conflict");
    }
}
