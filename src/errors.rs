use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;
use uuid::Uuid;

use crate::validation::FieldViolation;

/// Application-specific error types.
#[derive(Debug)]
pub enum AppError {
    /// Database-related errors.
    DatabaseError(sqlx::Error),
    /// No live lead with this id.
    LeadNotFound(Uuid),
    /// Another live lead already uses this email.
    EmailAlreadyExists(String),
    /// Update payload carried no fields.
    NoFieldsToUpdate,
    /// Payload broke one or more field rules.
    ValidationFailed(Vec<FieldViolation>),
    /// Bad request error (malformed body, bad path parameter).
    BadRequest(String),
    /// Request body over the configured size limit.
    PayloadTooLarge(String),
    /// Internal server error.
    InternalError(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl AppError {
    /// Innermost error, skipping context wrappers.
    pub fn root(&self) -> &AppError {
        match self {
            AppError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// Stable identifier surfaced to clients.
    pub fn code(&self) -> &'static str {
        match self.root() {
            AppError::LeadNotFound(_) => "LEAD_NOT_FOUND",
            AppError::EmailAlreadyExists(_) => "LEAD_EMAIL_ALREADY_EXIST",
            AppError::NoFieldsToUpdate => "NO_FIELDS_TO_UPDATE",
            AppError::ValidationFailed(_) => "VALIDATION_FAILED",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            AppError::DatabaseError(_)
            | AppError::InternalError(_)
            | AppError::WithContext { .. } => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.root() {
            AppError::LeadNotFound(_) => StatusCode::NOT_FOUND,
            AppError::EmailAlreadyExists(_)
            | AppError::NoFieldsToUpdate
            | AppError::ValidationFailed(_)
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::DatabaseError(_)
            | AppError::InternalError(_)
            | AppError::WithContext { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for AppError {
    /// Formats the error for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::DatabaseError(e) => write!(f, "Database error: {}", e),
            AppError::LeadNotFound(id) => write!(f, "Lead not found: {}", id),
            AppError::EmailAlreadyExists(email) => {
                write!(f, "Lead email already exists: {}", email)
            }
            AppError::NoFieldsToUpdate => write!(f, "No fields to update"),
            AppError::ValidationFailed(violations) => {
                write!(f, "Validation failed:")?;
                for v in violations {
                    write!(f, " {} {};", v.field, v.message)?;
                }
                Ok(())
            }
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::PayloadTooLarge(msg) => write!(f, "Payload too large: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Converts the error into an HTTP response.
    ///
    /// Server-side failures are logged here and replaced by a generic message.
    fn into_response(self) -> Response {
        if let AppError::WithContext { source, context } = &self {
            tracing::error!("Error with context: {} -> {}", context, source);
        }

        let status = self.status();
        let code = self.code();
        let body = match self.root() {
            AppError::DatabaseError(e) => {
                tracing::error!("Database error: {:?}", e);
                json!({ "error": code, "message": "Internal server error" })
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                json!({ "error": code, "message": "Internal server error" })
            }
            AppError::ValidationFailed(violations) => json!({
                "error": code,
                "message": "Validation failed",
                "details": violations,
            }),
            AppError::LeadNotFound(_) => json!({ "error": code, "message": "Lead not found" }),
            AppError::EmailAlreadyExists(_) => {
                json!({ "error": code, "message": "Lead email already exists" })
            }
            AppError::NoFieldsToUpdate => {
                json!({ "error": code, "message": "No fields to update" })
            }
            AppError::BadRequest(msg) | AppError::PayloadTooLarge(msg) => {
                json!({ "error": code, "message": msg })
            }
            AppError::WithContext { .. } => {
                json!({ "error": code, "message": "Internal server error" })
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    /// Converts a `sqlx::Error` into an `AppError`.
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err)
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;

    /// Add context lazily (only evaluated on error).
    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T, AppError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: f(),
        })
    }
}

/// Extension for sqlx::Error to add context
impl<T> ResultExt<T> for Result<T, sqlx::Error> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(AppError::DatabaseError(e)),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(AppError::DatabaseError(e)),
            context: f(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::LeadNotFound(Uuid::nil()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::EmailAlreadyExists("a@example.com".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::NoFieldsToUpdate.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::ValidationFailed(vec![]).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::PayloadTooLarge("length limit exceeded".into()).status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            AppError::DatabaseError(sqlx::Error::RowNotFound).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_context_keeps_inner_code() {
        let result: Result<(), AppError> = Err(AppError::LeadNotFound(Uuid::nil()));
        let err = result.context("loading lead").unwrap_err();

        assert_eq!(err.code(), "LEAD_NOT_FOUND");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert!(err.to_string().starts_with("loading lead: "));
    }

    #[test]
    fn test_sqlx_context_is_internal() {
        let result: Result<(), sqlx::Error> = Err(sqlx::Error::PoolTimedOut);
        let err = result.with_context(|| "counting leads".to_string()).unwrap_err();

        assert_eq!(err.code(), "INTERNAL_ERROR");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
