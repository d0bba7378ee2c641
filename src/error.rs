//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing reference: {kind} id '{id}'")]
    MissingReference { kind: &'static str, id: String },
    #[error("invalid primary key: table {table_id} column {column}")]
    InvalidPrimaryKey { table_id: String, column: String },
    #[error("duplicate path segment: {0}")]
    DuplicatePathSegment(String),
    #[error("config load: {0}")]
    Load(String),
    #[error("validation: {0}")]
    Validation(String),
}

/// What went wrong in storage. Constraint failures are the caller's fault; the rest are ours.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RepositoryErrorKind {
    /// Missing required field, malformed value, unique or foreign-key violation.
    Constraint,
    /// Connectivity and everything else.
    Storage,
}

pub(crate) const UNIQUE_VIOLATION: &str = "a record with the same value already exists";
pub(crate) const FOREIGN_KEY_VIOLATION: &str = "a referenced record does not exist or is still referenced";
pub(crate) const NOT_NULL_VIOLATION: &str = "a required field is missing";

/// The single error kind every repository raises. `message` is safe to show to clients;
/// the underlying cause stays in `source` for logs.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct RepositoryError {
    pub kind: RepositoryErrorKind,
    pub message: String,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl RepositoryError {
    pub fn constraint(message: impl Into<String>) -> Self {
        RepositoryError {
            kind: RepositoryErrorKind::Constraint,
            message: message.into(),
            source: None,
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        RepositoryError {
            kind: RepositoryErrorKind::Storage,
            message: message.into(),
            source: None,
        }
    }

    /// Constraint failure with one of the standard reasons below.
    pub(crate) fn violated(context: &str, reason: &str) -> Self {
        Self::constraint(format!("{}: {}", context, reason))
    }

    /// Wrap a database error under a context message such as "Failed to create student".
    pub fn from_sqlx(context: impl Into<String>, e: sqlx::Error) -> Self {
        let context = context.into();
        let (kind, message) = match &e {
            sqlx::Error::Database(db) => {
                let reason = match db.kind() {
                    sqlx::error::ErrorKind::UniqueViolation => Some(UNIQUE_VIOLATION),
                    sqlx::error::ErrorKind::ForeignKeyViolation => Some(FOREIGN_KEY_VIOLATION),
                    sqlx::error::ErrorKind::NotNullViolation => Some(NOT_NULL_VIOLATION),
                    sqlx::error::ErrorKind::CheckViolation => Some("a field value is out of range"),
                    _ => None,
                };
                let sqlstate_class = db.code().map(|c| c.chars().take(2).collect::<String>());
                match (reason, sqlstate_class.as_deref()) {
                    (Some(r), _) => (RepositoryErrorKind::Constraint, format!("{}: {}", context, r)),
                    (None, Some("22")) | (None, Some("23")) => (
                        RepositoryErrorKind::Constraint,
                        format!("{}: invalid field value", context),
                    ),
                    _ => (RepositoryErrorKind::Storage, context),
                }
            }
            _ => (RepositoryErrorKind::Storage, context),
        };
        RepositoryError {
            kind,
            message,
            source: Some(Box::new(e)),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Repository(e) => match e.kind {
                RepositoryErrorKind::Constraint => StatusCode::BAD_REQUEST,
                RepositoryErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// SOAP 1.1 fault code: `Client` when the request was at fault, `Server` otherwise.
    pub fn fault_code(&self) -> &'static str {
        if self.status().is_client_error() {
            "Client"
        } else {
            "Server"
        }
    }

    /// Log server-side failures with their cause chain; client errors at debug.
    pub fn log(&self) {
        if self.status().is_server_error() {
            let cause = std::error::Error::source(self).map(|s| s.to_string());
            tracing::error!(error = %self, cause = ?cause, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
    }
}

/// Flat JSON error body: `{ error, message, timestamp }`.
#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    pub timestamp: String,
}

impl ErrorBody {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        ErrorBody {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: message.into(),
            timestamp: crate::config::format_timestamp(Utc::now()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();
        let status = self.status();
        (status, Json(ErrorBody::new(status, self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_bad_request() {
        let error = AppError::Validation("first_name is required".into());
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error.fault_code(), "Client");
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn not_found_maps_to_404() {
        let error = AppError::NotFound("student 7 not found".into());
        assert_eq!(error.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn repository_kinds_split_client_and_server() {
        let constraint = AppError::from(RepositoryError::constraint("Failed to create student: a required field is missing"));
        assert_eq!(constraint.status(), StatusCode::BAD_REQUEST);
        let storage = AppError::from(RepositoryError::storage("Failed to list students"));
        assert_eq!(storage.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(storage.fault_code(), "Server");
        assert_eq!(storage.to_string(), "Failed to list students");
    }

    #[test]
    fn non_database_sqlx_errors_are_storage() {
        let e = RepositoryError::from_sqlx("Failed to get student with ID 1", sqlx::Error::PoolTimedOut);
        assert_eq!(e.kind, RepositoryErrorKind::Storage);
        assert_eq!(e.message, "Failed to get student with ID 1");
        assert!(std::error::Error::source(&e).is_some());
    }

    #[test]
    fn error_body_carries_reason_and_timestamp() {
        let body = ErrorBody::new(StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert_eq!(body.error, "Internal Server Error");
        assert!(body.timestamp.ends_with('Z'));
    }
}
