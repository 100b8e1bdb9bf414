use thiserror::Error;
use actix_web::{ResponseError, HttpResponse, http::StatusCode};
use serde_json::json;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    AuthError(#[from] AuthError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

// libsql has no "row not found" error; repositories raise DatabaseError::NotFound themselves.
impl From<libsql::Error> for AppError {
    fn from(err: libsql::Error) -> Self {
        AppError::DatabaseError(DatabaseError::QueryError(err.to_string()))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(err.to_string())
    }
}

/// Every error body has the shape `{"message": "..."}`, which is what existing clients key off.
impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "message": self.to_string() }))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::AuthError(_) => StatusCode::UNAUTHORIZED,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::DatabaseError(DatabaseError::NotFound) => StatusCode::NOT_FOUND,
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::StorageError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Reasons a request is refused by the authenticator.
///
/// The display strings are part of the HTTP contract and must not change. Several
/// variants intentionally share a message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Unauthorized")]
    MissingHeader,

    #[error("Bad token")]
    MalformedHeader,

    #[error("Invalid token")]
    TokenMalformed,

    #[error("Invalid token")]
    TokenSignatureInvalid,

    #[error("Token expired")]
    TokenExpired,

    #[error("Token expired")]
    TokenNotYetValid,

    #[error("Invalid token")]
    TokenRejected,

    #[error("Invalid tokens")]
    TokenClaimsInvalid,

    #[error("Invalid user")]
    UnknownUser,
}

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Record not found")]
    NotFound,
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("failed to create replica directory: {0}")]
    TempDir(#[source] std::io::Error),

    #[error("failed to open replica connector: {0}")]
    Connector(String),

    #[error("storage handle is closed")]
    Closed,
}
