use thiserror::Error;
use actix_web::{ResponseError, HttpResponse, http::StatusCode};
use serde_json::json;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    AuthError(#[from] AuthError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

// Implement conversion from config::ConfigError
impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

// Implement conversion from sqlx::Error
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => AppError::DatabaseError(DatabaseError::NotFound),
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                AppError::DatabaseError(DatabaseError::Duplicate(
                    db.constraint().unwrap_or_default().to_string(),
                ))
            }
            _ => AppError::DatabaseError(DatabaseError::QueryError(err.to_string())),
        }
    }
}

// Add conversion from std::io::Error
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(err.to_string())
    }
}

// Implement actix_web::ResponseError for AppError
impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        // Auth failures render their own short message. Everything else is
        // a 500 with a fixed body; the detail stays in the logs.
        let message = match self {
            AppError::AuthError(e) => e.to_string(),
            _ => "Internal server error".to_string(),
        };
        HttpResponse::build(self.status_code()).json(json!({ "error": message }))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::AuthError(e) => match e {
                AuthError::MissingFields => StatusCode::BAD_REQUEST,
                AuthError::UsernameTaken => StatusCode::BAD_REQUEST,
                AuthError::EmailTaken => StatusCode::BAD_REQUEST,
                AuthError::MissingToken => StatusCode::BAD_REQUEST,
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
                AuthError::ProviderRejected => StatusCode::UNAUTHORIZED,
                AuthError::ProviderUnreachable => StatusCode::INTERNAL_SERVER_ERROR,
            },
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Failures a caller is allowed to observe. Each variant collapses every
/// internal cause into one outcome: an unknown username and a wrong
/// password both surface as `InvalidCredentials`, and a malformed, expired
/// or forged token all surface as `InvalidToken`. Which check actually
/// failed is only visible in debug-level logs.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AuthError {
    #[error("Username and password are required")]
    MissingFields,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Username already exists")]
    UsernameTaken,

    #[error("Email already exists")]
    EmailTaken,

    #[error("Token is required")]
    MissingToken,

    #[error("Invalid refresh token")]
    InvalidToken,

    #[error("GitHub rejected the access token")]
    ProviderRejected,

    #[error("Could not reach GitHub")]
    ProviderUnreachable,
}

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Record not found")]
    NotFound,

    #[error("Duplicate record on constraint {0}")]
    Duplicate(String),
}
