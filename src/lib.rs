pub mod auth;
pub mod config;
pub mod db;
pub mod error;

use std::sync::Arc;
use std::time::Duration;

use actix_web::HttpResponse;

pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use crate::config::Settings;

pub use auth::{AuthService, GitHubClient, TokenPair, TokenService};
pub use db::{DbOperations, User};

/// Health check endpoint handler
/// Returns a JSON response with server status and timestamp
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Application state shared across all request handlers, constructed
/// once at startup and passed by reference into each handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub auth: AuthService,
    pub tokens: TokenService,
}

impl AppState {
    pub async fn new(config: Settings) -> Result<Self> {
        let db = DbOperations::new_with_options(
            &config.database.url,
            config.database.max_connections,
            Duration::from_secs(5),
        )
        .await?;

        let github = GitHubClient::new(
            config.github.api_base.clone(),
            Duration::from_secs(config.github.timeout_seconds),
        )?;

        let tokens = TokenService::new(
            config.auth.jwt_secret.clone(),
            config.auth.access_token_expiry_minutes,
            config.auth.refresh_token_expiry_days,
        );

        Ok(Self {
            config: Arc::new(config),
            auth: AuthService::new(db, github),
            tokens,
        })
    }
}
