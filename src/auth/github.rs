use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::error::{AppError, AuthError};

/// Profile document returned by GitHub for a bearer token. Consumed
/// during account resolution and discarded; never persisted verbatim.
#[derive(Debug, Deserialize)]
pub struct GitHubProfile {
    pub id: i64,
    pub login: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

/// Thin client for GitHub's identity endpoint. The request is bounded by
/// a timeout; expiry counts as the provider being unreachable.
#[derive(Clone)]
pub struct GitHubClient {
    http: Client,
    api_base: String,
}

impl GitHubClient {
    pub fn new(api_base: String, timeout: Duration) -> Result<Self, AppError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::InternalError(format!("Failed to build GitHub client: {}", e)))?;

        Ok(Self { http, api_base })
    }

    /// Fetch the profile for a bearer token. A non-success status means
    /// GitHub rejected the token; a transport failure means GitHub was
    /// unreachable; an undecodable body is an internal error.
    pub async fn fetch_profile(&self, bearer_token: &str) -> Result<GitHubProfile, AppError> {
        let response = self
            .http
            .get(format!("{}/user", self.api_base))
            .bearer_auth(bearer_token)
            // GitHub's API rejects requests without a User-Agent.
            .header(reqwest::header::USER_AGENT, "authgate-server")
            .send()
            .await
            .map_err(|e| {
                debug!("GitHub profile request failed: {}", e);
                AppError::from(AuthError::ProviderUnreachable)
            })?;

        if !response.status().is_success() {
            debug!("GitHub returned {} for profile request", response.status());
            return Err(AuthError::ProviderRejected.into());
        }

        response.json::<GitHubProfile>().await.map_err(|e| {
            debug!("GitHub profile response could not be decoded: {}", e);
            AppError::InternalError("Unexpected GitHub profile response".to_string())
        })
    }
}
