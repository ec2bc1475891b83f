use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use crate::auth::service::NewUser;
use crate::auth::tokens::TokenPair;
use crate::db::models::User;
use crate::error::{AppError, AuthError};
use crate::AppState;

// Body fields default to empty strings so that absent and empty inputs
// take the same validation path instead of a deserializer error.

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: String,
}

/// Body for federated login. `access_token` is GitHub's bearer token,
/// not one of this system's own tokens.
#[derive(Debug, Deserialize)]
pub struct GitHubLoginRequest {
    #[serde(default)]
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    pub first_name: String,
    pub last_name: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserResponse,
}

impl AuthResponse {
    fn new(message: &str, tokens: TokenPair, user: &User) -> Self {
        Self {
            message: message.to_string(),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            user: UserResponse::from(user),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
}

pub async fn login(
    req: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Received login request for username: {}", req.username);
    match state.auth.authenticate(&req.username, &req.password).await {
        Ok(user) => {
            let tokens = state.tokens.issue(user.id)?;
            info!("Login successful for user {}", user.id);
            Ok(HttpResponse::Ok().json(AuthResponse::new("Login successful", tokens, &user)))
        }
        Err(e) => {
            error!("Login failed for username {}: {}", req.username, e);
            Err(e)
        }
    }
}

pub async fn register(
    req: web::Json<RegisterRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Received registration request for username: {}", req.username);
    let req = req.into_inner();
    let new_user = NewUser {
        username: req.username,
        password: req.password,
        email: req.email,
        first_name: req.first_name,
        last_name: req.last_name,
    };

    match state.auth.register(new_user).await {
        Ok(user) => {
            let tokens = state.tokens.issue(user.id)?;
            info!("Registration successful for user {}", user.id);
            Ok(HttpResponse::Created().json(AuthResponse::new(
                "User created successfully",
                tokens,
                &user,
            )))
        }
        Err(e) => {
            error!("Registration failed: {}", e);
            Err(e)
        }
    }
}

pub async fn refresh(
    req: web::Json<RefreshRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    if req.refresh_token.is_empty() {
        return Err(AuthError::MissingToken.into());
    }

    let access_token = state.tokens.renew(&req.refresh_token).map_err(|e| {
        error!("Token refresh failed: {}", e);
        e
    })?;

    Ok(HttpResponse::Ok().json(RefreshResponse { access_token }))
}

pub async fn github_login(
    req: web::Json<GitHubLoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Received GitHub login request");
    match state.auth.login_with_github(&req.access_token).await {
        Ok(user) => {
            let tokens = state.tokens.issue(user.id)?;
            info!("GitHub login successful for user {}", user.id);
            Ok(HttpResponse::Ok().json(AuthResponse::new("Login successful", tokens, &user)))
        }
        Err(e) => {
            error!("GitHub login failed: {}", e);
            Err(e)
        }
    }
}
