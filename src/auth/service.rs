use tracing::{debug, info};

use crate::auth::github::{GitHubClient, GitHubProfile};
use crate::auth::password;
use crate::db::models::User;
use crate::db::operations::DbOperations;
use crate::error::{AppError, AuthError, DatabaseError};

/// Namespace prefix for accounts provisioned through GitHub login. A
/// directly-registered username only collides with one of these if the
/// user deliberately registers a `github_`-prefixed name; that collision
/// is an accepted limitation.
pub const GITHUB_USERNAME_PREFIX: &str = "github_";

/// Fields accepted at registration time. Optional names default to the
/// empty string; an empty email is treated as absent.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Clone)]
pub struct AuthService {
    db: DbOperations,
    github: GitHubClient,
}

impl AuthService {
    pub fn new(db: DbOperations, github: GitHubClient) -> Self {
        Self { db, github }
    }

    /// Verify a username/password pair. An unknown username, a wrong
    /// password and an account with no stored credential all yield the
    /// same `InvalidCredentials` outcome.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User, AppError> {
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::MissingFields.into());
        }

        let user = match self.db.find_user_by_username(username).await? {
            Some(user) => user,
            None => {
                debug!("login attempt for unknown username");
                return Err(AuthError::InvalidCredentials.into());
            }
        };

        if !user.verify_password(password) {
            debug!("login attempt with a wrong password or a credential-less account");
            return Err(AuthError::InvalidCredentials.into());
        }

        Ok(user)
    }

    /// Create a local account. Validation order is fixed: missing fields,
    /// then username conflict, then email conflict. A concurrent
    /// duplicate that slips past the pre-checks comes back from the
    /// database as a unique violation and maps to the same errors.
    pub async fn register(&self, new_user: NewUser) -> Result<User, AppError> {
        if new_user.username.is_empty() || new_user.password.is_empty() {
            return Err(AuthError::MissingFields.into());
        }

        if self
            .db
            .find_user_by_username(&new_user.username)
            .await?
            .is_some()
        {
            return Err(AuthError::UsernameTaken.into());
        }

        let email = new_user.email.filter(|e| !e.is_empty());
        if let Some(email) = &email {
            if self.db.find_user_by_email(email).await?.is_some() {
                return Err(AuthError::EmailTaken.into());
            }
        }

        let password_hash = password::hash_password(&new_user.password)?;
        let user = User::new(
            new_user.username,
            Some(password_hash),
            email,
            new_user.first_name,
            new_user.last_name,
        );

        self.db.create_user(&user).await.map_err(map_duplicate)
    }

    /// Resolve a GitHub bearer token to a local account, creating one on
    /// first login. Later logins return the stored account untouched;
    /// profile changes on GitHub are not synced back.
    pub async fn login_with_github(&self, access_token: &str) -> Result<User, AppError> {
        if access_token.is_empty() {
            return Err(AuthError::MissingToken.into());
        }

        let profile = self.github.fetch_profile(access_token).await?;
        let username = format!("{}{}", GITHUB_USERNAME_PREFIX, profile.login);

        if let Some(user) = self.db.find_user_by_username(&username).await? {
            return Ok(user);
        }

        let user = provision_from_profile(&username, profile);
        match self.db.create_user(&user).await {
            Ok(user) => {
                info!("Provisioned new account for GitHub login: {}", user.id);
                Ok(user)
            }
            // Lost a race against a concurrent first login for the same
            // handle; the winner's account is the one to use.
            Err(AppError::DatabaseError(DatabaseError::Duplicate(_))) => self
                .db
                .find_user_by_username(&username)
                .await?
                .ok_or_else(|| {
                    AppError::InternalError("Account missing after duplicate insert".to_string())
                }),
            Err(e) => Err(e),
        }
    }
}

fn map_duplicate(err: AppError) -> AppError {
    match &err {
        AppError::DatabaseError(DatabaseError::Duplicate(constraint)) => {
            if constraint.contains("email") {
                AuthError::EmailTaken.into()
            } else {
                AuthError::UsernameTaken.into()
            }
        }
        _ => err,
    }
}

/// Build the local account for a first-time GitHub login. No password is
/// set: federation-created accounts can only sign in through GitHub.
fn provision_from_profile(username: &str, profile: GitHubProfile) -> User {
    let email = profile
        .email
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| format!("{}@users.noreply.github.com", profile.login));
    let (first_name, last_name) = split_display_name(profile.name.as_deref(), &profile.login);

    User::new(username.to_string(), None, Some(email), first_name, last_name)
}

/// "Ada King Lovelace" becomes ("Ada", "King Lovelace"); a missing or
/// blank display name falls back to the login handle with an empty last
/// name.
fn split_display_name(name: Option<&str>, login: &str) -> (String, String) {
    let mut parts = name.unwrap_or("").split_whitespace();
    match parts.next() {
        Some(first) => (first.to_string(), parts.collect::<Vec<_>>().join(" ")),
        None => (login.to_string(), String::new()),
    }
}
