use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::auth::password;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    // Never serialized into responses. `None` for accounts provisioned
    // through GitHub login; such accounts cannot pass a password check.
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        username: String,
        password_hash: Option<String>,
        email: Option<String>,
        first_name: String,
        last_name: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username,
            email,
            password_hash,
            first_name,
            last_name,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check a plaintext password against the stored hash. An account with
    /// no stored credential always fails the check, as does a stored hash
    /// that cannot be parsed.
    pub fn verify_password(&self, password: &str) -> bool {
        match &self.password_hash {
            Some(hash) => password::verify_password(password, hash).unwrap_or(false),
            None => false,
        }
    }
}
