use chrono::{Duration, Utc};
use jsonwebtoken::{encode, decode, Header, EncodingKey, DecodingKey, Validation, Algorithm};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{AppError, AuthError};

pub const TOKEN_USE_ACCESS: &str = "access";
pub const TOKEN_USE_REFRESH: &str = "refresh";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,       // User ID
    pub exp: i64,          // Expiration time
    pub iat: i64,          // Issued at
    pub token_use: String, // "access" or "refresh"
}

/// A freshly minted access/refresh pair. Both tokens are bound to the
/// same subject; only the refresh token can be exchanged for a new
/// access token later.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Stateless issuer and verifier of signed tokens. Tokens are
/// self-contained HS256 JWTs; nothing is looked up in storage, and
/// issuance and verification share the same clock.
#[derive(Clone)]
pub struct TokenService {
    jwt_secret: String,
    access_expiry: Duration,
    refresh_expiry: Duration,
}

impl TokenService {
    pub fn new(jwt_secret: String, access_expiry_minutes: i64, refresh_expiry_days: i64) -> Self {
        Self {
            jwt_secret,
            access_expiry: Duration::minutes(access_expiry_minutes),
            refresh_expiry: Duration::days(refresh_expiry_days),
        }
    }

    /// Mint a token pair for a user id. The caller guarantees the
    /// identity exists; no validation happens here.
    pub fn issue(&self, user_id: Uuid) -> Result<TokenPair, AppError> {
        Ok(TokenPair {
            access_token: self.encode_token(user_id, TOKEN_USE_ACCESS, self.access_expiry)?,
            refresh_token: self.encode_token(user_id, TOKEN_USE_REFRESH, self.refresh_expiry)?,
        })
    }

    /// Exchange a refresh token for a new access token. Any parse,
    /// signature, expiry or wrong-use failure collapses to
    /// `InvalidToken`; the cause is logged, never returned.
    pub fn renew(&self, refresh_token: &str) -> Result<String, AppError> {
        let claims = self.decode_token(refresh_token)?;

        if claims.token_use != TOKEN_USE_REFRESH {
            debug!("token presented for renewal is not a refresh token");
            return Err(AuthError::InvalidToken.into());
        }

        let user_id = Uuid::parse_str(&claims.sub).map_err(|e| {
            debug!("refresh token subject is not a valid id: {}", e);
            AppError::from(AuthError::InvalidToken)
        })?;

        self.encode_token(user_id, TOKEN_USE_ACCESS, self.access_expiry)
    }

    fn encode_token(
        &self,
        user_id: Uuid,
        token_use: &str,
        lifetime: Duration,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            exp: (now + lifetime).timestamp(),
            iat: now.timestamp(),
            token_use: token_use.to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::InternalError(format!("Failed to sign token: {}", e)))
    }

    fn decode_token(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map(|data| data.claims)
        .map_err(|e| {
            debug!("refresh token rejected: {}", e);
            AuthError::InvalidToken.into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test_secret".to_string(), 15, 7)
    }

    fn decode_claims(token: &str) -> Claims {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(b"test_secret"),
            &Validation::new(Algorithm::HS256),
        )
        .unwrap()
        .claims
    }

    #[test]
    fn test_issue_binds_subject_to_both_tokens() {
        let tokens = service().issue(Uuid::new_v4()).unwrap();
        let access = decode_claims(&tokens.access_token);
        let refresh = decode_claims(&tokens.refresh_token);

        assert_eq!(access.sub, refresh.sub);
        assert_eq!(access.token_use, TOKEN_USE_ACCESS);
        assert_eq!(refresh.token_use, TOKEN_USE_REFRESH);
        assert!(access.exp < refresh.exp);
    }

    #[test]
    fn test_renew_freshly_issued_refresh_token() {
        let svc = service();
        let user_id = Uuid::new_v4();
        let tokens = svc.issue(user_id).unwrap();

        let renewed = svc.renew(&tokens.refresh_token).unwrap();
        let claims = decode_claims(&renewed);
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.token_use, TOKEN_USE_ACCESS);
    }

    #[test]
    fn test_renew_rejects_access_token() {
        let svc = service();
        let tokens = svc.issue(Uuid::new_v4()).unwrap();

        match svc.renew(&tokens.access_token) {
            Err(AppError::AuthError(AuthError::InvalidToken)) => (),
            other => panic!("expected InvalidToken, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_renew_rejects_garbage() {
        match service().renew("garbage") {
            Err(AppError::AuthError(AuthError::InvalidToken)) => (),
            other => panic!("expected InvalidToken, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_renew_rejects_expired_token() {
        let now = Utc::now();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            exp: (now - Duration::hours(2)).timestamp(),
            iat: (now - Duration::hours(3)).timestamp(),
            token_use: TOKEN_USE_REFRESH.to_string(),
        };
        let stale = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test_secret"),
        )
        .unwrap();

        match service().renew(&stale) {
            Err(AppError::AuthError(AuthError::InvalidToken)) => (),
            other => panic!("expected InvalidToken, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_renew_rejects_foreign_signature() {
        let foreign = TokenService::new("another_secret".to_string(), 15, 7);
        let tokens = foreign.issue(Uuid::new_v4()).unwrap();

        match service().renew(&tokens.refresh_token) {
            Err(AppError::AuthError(AuthError::InvalidToken)) => (),
            other => panic!("expected InvalidToken, got {:?}", other.map(|_| ())),
        }
    }
}
