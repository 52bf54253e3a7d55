//! JWT access/refresh token issuance and verification (HS256).

use crate::config::settings::AuthSettings;
use crate::entities::Role;
use crate::errors::{Error, Result};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Distinguishes the two halves of a token pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Short-lived token sent with every request
    Access,
    /// Long-lived token exchanged for new access tokens
    Refresh,
}

/// Claims embedded in every token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject, the user id as a string
    pub sub: String,
    /// Role at issuance time
    pub role: Role,
    /// Access or refresh
    pub token_type: TokenType,
    /// Issuer
    pub iss: String,
    /// Issued-at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
    /// Unique token id
    pub jti: String,
}

impl Claims {
    /// Parses the subject back into a user id.
    pub fn user_id(&self) -> Result<i64> {
        self.sub.parse().map_err(|_| Error::Unauthenticated {
            reason: format!("malformed subject {}", self.sub),
        })
    }
}

/// Signs a token of the given type for a user.
pub fn issue_token(
    user_id: i64,
    role: Role,
    token_type: TokenType,
    settings: &AuthSettings,
) -> Result<String> {
    let now = Utc::now().timestamp();
    let lifetime = match token_type {
        TokenType::Access => settings.access_token_lifetime_secs,
        TokenType::Refresh => settings.refresh_token_lifetime_secs,
    };
    let claims = Claims {
        sub: user_id.to_string(),
        role,
        token_type,
        iss: settings.issuer.clone(),
        iat: now,
        exp: now + lifetime,
        jti: Uuid::new_v4().to_string(),
    };
    let key = EncodingKey::from_secret(settings.jwt_secret.as_bytes());
    jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &key)
        .map_err(|e| Error::Crypto(format!("JWT encode: {e}")))
}

/// Verifies signature, expiry, issuer and token type.
pub fn decode_token(token: &str, expected: TokenType, settings: &AuthSettings) -> Result<Claims> {
    let key = DecodingKey::from_secret(settings.jwt_secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&settings.issuer]);
    validation.set_required_spec_claims(&["sub", "exp", "iat", "iss"]);
    validation.leeway = 0;

    let claims = jsonwebtoken::decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| Error::Unauthenticated {
            reason: format!("invalid token: {e}"),
        })?;

    if claims.token_type != expected {
        return Err(Error::Unauthenticated {
            reason: format!("expected {expected:?} token, got {:?}", claims.token_type),
        });
    }
    Ok(claims)
}
