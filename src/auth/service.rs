//! Login and token refresh orchestration.

use super::{password, token};
use crate::config::settings::AuthSettings;
use crate::entities::{User, user};
use crate::errors::{Error, Result};
use sea_orm::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

/// A freshly issued token pair.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    /// Signed access token
    pub access: String,
    /// Signed refresh token
    pub refresh: String,
}

/// Response to a refresh request.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshedAccess {
    /// New signed access token
    pub access: String,
}

/// Checks credentials and issues an access/refresh pair.
///
/// Unknown usernames and wrong passwords produce the same error.
pub async fn login(
    db: &DatabaseConnection,
    settings: &AuthSettings,
    username: &str,
    password_input: &str,
) -> Result<TokenPair> {
    let invalid = || Error::Unauthenticated {
        reason: "invalid credentials".to_string(),
    };

    let Some(account) = User::find()
        .filter(user::Column::Username.eq(username.trim()))
        .one(db)
        .await?
    else {
        warn!("Login attempt for unknown user");
        return Err(invalid());
    };

    if !password::verify_password(password_input, &account.password_hash)? {
        warn!(user_id = account.id, "Login attempt with wrong password");
        return Err(invalid());
    }

    info!(user_id = account.id, "User logged in");
    Ok(TokenPair {
        access: token::issue_token(account.id, account.role, token::TokenType::Access, settings)?,
        refresh: token::issue_token(account.id, account.role, token::TokenType::Refresh, settings)?,
    })
}

/// Exchanges a refresh token for a new access token.
///
/// The account must still exist; its current role is embedded.
pub async fn refresh(
    db: &DatabaseConnection,
    settings: &AuthSettings,
    refresh_token: &str,
) -> Result<RefreshedAccess> {
    let claims = token::decode_token(refresh_token, token::TokenType::Refresh, settings)?;
    let user_id = claims.user_id()?;
    let account = User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::Unauthenticated {
            reason: format!("user {user_id} no longer exists"),
        })?;

    Ok(RefreshedAccess {
        access: token::issue_token(account.id, account.role, token::TokenType::Access, settings)?,
    })
}
