//! Bearer-token authentication extractor.

use super::AppState;
use crate::{
    auth::{TokenType, token},
    core::{access::Caller, account},
    entities::user,
    errors::Error,
};
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

/// The account behind a valid access token.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

impl AuthUser {
    /// Access-control identity of the authenticated account.
    pub const fn caller(&self) -> Caller {
        Caller::from_user(&self.0)
    }
}

fn unauthenticated(reason: &str) -> Error {
    Error::Unauthenticated {
        reason: reason.to_string(),
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| unauthenticated("missing authorization header"))?
            .to_str()
            .map_err(|_| unauthenticated("authorization header is not ASCII"))?;
        let (scheme, token) = value
            .split_once(' ')
            .ok_or_else(|| unauthenticated("malformed authorization header"))?;
        if !scheme.eq_ignore_ascii_case("bearer") {
            return Err(unauthenticated("unsupported authorization scheme"));
        }

        let claims = token::decode_token(token.trim(), TokenType::Access, &state.settings.auth)?;
        let user_id = claims.user_id()?;
        let account = account::get_user_by_id(&state.db, user_id)
            .await?
            .ok_or_else(|| unauthenticated("token subject no longer exists"))?;
        Ok(Self(account))
    }
}
