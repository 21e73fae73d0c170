use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::{AppState, accounts, error::AppError};

/// The authenticated caller, resolved from `Authorization: Token <key>`
/// (`Bearer <key>` is accepted too).
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: i32,
    pub token: String,
}

fn token_from_header(value: &str) -> Option<&str> {
    let (scheme, key) = value.split_once(' ')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    (scheme.eq_ignore_ascii_case("token") || scheme.eq_ignore_ascii_case("bearer")).then_some(key)
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Unauthorized("authentication credentials were not provided"))?;

        let token = token_from_header(header)
            .ok_or(AppError::Unauthorized("expected `Authorization: Token <key>`"))?;

        let user_id = accounts::resolve_token(&state.db, token).await?;
        Ok(AuthUser { user_id, token: token.to_string() })
    }
}
