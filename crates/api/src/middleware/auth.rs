//! Bearer token authentication.
//!
//! Clients send `Authorization: Bearer <token>`. The token is looked up in
//! the users table and must not be expired.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use chrono::Utc;
use tracing::Span;

use food_delivery_core::Principal;

use crate::error::{AppError, set_sentry_user};
use crate::state::AppState;

/// Extractor that requires an authenticated caller.
///
/// Rejects with 401 when the header is missing, malformed, unknown or
/// expired.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireUser(caller): RequireUser,
/// ) -> impl IntoResponse {
///     format!("Hello, user {}!", caller.user_id)
/// }
/// ```
pub struct RequireUser(pub Principal);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?;

        let user = state
            .store()
            .find_by_token(token, Utc::now())
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid or expired token".to_string()))?;

        Span::current().record("user_id", user.id.as_i32());
        set_sentry_user(&user.id, Some(&user.email));

        Ok(Self(user.principal()))
    }
}

/// The token of an `Authorization: Bearer` header, if present.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();

    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
