//! Token authentication extractor.
//!
//! Clients send `Authorization: Token <key>` (`Bearer <key>` is accepted
//! too). Handlers that take [`RequireUser`] only ever see the resolved
//! [`User`]; the token itself goes no further than this module.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::error::{AppError, set_sentry_user};
use crate::models::User;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

/// Extractor that requires a valid API token.
///
/// Rejects with `401 Unauthorized` and `WWW-Authenticate: Token` when the
/// header is missing or malformed, the key is unknown, or the account is
/// inactive.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireUser(user): RequireUser) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireUser(pub User);

/// Pull the token key out of an `Authorization` header value.
fn token_from_header(value: &str) -> Option<&str> {
    let (scheme, key) = value.trim().split_once(' ')?;
    let key = key.trim();
    let scheme_ok = scheme.eq_ignore_ascii_case("token") || scheme.eq_ignore_ascii_case("bearer");
    (scheme_ok && !key.is_empty() && !key.contains(' ')).then_some(key)
}

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| {
                AppError::Unauthorized("Authentication credentials were not provided".to_string())
            })?
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid token header".to_string()))?;

        let key = token_from_header(header_value)
            .ok_or_else(|| AppError::Unauthorized("Invalid token header".to_string()))?;

        let user = AuthService::new(state.store())
            .authenticate(key)
            .await
            .map_err(|e| match e {
                AuthError::Repository(_) => AppError::Auth(e),
                AuthError::InactiveUser => {
                    AppError::Unauthorized("User inactive or deleted".to_string())
                }
                _ => AppError::Unauthorized("Invalid token".to_string()),
            })?;

        set_sentry_user(&user.id, Some(user.email.as_str()));
        tracing::Span::current().record("user_id", user.id.as_i32());

        Ok(Self(user))
    }
}
