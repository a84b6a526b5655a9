//! User account route handlers.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Deserialize;

use super::json_body;
use crate::error::Result;
use crate::middleware::RequireUser;
use crate::services::auth::{AuthService, ProfileUpdate};
use crate::state::AppState;
use crate::views::{TokenView, UserView};

/// Registration form.
#[derive(Debug, Deserialize)]
pub struct RegisterInput {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
}

/// Login form.
#[derive(Debug, Deserialize)]
pub struct TokenInput {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Register a new user.
pub async fn create(
    State(state): State<AppState>,
    body: std::result::Result<Json<RegisterInput>, JsonRejection>,
) -> Result<(StatusCode, Json<UserView>)> {
    let input = json_body(body)?;
    let user = AuthService::new(state.store())
        .register(&input.email, &input.password, &input.name)
        .await?;
    Ok((StatusCode::CREATED, Json(UserView::from(&user))))
}

/// Exchange email and password for an API token.
pub async fn token(
    State(state): State<AppState>,
    body: std::result::Result<Json<TokenInput>, JsonRejection>,
) -> Result<Json<TokenView>> {
    let input = json_body(body)?;
    let token = AuthService::new(state.store())
        .issue_token(&input.email, &input.password)
        .await?;
    Ok(Json(TokenView { token }))
}

/// Show the caller's profile.
pub async fn me(RequireUser(user): RequireUser) -> Json<UserView> {
    Json(UserView::from(&user))
}

/// Update the caller's profile.
pub async fn update_me(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    body: std::result::Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<Json<UserView>> {
    let update = json_body(body)?;
    let user = AuthService::new(state.store())
        .update_profile(&user, update)
        .await?;
    Ok(Json(UserView::from(&user)))
}
