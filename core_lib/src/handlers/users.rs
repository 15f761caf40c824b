//! User registration and identity endpoints.

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::Json,
};
use serde_json::json;

use crate::auth::{RegisterRequest, UserResponse};
use crate::error::AppError;
use crate::middleware::auth::{require_user, AuthUser};
use crate::AppState;

pub async fn post_new(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let user = state.accounts.register(request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_me(
    auth_user: Option<Extension<AuthUser>>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user = require_user(auth_user)?;

    Ok(Json(json!({
        "id": user.user_id,
        "email": user.email,
    })))
}
