//! Login and logout endpoints.

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::Json,
};

use crate::auth::{Credentials, TokenResponse};
use crate::error::AppError;
use crate::middleware::auth::extract_token;
use crate::AppState;

/// Exchanges Basic credentials for a session token.
pub async fn get_connect(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, AppError> {
    let credentials = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(Credentials::from_basic_header)
        .ok_or(AppError::Unauthorized)?;

    let response = state.credentials.authenticate(&credentials).await?;
    Ok(Json(response))
}

/// Revokes the presented session token.
pub async fn get_disconnect(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let token = extract_token(&headers).ok_or(AppError::Unauthorized)?;

    // only an established session may disconnect
    state.credentials.resolve(token).await?;
    state.credentials.revoke(token);

    Ok(StatusCode::NO_CONTENT)
}
