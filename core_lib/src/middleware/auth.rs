//! Session-token middleware.
//!
//! Login uses a `Basic` Authorization header; every call after that presents
//! the opaque token in `X-Token`. The middleware attaches the resolved user
//! when the token checks out and stays silent otherwise; handlers decide
//! whether anonymous access is acceptable.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::error::AppError;
use crate::AppState;

pub const TOKEN_HEADER: &str = "x-token";

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
}

pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    headers.get(TOKEN_HEADER)?.to_str().ok()
}

pub async fn session_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = extract_token(request.headers()) {
        if let Ok(user) = state.credentials.resolve(token).await {
            request.extensions_mut().insert(AuthUser {
                user_id: user.id,
                email: user.email,
            });
        }
    }

    next.run(request).await
}

/// 401 unless the middleware attached a user.
pub fn require_user(auth_user: Option<axum::Extension<AuthUser>>) -> Result<AuthUser, AppError> {
    auth_user
        .map(|axum::Extension(user)| user)
        .ok_or(AppError::Unauthorized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_token_reads_the_x_token_header() {
        let mut headers = HeaderMap::new();
        assert!(extract_token(&headers).is_none());

        headers.insert(TOKEN_HEADER, "abc-123".parse().unwrap());
        assert_eq!(extract_token(&headers), Some("abc-123"));
    }

    #[test]
    fn require_user_rejects_anonymous_callers() {
        let err = require_user(None).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));

        let user = AuthUser {
            user_id: Uuid::new_v4(),
            email: "bob@dylan.com".to_string(),
        };
        let ok = require_user(Some(axum::Extension(user.clone()))).unwrap();
        assert_eq!(ok.user_id, user.user_id);
    }
}
