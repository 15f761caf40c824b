//! Service status and statistics endpoints.

use axum::{extract::State, response::Json};
use serde_json::json;

use crate::auth::UserStore;
use crate::error::Result;
use crate::files::FileStore;
use crate::health::{DatabaseHealthCheck, HealthCheck, SessionStoreHealthCheck};
use crate::AppState;

pub async fn get_status(State(state): State<AppState>) -> Json<serde_json::Value> {
    let db = DatabaseHealthCheck::new(state.db_pool.clone());
    let sessions = SessionStoreHealthCheck::new(state.sessions.clone());

    let mut report = serde_json::Map::new();
    report.insert(db.name().to_string(), json!(db.check().await));
    report.insert(sessions.name().to_string(), json!(sessions.check().await));

    Json(serde_json::Value::Object(report))
}

pub async fn get_stats(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    let users = state.users.count_users().await?;
    let files = state.files.count_files().await?;

    Ok(Json(json!({
        "users": users,
        "files": files,
    })))
}
