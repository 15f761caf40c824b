//! HTTP route table.

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::AppState;
use super::{app, auth, files, users};

pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(app::get_status))
        .route("/stats", get(app::get_stats))
        .route("/connect", get(auth::get_connect))
        .route("/disconnect", get(auth::get_disconnect))
        .route("/users", post(users::post_new))
        .route("/users/me", get(users::get_me))
        .route("/files", post(files::post_upload).get(files::get_index))
        .route("/files/:id", get(files::get_show))
        .route("/files/:id/publish", put(files::put_publish))
        .route("/files/:id/unpublish", put(files::put_unpublish))
        .route("/files/:id/data", get(files::get_file))
}
