//! File upload, listing, visibility and content endpoints.

use axum::{
    extract::{Extension, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::files::{
    can_read, ContentStorage, FileFilter, FileResponse, FileStore, FileType, ParentRef,
    UploadRequest,
};
use crate::middleware::auth::{require_user, AuthUser};
use crate::AppState;

/// Path ids parse through the typed identifier parser; anything malformed is
/// reported exactly like an absent file.
fn parse_file_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound)
}

pub async fn post_upload(
    State(state): State<AppState>,
    auth_user: Option<Extension<AuthUser>>,
    Json(request): Json<UploadRequest>,
) -> Result<(StatusCode, Json<FileResponse>), AppError> {
    let user = require_user(auth_user)?;

    let file = state.uploads.upload(user.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(file.into())))
}

pub async fn get_show(
    State(state): State<AppState>,
    auth_user: Option<Extension<AuthUser>>,
    Path(id): Path<String>,
) -> Result<Json<FileResponse>, AppError> {
    let user = require_user(auth_user)?;
    let file_id = parse_file_id(&id)?;

    let file = state
        .files
        .get_owned(file_id, user.user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(file.into()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFilesQuery {
    pub parent_id: Option<String>,
    pub page: Option<String>,
}

pub async fn get_index(
    State(state): State<AppState>,
    auth_user: Option<Extension<AuthUser>>,
    Query(query): Query<ListFilesQuery>,
) -> Result<Json<Vec<FileResponse>>, AppError> {
    let user = require_user(auth_user)?;

    // a missing or non-numeric page silently becomes the first page
    let page = query
        .page
        .as_deref()
        .and_then(|p| p.parse::<u32>().ok())
        .unwrap_or(0);

    let parent_id = match query.parent_id.as_deref() {
        None | Some("0") => None,
        Some(raw) => match ParentRef::parse(raw) {
            Ok(parent) => parent.folder_id(),
            // an unparseable filter matches nothing rather than erroring
            Err(_) => return Ok(Json(Vec::new())),
        },
    };

    let filter = FileFilter {
        owner_id: user.user_id,
        parent_id,
    };

    let files = state.files.list_page(&filter, page).await?;
    Ok(Json(files.into_iter().map(FileResponse::from).collect()))
}

async fn set_visibility(
    state: &AppState,
    auth_user: Option<Extension<AuthUser>>,
    raw_id: &str,
    value: bool,
) -> Result<Json<FileResponse>, AppError> {
    let user = require_user(auth_user)?;
    let file_id = parse_file_id(raw_id)?;

    let file = state
        .files
        .set_public(file_id, user.user_id, value)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(file.into()))
}

pub async fn put_publish(
    State(state): State<AppState>,
    auth_user: Option<Extension<AuthUser>>,
    Path(id): Path<String>,
) -> Result<Json<FileResponse>, AppError> {
    set_visibility(&state, auth_user, &id, true).await
}

pub async fn put_unpublish(
    State(state): State<AppState>,
    auth_user: Option<Extension<AuthUser>>,
    Path(id): Path<String>,
) -> Result<Json<FileResponse>, AppError> {
    set_visibility(&state, auth_user, &id, false).await
}

#[derive(Debug, Deserialize)]
pub struct ContentQuery {
    pub size: Option<String>,
}

/// Streams stored bytes, optionally a thumbnail derivative. Anonymous
/// callers only ever see public files; denial is reported as absence.
pub async fn get_file(
    State(state): State<AppState>,
    auth_user: Option<Extension<AuthUser>>,
    Path(id): Path<String>,
    Query(query): Query<ContentQuery>,
) -> Result<Response, AppError> {
    let caller = auth_user.map(|Extension(user)| user.user_id);
    let file_id = parse_file_id(&id)?;

    let file = state
        .files
        .get_by_id(file_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if !can_read(&file, caller) {
        return Err(AppError::NotFound);
    }

    if file.file_type == FileType::Folder {
        return Err(AppError::BadRequest(
            "A folder doesn't have content".to_string(),
        ));
    }

    let content_ref = file.content_ref.as_deref().ok_or(AppError::NotFound)?;

    let lookup_ref = match query.size.as_deref() {
        None => content_ref.to_string(),
        Some(size) => {
            let width = size.parse::<u32>().map_err(|_| AppError::NotFound)?;
            ContentStorage::derived_ref(content_ref, width)
        }
    };

    let data = state
        .storage
        .read(&lookup_ref)
        .await?
        .ok_or(AppError::NotFound)?;

    let mime = mime_guess::from_path(&file.name).first_or(mime::TEXT_PLAIN_UTF_8);

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        mime.as_ref()
            .parse()
            .unwrap_or_else(|_| "application/octet-stream".parse().unwrap()),
    );

    Ok((StatusCode::OK, headers, data).into_response())
}
