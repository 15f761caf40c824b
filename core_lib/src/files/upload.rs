use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::Utc;
use tracing::{error, info};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::jobs::{JobKind, JobQueue};
use super::models::{File, FileType, ParentRef, UploadRequest};
use super::repository::FileStore;
use super::storage::ContentStorage;

/// Validates and persists new uploads, and hands images to the thumbnail
/// pipeline once the record is durable.
#[derive(Clone)]
pub struct UploadService {
    files: Arc<dyn FileStore>,
    storage: ContentStorage,
    queue: JobQueue,
}

impl UploadService {
    pub fn new(files: Arc<dyn FileStore>, storage: ContentStorage, queue: JobQueue) -> Self {
        Self {
            files,
            storage,
            queue,
        }
    }

    pub async fn upload(&self, caller_id: Uuid, request: UploadRequest) -> Result<File> {
        let name = request
            .name
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| AppError::BadRequest("Missing name".to_string()))?;

        let file_type = request
            .file_type
            .as_deref()
            .and_then(FileType::parse)
            .ok_or_else(|| AppError::BadRequest("Missing type".to_string()))?;

        if file_type.has_content() && request.data.is_none() {
            return Err(AppError::BadRequest("Missing data".to_string()));
        }

        let parent = match request.parent_id {
            None => ParentRef::Root,
            Some(value) => ParentRef::from_value(&value)
                .map_err(|_| AppError::BadRequest("Parent not found".to_string()))?,
        };

        if let Some(parent_id) = parent.folder_id() {
            let parent_file = self
                .files
                .get_by_id(parent_id)
                .await?
                .ok_or_else(|| AppError::BadRequest("Parent not found".to_string()))?;

            if parent_file.file_type != FileType::Folder {
                return Err(AppError::BadRequest("Parent is not a folder".to_string()));
            }
        }

        // Folders ignore any data payload.
        let content = if file_type.has_content() {
            let encoded = request.data.as_deref().unwrap_or_default();
            let decoded = STANDARD
                .decode(encoded)
                .map_err(|_| AppError::BadRequest("Missing data".to_string()))?;
            Some(decoded)
        } else {
            None
        };

        let content_ref = match content {
            Some(bytes) => Some(self.storage.store(&bytes).await?),
            None => None,
        };

        let file = File {
            id: Uuid::new_v4(),
            owner_id: caller_id,
            name,
            file_type,
            is_public: request.is_public.unwrap_or(false),
            parent,
            content_ref,
            created_at: Utc::now(),
        };

        let file = self.files.create(&file).await?;
        info!("Created {} {} for user {}", file.file_type, file.id, caller_id);

        if file.file_type == FileType::Image {
            // The record is already durable; losing the job only delays
            // derivative generation, so the upload is not rolled back.
            match self.queue.submit(JobKind::Thumbnail {
                owner_id: caller_id,
                file_id: file.id,
            }) {
                Ok(job_id) => info!("Queued thumbnail job {} for file {}", job_id, file.id),
                Err(e) => error!("Failed to queue thumbnail job for file {}: {}", file.id, e),
            }
        }

        Ok(file)
    }
}
