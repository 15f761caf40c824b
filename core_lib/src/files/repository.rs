use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::error::{AppError, Result};
use super::models::{File, FileFilter, FileType, ParentRef, PAGE_SIZE};

#[async_trait]
pub trait FileStore: Send + Sync {
    async fn create(&self, file: &File) -> Result<File>;
    /// Unscoped lookup, used by public-access checks.
    async fn get_by_id(&self, id: Uuid) -> Result<Option<File>>;
    /// Lookup scoped to an owner.
    async fn get_owned(&self, id: Uuid, owner_id: Uuid) -> Result<Option<File>>;
    /// One page of `PAGE_SIZE` entries, most recent first.
    async fn list_page(&self, filter: &FileFilter, page: u32) -> Result<Vec<File>>;
    /// Owner-scoped atomic visibility flip; `None` when no matching row.
    async fn set_public(&self, id: Uuid, owner_id: Uuid, value: bool) -> Result<Option<File>>;
    async fn count_files(&self) -> Result<u64>;
}

#[derive(Clone)]
pub struct FileRepository {
    pool: SqlitePool,
}

impl FileRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn ensure_tables_exist(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS files (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                name TEXT NOT NULL,
                file_type TEXT NOT NULL,
                is_public INTEGER NOT NULL DEFAULT 0,
                parent_id TEXT NOT NULL DEFAULT '0',
                content_ref TEXT,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_files_owner_id ON files(owner_id)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_files_parent_id ON files(parent_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    fn row_to_file(row: &sqlx::sqlite::SqliteRow) -> Result<File> {
        let id: String = row.get("id");
        let owner_id: String = row.get("owner_id");
        let file_type: String = row.get("file_type");
        let parent_id: String = row.get("parent_id");
        let created_at: String = row.get("created_at");

        Ok(File {
            id: Uuid::parse_str(&id)
                .map_err(|e| AppError::Database(format!("Invalid file id: {}", e)))?,
            owner_id: Uuid::parse_str(&owner_id)
                .map_err(|e| AppError::Database(format!("Invalid owner id: {}", e)))?,
            name: row.get("name"),
            file_type: FileType::parse(&file_type)
                .ok_or_else(|| AppError::Database(format!("Invalid file type: {}", file_type)))?,
            is_public: row.get::<i64, _>("is_public") != 0,
            parent: ParentRef::parse(&parent_id)
                .map_err(|e| AppError::Database(format!("Invalid parent id: {}", e)))?,
            content_ref: row.get("content_ref"),
            created_at: DateTime::parse_from_rfc3339(&created_at)
                .map_err(|e| AppError::Database(format!("Failed to parse created_at: {}", e)))?
                .with_timezone(&Utc),
        })
    }
}

#[async_trait]
impl FileStore for FileRepository {
    async fn create(&self, file: &File) -> Result<File> {
        sqlx::query(
            r#"
            INSERT INTO files (id, owner_id, name, file_type, is_public, parent_id, content_ref, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(file.id.to_string())
        .bind(file.owner_id.to_string())
        .bind(&file.name)
        .bind(file.file_type.to_string())
        .bind(file.is_public as i64)
        .bind(file.parent.as_wire())
        .bind(&file.content_ref)
        .bind(file.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(file.clone())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<File>> {
        let row = sqlx::query(
            "SELECT id, owner_id, name, file_type, is_public, parent_id, content_ref, created_at
             FROM files WHERE id = ?1",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_file).transpose()
    }

    async fn get_owned(&self, id: Uuid, owner_id: Uuid) -> Result<Option<File>> {
        let row = sqlx::query(
            "SELECT id, owner_id, name, file_type, is_public, parent_id, content_ref, created_at
             FROM files WHERE id = ?1 AND owner_id = ?2",
        )
        .bind(id.to_string())
        .bind(owner_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_file).transpose()
    }

    async fn list_page(&self, filter: &FileFilter, page: u32) -> Result<Vec<File>> {
        // rowid order is insertion order, which keeps same-instant creates
        // strictly ordered.
        let rows = match filter.parent_id {
            Some(parent_id) => {
                sqlx::query(
                    "SELECT id, owner_id, name, file_type, is_public, parent_id, content_ref, created_at
                     FROM files WHERE owner_id = ?1 AND parent_id = ?2
                     ORDER BY rowid DESC LIMIT ?3 OFFSET ?4",
                )
                .bind(filter.owner_id.to_string())
                .bind(parent_id.to_string())
                .bind(PAGE_SIZE as i64)
                .bind((page as i64) * (PAGE_SIZE as i64))
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT id, owner_id, name, file_type, is_public, parent_id, content_ref, created_at
                     FROM files WHERE owner_id = ?1
                     ORDER BY rowid DESC LIMIT ?2 OFFSET ?3",
                )
                .bind(filter.owner_id.to_string())
                .bind(PAGE_SIZE as i64)
                .bind((page as i64) * (PAGE_SIZE as i64))
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.iter().map(Self::row_to_file).collect()
    }

    async fn set_public(&self, id: Uuid, owner_id: Uuid, value: bool) -> Result<Option<File>> {
        let rows_affected = sqlx::query(
            "UPDATE files SET is_public = ?1 WHERE id = ?2 AND owner_id = ?3",
        )
        .bind(value as i64)
        .bind(id.to_string())
        .bind(owner_id.to_string())
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Ok(None);
        }

        self.get_owned(id, owner_id).await
    }

    async fn count_files(&self) -> Result<u64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM files")
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get::<i64, _>("count") as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn create_test_repository() -> FileRepository {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let repo = FileRepository::new(pool);
        repo.ensure_tables_exist().await.unwrap();
        repo
    }

    fn new_file(owner_id: Uuid, name: &str, file_type: FileType, parent: ParentRef) -> File {
        File {
            id: Uuid::new_v4(),
            owner_id,
            name: name.to_string(),
            file_type,
            is_public: false,
            parent,
            content_ref: file_type.has_content().then(|| Uuid::new_v4().to_string()),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn create_and_lookup_scoped_and_unscoped() {
        let repo = create_test_repository().await;
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();

        let file = new_file(owner, "notes.txt", FileType::File, ParentRef::Root);
        repo.create(&file).await.unwrap();

        let fetched = repo.get_by_id(file.id).await.unwrap().unwrap();
        assert_eq!(fetched, file);

        assert!(repo.get_owned(file.id, owner).await.unwrap().is_some());
        assert!(repo.get_owned(file.id, other).await.unwrap().is_none());
        assert!(repo.get_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_page_caps_orders_and_does_not_repeat() {
        let repo = create_test_repository().await;
        let owner = Uuid::new_v4();

        let mut names = Vec::new();
        for i in 0..45 {
            let name = format!("f{:02}", i);
            repo.create(&new_file(owner, &name, FileType::File, ParentRef::Root))
                .await
                .unwrap();
            names.push(name);
        }

        let filter = FileFilter {
            owner_id: owner,
            parent_id: None,
        };

        let page0 = repo.list_page(&filter, 0).await.unwrap();
        let page1 = repo.list_page(&filter, 1).await.unwrap();
        let page2 = repo.list_page(&filter, 2).await.unwrap();
        let page3 = repo.list_page(&filter, 3).await.unwrap();

        assert_eq!(page0.len(), 20);
        assert_eq!(page1.len(), 20);
        assert_eq!(page2.len(), 5);
        assert!(page3.is_empty());

        // most recent first
        assert_eq!(page0[0].name, "f44");
        assert_eq!(page2[4].name, "f00");

        let mut seen = std::collections::HashSet::new();
        for file in page0.iter().chain(&page1).chain(&page2) {
            assert!(seen.insert(file.id), "page overlap on {}", file.name);
        }
        assert_eq!(seen.len(), 45);
    }

    #[tokio::test]
    async fn list_page_filters_by_owner_and_parent() {
        let repo = create_test_repository().await;
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();

        let folder = new_file(owner, "docs", FileType::Folder, ParentRef::Root);
        repo.create(&folder).await.unwrap();
        repo.create(&new_file(owner, "in-folder", FileType::File, ParentRef::Folder(folder.id)))
            .await
            .unwrap();
        repo.create(&new_file(owner, "at-root", FileType::File, ParentRef::Root))
            .await
            .unwrap();
        repo.create(&new_file(stranger, "not-mine", FileType::File, ParentRef::Root))
            .await
            .unwrap();

        let all_mine = repo
            .list_page(
                &FileFilter {
                    owner_id: owner,
                    parent_id: None,
                },
                0,
            )
            .await
            .unwrap();
        assert_eq!(all_mine.len(), 3);

        let in_folder = repo
            .list_page(
                &FileFilter {
                    owner_id: owner,
                    parent_id: Some(folder.id),
                },
                0,
            )
            .await
            .unwrap();
        assert_eq!(in_folder.len(), 1);
        assert_eq!(in_folder[0].name, "in-folder");

        // a filter on a folder that does not exist is an empty page
        let nowhere = repo
            .list_page(
                &FileFilter {
                    owner_id: owner,
                    parent_id: Some(Uuid::new_v4()),
                },
                0,
            )
            .await
            .unwrap();
        assert!(nowhere.is_empty());
    }

    #[tokio::test]
    async fn set_public_is_owner_scoped_and_idempotent() {
        let repo = create_test_repository().await;
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();

        let file = new_file(owner, "a.png", FileType::Image, ParentRef::Root);
        repo.create(&file).await.unwrap();

        let published = repo.set_public(file.id, owner, true).await.unwrap().unwrap();
        assert!(published.is_public);

        // flipping again is not an error and keeps the value
        let again = repo.set_public(file.id, owner, true).await.unwrap().unwrap();
        assert!(again.is_public);

        let unpublished = repo.set_public(file.id, owner, false).await.unwrap().unwrap();
        assert!(!unpublished.is_public);

        assert!(repo.set_public(file.id, stranger, true).await.unwrap().is_none());
        assert!(repo.set_public(Uuid::new_v4(), owner, true).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn count_tracks_all_owners() {
        let repo = create_test_repository().await;
        assert_eq!(repo.count_files().await.unwrap(), 0);

        repo.create(&new_file(Uuid::new_v4(), "x", FileType::File, ParentRef::Root))
            .await
            .unwrap();
        repo.create(&new_file(Uuid::new_v4(), "y", FileType::Folder, ParentRef::Root))
            .await
            .unwrap();
        assert_eq!(repo.count_files().await.unwrap(), 2);
    }
}
