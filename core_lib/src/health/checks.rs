//! Liveness checks for the backing stores.

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::error;

use crate::auth::SessionStore;

#[async_trait]
pub trait HealthCheck: Send + Sync {
    fn name(&self) -> &str;
    async fn check(&self) -> bool;
}

/// Pings the document store with a trivial query.
pub struct DatabaseHealthCheck {
    pool: SqlitePool,
}

impl DatabaseHealthCheck {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HealthCheck for DatabaseHealthCheck {
    fn name(&self) -> &str {
        "db"
    }

    async fn check(&self) -> bool {
        match sqlx::query("SELECT 1").fetch_one(&self.pool).await {
            Ok(_) => true,
            Err(e) => {
                error!("Database health check failed: {}", e);
                false
            }
        }
    }
}

/// Probes the session key-value store.
pub struct SessionStoreHealthCheck {
    store: SessionStore,
}

impl SessionStoreHealthCheck {
    pub fn new(store: SessionStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl HealthCheck for SessionStoreHealthCheck {
    fn name(&self) -> &str {
        "sessions"
    }

    async fn check(&self) -> bool {
        self.store.is_alive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use sqlx::sqlite::SqlitePoolOptions;

    #[tokio::test]
    async fn live_stores_report_healthy() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let db_check = DatabaseHealthCheck::new(pool);
        assert_eq!(db_check.name(), "db");
        assert!(db_check.check().await);

        let sessions = SessionStore::new(&SessionConfig {
            ttl_hours: 24,
            max_sessions: 10,
        });
        let session_check = SessionStoreHealthCheck::new(sessions);
        assert_eq!(session_check.name(), "sessions");
        assert!(session_check.check().await);
    }

    #[tokio::test]
    async fn closed_pool_reports_unhealthy() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let check = DatabaseHealthCheck::new(pool.clone());

        pool.close().await;
        assert!(!check.check().await);
    }
}
