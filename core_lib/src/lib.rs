//! Core library containing business logic and route handlers for the
//! file-storage service.

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod files;
pub mod handlers;
pub mod health;
pub mod jobs;
pub mod middleware;

pub use auth::{AccountService, CredentialService, SessionStore, UserRepository, UserStore};
pub use config::AppConfig;
pub use database::get_database_pool;
pub use error::{AppError, Result};
pub use files::{ContentStorage, FileRepository, FileStore, UploadService};
pub use handlers::routes::create_routes;
pub use jobs::{JobQueue, WorkerContext, WorkerPool};

use axum::{middleware as axum_middleware, Router};
use sqlx::SqlitePool;
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub app_name: String,
    pub version: String,
    pub db_pool: SqlitePool,
    pub sessions: SessionStore,
    pub storage: ContentStorage,
    pub users: Arc<dyn UserStore>,
    pub files: Arc<dyn FileStore>,
    pub credentials: CredentialService,
    pub accounts: AccountService,
    pub uploads: UploadService,
    pub job_queue: JobQueue,
}

impl AppState {
    /// Wires every component against the given pool and queue, creating the
    /// schema and the storage root as needed.
    pub async fn initialize(
        config: &AppConfig,
        pool: SqlitePool,
        job_queue: JobQueue,
    ) -> Result<Self> {
        let user_repository = UserRepository::new(pool.clone());
        user_repository.ensure_tables_exist().await?;

        let file_repository = FileRepository::new(pool.clone());
        file_repository.ensure_tables_exist().await?;

        let users: Arc<dyn UserStore> = Arc::new(user_repository);
        let files: Arc<dyn FileStore> = Arc::new(file_repository);

        let sessions = SessionStore::new(&config.sessions);
        let storage = ContentStorage::new(config.storage.root.clone());
        storage.initialize().await?;

        let credentials = CredentialService::new(users.clone(), sessions.clone());
        let accounts = AccountService::new(users.clone(), job_queue.clone());
        let uploads = UploadService::new(files.clone(), storage.clone(), job_queue.clone());

        Ok(Self {
            app_name: "Files Manager".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            db_pool: pool,
            sessions,
            storage,
            users,
            files,
            credentials,
            accounts,
            uploads,
            job_queue,
        })
    }

    /// Store handles for the worker process consuming the job queue.
    pub fn worker_context(&self) -> WorkerContext {
        WorkerContext {
            files: self.files.clone(),
            users: self.users.clone(),
            storage: self.storage.clone(),
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let mut router = Router::new().merge(create_routes());

    router = router.layer(middleware::cors::cors_layer());

    router = router.layer(axum_middleware::from_fn_with_state(
        state.clone(),
        middleware::auth::session_auth_middleware,
    ));

    router = router.layer(middleware::logging::logging_layer());

    router.with_state(state)
}

pub async fn run_server(app: Router, addr: SocketAddr) -> Result<()> {
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
