use std::io::Cursor;
use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::UserStore;
use crate::files::{ContentStorage, FileStore};
use super::models::{Job, JobError, JobKind, THUMBNAIL_WIDTHS};

/// Store handles the workers resolve jobs against.
#[derive(Clone)]
pub struct WorkerContext {
    pub files: Arc<dyn FileStore>,
    pub users: Arc<dyn UserStore>,
    pub storage: ContentStorage,
}

pub struct WorkerPool {
    worker_count: usize,
}

impl WorkerPool {
    /// Spawns `worker_count` consumers over a shared receiver. Workers run
    /// until the queue side is dropped.
    pub fn start(
        worker_count: usize,
        receiver: mpsc::UnboundedReceiver<Job>,
        context: WorkerContext,
    ) -> Self {
        let shared_receiver = Arc::new(tokio::sync::Mutex::new(receiver));
        let semaphore = Arc::new(Semaphore::new(worker_count));

        for worker_id in 0..worker_count {
            let worker = JobWorker {
                id: worker_id,
                receiver: shared_receiver.clone(),
                context: context.clone(),
                semaphore: semaphore.clone(),
            };

            tokio::spawn(async move {
                worker.run().await;
            });
        }

        info!("Started {} pipeline workers", worker_count);

        Self { worker_count }
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }
}

struct JobWorker {
    id: usize,
    receiver: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<Job>>>,
    context: WorkerContext,
    semaphore: Arc<Semaphore>,
}

impl JobWorker {
    async fn run(self) {
        info!("Worker {} started", self.id);

        loop {
            let job = {
                let mut receiver = self.receiver.lock().await;
                receiver.recv().await
            };

            match job {
                Some(job) => {
                    let _permit = match self.semaphore.acquire().await {
                        Ok(permit) => permit,
                        Err(_) => {
                            error!("Worker {} failed to acquire semaphore permit", self.id);
                            continue;
                        }
                    };

                    self.process_job(job).await;
                }
                None => {
                    warn!("Worker {} stopped - queue closed", self.id);
                    break;
                }
            }
        }
    }

    async fn process_job(&self, mut job: Job) {
        info!("Worker {} processing job {} ({:?})", self.id, job.id, job.kind);
        job.start();

        match execute_job(&self.context, &job.kind).await {
            Ok(()) => {
                job.complete();
                info!("Worker {} completed job {}", self.id, job.id);
            }
            Err(e) => {
                if e.is_permanent() {
                    error!("Worker {} permanently failed job {}: {}", self.id, job.id, e);
                } else {
                    warn!(
                        "Worker {} failed job {} ({}), eligible for retry",
                        self.id, job.id, e
                    );
                }
                job.fail(&e);
            }
        }
    }
}

pub(crate) async fn execute_job(context: &WorkerContext, kind: &JobKind) -> Result<(), JobError> {
    match kind {
        JobKind::Thumbnail { owner_id, file_id } => {
            run_thumbnail_job(context, *owner_id, *file_id).await
        }
        JobKind::Welcome { user_id } => run_welcome_job(context, *user_id).await,
    }
}

/// Derives one resized copy per width in `THUMBNAIL_WIDTHS`, writing each to
/// the deterministic `<ref>_<width>` reference. Re-running overwrites the
/// same three references. The job only succeeds if every derivative landed.
pub(crate) async fn run_thumbnail_job(
    context: &WorkerContext,
    owner_id: Uuid,
    file_id: Uuid,
) -> Result<(), JobError> {
    let file = context
        .files
        .get_owned(file_id, owner_id)
        .await?
        .ok_or_else(|| JobError::Permanent("File not found".to_string()))?;

    let content_ref = file
        .content_ref
        .ok_or_else(|| JobError::Permanent("File has no content".to_string()))?;

    let bytes = context
        .storage
        .read(&content_ref)
        .await?
        .ok_or_else(|| JobError::Transient("Stored content is missing".to_string()))?;

    let format = image::guess_format(&bytes)?;
    let source = image::load_from_memory(&bytes)?;

    for width in THUMBNAIL_WIDTHS {
        let height = ((source.height() as u64 * width as u64) / source.width().max(1) as u64)
            .max(1) as u32;
        let resized = source.thumbnail_exact(width, height);

        let mut encoded = Cursor::new(Vec::new());
        resized.write_to(&mut encoded, format)?;

        let derived = ContentStorage::derived_ref(&content_ref, width);
        context.storage.store_at(&derived, encoded.get_ref()).await?;

        info!("Generated {}px derivative at {}", width, derived);
    }

    Ok(())
}

pub(crate) async fn run_welcome_job(
    context: &WorkerContext,
    user_id: Uuid,
) -> Result<(), JobError> {
    let user = context
        .users
        .get_user_by_id(user_id)
        .await?
        .ok_or_else(|| JobError::Permanent("User not found".to_string()))?;

    info!("Welcome {}!", user.email);
    Ok(())
}
