use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, Result};
use super::models::{Job, JobKind};

/// Producer half of the pipeline. Jobs live only in the channel; the
/// derivative-overwrite design makes duplicate delivery harmless, so no
/// persistence layer backs the queue.
#[derive(Clone)]
pub struct JobQueue {
    sender: mpsc::UnboundedSender<Job>,
}

impl JobQueue {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Job>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    pub fn submit(&self, kind: JobKind) -> Result<Uuid> {
        let job = Job::new(kind);
        let job_id = job.id;

        self.sender
            .send(job)
            .map_err(|_| AppError::Job("Failed to queue job".to_string()))?;

        info!("Job {} submitted for processing", job_id);
        Ok(job_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::models::JobStatus;

    #[tokio::test]
    async fn submitted_jobs_arrive_queued() {
        let (queue, mut receiver) = JobQueue::new();
        let user_id = Uuid::new_v4();

        let job_id = queue.submit(JobKind::Welcome { user_id }).unwrap();

        let job = receiver.recv().await.unwrap();
        assert_eq!(job.id, job_id);
        assert_eq!(job.status, JobStatus::Queued);
        assert!(matches!(job.kind, JobKind::Welcome { user_id: u } if u == user_id));
    }

    #[tokio::test]
    async fn submit_fails_once_the_consumer_is_gone() {
        let (queue, receiver) = JobQueue::new();
        drop(receiver);

        let err = queue
            .submit(JobKind::Welcome {
                user_id: Uuid::new_v4(),
            })
            .unwrap_err();
        assert!(matches!(err, AppError::Job(_)));
    }
}
