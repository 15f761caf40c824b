use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Widths of the derivatives produced for every uploaded image.
pub const THUMBNAIL_WIDTHS: [u32; 3] = [500, 250, 100];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Derive resized copies of an uploaded image.
    Thumbnail { owner_id: Uuid, file_id: Uuid },
    /// Greet a freshly registered user.
    Welcome { user_id: Uuid },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Processing,
    Done,
    Failed,
}

/// Failure classification the queue broker's retry policy keys off:
/// permanent failures target entities that no longer exist, transient ones
/// are worth re-running.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("{0}")]
    Permanent(String),
    #[error("{0}")]
    Transient(String),
}

impl JobError {
    pub fn is_permanent(&self) -> bool {
        matches!(self, JobError::Permanent(_))
    }
}

impl From<std::io::Error> for JobError {
    fn from(err: std::io::Error) -> Self {
        JobError::Transient(err.to_string())
    }
}

impl From<image::ImageError> for JobError {
    fn from(err: image::ImageError) -> Self {
        JobError::Transient(err.to_string())
    }
}

impl From<crate::error::AppError> for JobError {
    fn from(err: crate::error::AppError) -> Self {
        JobError::Transient(err.to_string())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub id: Uuid,
    pub kind: JobKind,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl Job {
    pub fn new(kind: JobKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            status: JobStatus::Queued,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            error: None,
        }
    }

    pub fn start(&mut self) {
        self.status = JobStatus::Processing;
        self.started_at = Some(Utc::now());
    }

    pub fn complete(&mut self) {
        self.status = JobStatus::Done;
        self.completed_at = Some(Utc::now());
    }

    pub fn fail(&mut self, error: &JobError) {
        self.status = JobStatus::Failed;
        self.completed_at = Some(Utc::now());
        self.error = Some(error.to_string());
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, JobStatus::Done | JobStatus::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jobs_walk_the_state_machine() {
        let mut job = Job::new(JobKind::Welcome {
            user_id: Uuid::new_v4(),
        });
        assert_eq!(job.status, JobStatus::Queued);
        assert!(!job.is_terminal());

        job.start();
        assert_eq!(job.status, JobStatus::Processing);
        assert!(job.started_at.is_some());
        assert!(!job.is_terminal());

        job.complete();
        assert_eq!(job.status, JobStatus::Done);
        assert!(job.is_terminal());
        assert!(job.error.is_none());
    }

    #[test]
    fn failed_jobs_carry_their_error() {
        let mut job = Job::new(JobKind::Thumbnail {
            owner_id: Uuid::new_v4(),
            file_id: Uuid::new_v4(),
        });

        job.start();
        job.fail(&JobError::Permanent("File not found".to_string()));

        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.is_terminal());
        assert_eq!(job.error.as_deref(), Some("File not found"));
    }

    #[test]
    fn error_classification() {
        assert!(JobError::Permanent("gone".into()).is_permanent());
        assert!(!JobError::Transient("busy".into()).is_permanent());

        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        assert!(!JobError::from(io).is_permanent());
    }
}
