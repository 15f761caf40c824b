pub mod models;
pub mod queue;
pub mod worker;

pub use models::{Job, JobError, JobKind, JobStatus, THUMBNAIL_WIDTHS};
pub use queue::JobQueue;
pub use worker::{WorkerContext, WorkerPool};
