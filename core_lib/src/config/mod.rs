pub mod settings;

pub use settings::{AppConfig, DatabaseConfig, JobConfig, ServerConfig, SessionConfig, StorageConfig};
