pub mod checks;

pub use checks::{DatabaseHealthCheck, HealthCheck, SessionStoreHealthCheck};
