pub mod models;
pub mod repository;
pub mod service;
pub mod sessions;

pub use models::{Credentials, RegisterRequest, TokenResponse, User, UserResponse};
pub use repository::{UserRepository, UserStore};
pub use service::{AccountService, CredentialService};
pub use sessions::SessionStore;
