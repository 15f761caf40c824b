use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use std::sync::Arc;
use tracing::error;

use crate::auth::models::{Credentials, RegisterRequest, TokenResponse, User, UserResponse};
use crate::auth::repository::UserStore;
use crate::auth::sessions::SessionStore;
use crate::error::AppError;
use crate::jobs::{JobKind, JobQueue};

/// Verifies email/password pairs and manages opaque session tokens.
#[derive(Clone)]
pub struct CredentialService {
    users: Arc<dyn UserStore>,
    sessions: SessionStore,
    argon2: Argon2<'static>,
}

impl CredentialService {
    pub fn new(users: Arc<dyn UserStore>, sessions: SessionStore) -> Self {
        Self {
            users,
            sessions,
            argon2: Argon2::default(),
        }
    }

    /// The failure message never reveals whether the email was unknown or
    /// the password wrong.
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<TokenResponse, AppError> {
        let user = self
            .users
            .get_user_by_email(&credentials.email)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(&self.argon2, &credentials.password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        let token = self.sessions.mint(user.id);
        Ok(TokenResponse { token })
    }

    /// Resolves a session token to its user, failing on unknown or expired
    /// bindings and on bindings whose user no longer exists.
    pub async fn resolve(&self, token: &str) -> Result<User, AppError> {
        let user_id = self.sessions.resolve(token).ok_or(AppError::Unauthorized)?;

        self.users
            .get_user_by_id(user_id)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    pub fn revoke(&self, token: &str) {
        self.sessions.revoke(token);
    }
}

/// Registers users and kicks off the welcome-notification job.
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserStore>,
    queue: JobQueue,
    argon2: Argon2<'static>,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserStore>, queue: JobQueue) -> Self {
        Self {
            users,
            queue,
            argon2: Argon2::default(),
        }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<UserResponse, AppError> {
        let email = request
            .email
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| AppError::BadRequest("Missing email".to_string()))?;
        let password = request
            .password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AppError::BadRequest("Missing password".to_string()))?;

        if self.users.get_user_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict);
        }

        let password_hash = hash_password(&self.argon2, &password)?;
        let user = self.users.create_user(&email, &password_hash).await?;

        // The user record is durable at this point; a queue failure only
        // costs the notification.
        if let Err(e) = self.queue.submit(JobKind::Welcome { user_id: user.id }) {
            error!("Failed to enqueue welcome job for user {}: {}", user.id, e);
        }

        Ok(user.into())
    }
}

fn hash_password(argon2: &Argon2<'_>, password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Database(format!("Failed to hash password: {}", e)))?;

    Ok(password_hash.to_string())
}

fn verify_password(argon2: &Argon2<'_>, password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::Database(format!("Invalid password hash: {}", e)))?;

    Ok(argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repository::UserRepository;
    use crate::config::SessionConfig;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup() -> (AccountService, CredentialService, JobQueue) {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let repo = UserRepository::new(pool);
        repo.ensure_tables_exist().await.unwrap();
        let users: Arc<dyn UserStore> = Arc::new(repo);

        let sessions = SessionStore::new(&SessionConfig {
            ttl_hours: 24,
            max_sessions: 100,
        });

        let (queue, _receiver) = JobQueue::new();
        let accounts = AccountService::new(users.clone(), queue.clone());
        let credentials = CredentialService::new(users, sessions);

        (accounts, credentials, queue)
    }

    fn register_request(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
        }
    }

    #[tokio::test]
    async fn register_then_authenticate_and_resolve() {
        let (accounts, credentials, _queue) = setup().await;

        let user = accounts
            .register(register_request("bob@dylan.com", "toto1234!"))
            .await
            .unwrap();

        let creds = Credentials {
            email: "bob@dylan.com".to_string(),
            password: "toto1234!".to_string(),
        };
        let token = credentials.authenticate(&creds).await.unwrap().token;

        let resolved = credentials.resolve(&token).await.unwrap();
        assert_eq!(resolved.id, user.id);
        assert_eq!(resolved.email, "bob@dylan.com");
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_are_indistinguishable() {
        let (accounts, credentials, _queue) = setup().await;
        accounts
            .register(register_request("bob@dylan.com", "toto1234!"))
            .await
            .unwrap();

        let wrong_password = Credentials {
            email: "bob@dylan.com".to_string(),
            password: "nope".to_string(),
        };
        let unknown_email = Credentials {
            email: "ghost@dylan.com".to_string(),
            password: "toto1234!".to_string(),
        };

        let e1 = credentials.authenticate(&wrong_password).await.unwrap_err();
        let e2 = credentials.authenticate(&unknown_email).await.unwrap_err();
        assert_eq!(e1.to_string(), e2.to_string());
    }

    #[tokio::test]
    async fn revoked_tokens_stop_resolving() {
        let (accounts, credentials, _queue) = setup().await;
        accounts
            .register(register_request("bob@dylan.com", "toto1234!"))
            .await
            .unwrap();

        let creds = Credentials {
            email: "bob@dylan.com".to_string(),
            password: "toto1234!".to_string(),
        };
        let token = credentials.authenticate(&creds).await.unwrap().token;

        credentials.revoke(&token);
        assert!(matches!(
            credentials.resolve(&token).await.unwrap_err(),
            AppError::Unauthorized
        ));

        // a second revoke is a no-op
        credentials.revoke(&token);
    }

    #[tokio::test]
    async fn register_validates_presence_and_uniqueness() {
        let (accounts, _credentials, _queue) = setup().await;

        let err = accounts
            .register(RegisterRequest {
                email: None,
                password: Some("pw".to_string()),
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing email");

        let err = accounts
            .register(RegisterRequest {
                email: Some("bob@dylan.com".to_string()),
                password: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing password");

        accounts
            .register(register_request("bob@dylan.com", "toto1234!"))
            .await
            .unwrap();
        let err = accounts
            .register(register_request("bob@dylan.com", "other"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict));
    }

    #[tokio::test]
    async fn register_enqueues_one_welcome_job() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let repo = UserRepository::new(pool);
        repo.ensure_tables_exist().await.unwrap();
        let users: Arc<dyn UserStore> = Arc::new(repo);

        let (queue, mut receiver) = JobQueue::new();
        let accounts = AccountService::new(users, queue);

        let user = accounts
            .register(register_request("bob@dylan.com", "toto1234!"))
            .await
            .unwrap();

        let job = receiver.try_recv().unwrap();
        assert!(matches!(job.kind, JobKind::Welcome { user_id } if user_id == user.id));
        assert!(receiver.try_recv().is_err());
    }
}
