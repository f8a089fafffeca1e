//! User service
//!
//! Registration, authentication, session management, and account
//! administration. The first administrator is bootstrapped through a
//! dedicated operation that locks itself once an administrator exists.

use anyhow::Result;
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::repositories::{NewUser, RoleRepository, SessionRepository, UserRepository};
use crate::models::{Session, UpdateUserInput, User, ROLE_ADMINISTRATOR, ROLE_USER};
use crate::services::password::{hash_password, verify_password};

/// Default session expiration time in days
const DEFAULT_SESSION_EXPIRATION_DAYS: i64 = 7;

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Authentication failed (invalid credentials or session)
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Operation not permitted for this actor
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Username or email already taken
    #[error("User already exists: {0}")]
    UserExists(String),

    /// Requested user or role not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Session expired
    #[error("Session expired")]
    SessionExpired,

    /// Session not found
    #[error("Session not found")]
    SessionNotFound,

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl UserServiceError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::ValidationError(_) => 400,
            Self::AuthenticationError(_) | Self::SessionExpired | Self::SessionNotFound => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::UserExists(_) => 409,
            Self::InternalError(_) => 500,
        }
    }
}

/// Input for registering a new user
#[derive(Debug, Clone, serde::Deserialize)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub about: Option<String>,
}

/// User service for managing users and authentication
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    role_repo: Arc<dyn RoleRepository>,
    session_expiration_days: i64,
}

impl UserService {
    /// Create a new user service with the default session expiration
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        role_repo: Arc<dyn RoleRepository>,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            role_repo,
            session_expiration_days: DEFAULT_SESSION_EXPIRATION_DAYS,
        }
    }

    /// Create a new user service with custom session expiration
    pub fn with_session_expiration(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        role_repo: Arc<dyn RoleRepository>,
        session_expiration_days: i64,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            role_repo,
            session_expiration_days,
        }
    }

    /// Register a new user with the default `user` role.
    ///
    /// The default role row is created on demand if the database was
    /// seeded without it.
    pub async fn register(&self, input: RegisterInput) -> Result<User, UserServiceError> {
        self.validate_register_input(&input)?;

        if self.user_repo.get_by_username(&input.username).await?.is_some() {
            return Err(UserServiceError::UserExists(format!(
                "username '{}' is taken",
                input.username
            )));
        }
        if self.user_repo.get_by_email(&input.email).await?.is_some() {
            return Err(UserServiceError::UserExists(format!(
                "email '{}' is already registered",
                input.email
            )));
        }

        let role = self.ensure_role(ROLE_USER).await?;
        self.create_with_role(input, role.id).await
    }

    /// Bootstrap an administrator account.
    ///
    /// Allowed only while no administrator exists; afterwards the
    /// operation is locked.
    pub async fn register_admin(&self, input: RegisterInput) -> Result<User, UserServiceError> {
        let admins = self.user_repo.count_with_role(ROLE_ADMINISTRATOR).await?;
        if admins > 0 {
            return Err(UserServiceError::Forbidden(
                "an administrator already exists".to_string(),
            ));
        }

        self.validate_register_input(&input)?;

        if self.user_repo.get_by_username(&input.username).await?.is_some() {
            return Err(UserServiceError::UserExists(format!(
                "username '{}' is taken",
                input.username
            )));
        }
        if self.user_repo.get_by_email(&input.email).await?.is_some() {
            return Err(UserServiceError::UserExists(format!(
                "email '{}' is already registered",
                input.email
            )));
        }

        let role = self.ensure_role(ROLE_ADMINISTRATOR).await?;
        self.create_with_role(input, role.id).await
    }

    /// Log in with email and password, creating a new session.
    ///
    /// Invalid credentials yield one uniform error so callers cannot
    /// probe which part was wrong.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(User, Session), UserServiceError> {
        let invalid =
            || UserServiceError::AuthenticationError("invalid email or password".to_string());

        let user = self
            .user_repo
            .get_by_email(email)
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(invalid());
        }

        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4().to_string(),
            user_id: user.id,
            expires_at: now + Duration::days(self.session_expiration_days),
            created_at: now,
        };
        self.session_repo.create(&session).await?;

        Ok((user, session))
    }

    /// Resolve a session token to its user.
    ///
    /// Expired sessions are deleted on sight.
    pub async fn validate_session(&self, session_id: &str) -> Result<User, UserServiceError> {
        let session = self
            .session_repo
            .get_by_id(session_id)
            .await?
            .ok_or(UserServiceError::SessionNotFound)?;

        if session.is_expired() {
            self.session_repo.delete(session_id).await?;
            return Err(UserServiceError::SessionExpired);
        }

        self.user_repo
            .get_by_id(session.user_id)
            .await?
            .ok_or(UserServiceError::SessionNotFound)
    }

    /// Log out by deleting the session
    pub async fn logout(&self, session_id: &str) -> Result<(), UserServiceError> {
        self.session_repo.delete(session_id).await?;
        Ok(())
    }

    /// List users, optionally filtered by a substring over username and
    /// first/last names
    pub async fn list(&self, search: Option<&str>) -> Result<Vec<User>, UserServiceError> {
        Ok(self.user_repo.list(search).await?)
    }

    /// Get a user by ID
    pub async fn get_by_id(&self, id: i64) -> Result<User, UserServiceError> {
        self.user_repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| UserServiceError::NotFound(format!("user {}", id)))
    }

    /// Update a user's account and profile fields.
    ///
    /// A new password is re-hashed; a role change is resolved by name
    /// and fails with 404 when the role doesn't exist.
    pub async fn update(&self, id: i64, input: UpdateUserInput) -> Result<User, UserServiceError> {
        let mut user = self.get_by_id(id).await?;

        if let Some(username) = input.username {
            if username.trim().is_empty() {
                return Err(UserServiceError::ValidationError(
                    "username cannot be empty".to_string(),
                ));
            }
            if username != user.username {
                if let Some(existing) = self.user_repo.get_by_username(&username).await? {
                    if existing.id != id {
                        return Err(UserServiceError::UserExists(format!(
                            "username '{}' is taken",
                            username
                        )));
                    }
                }
            }
            user.username = username;
        }

        if let Some(email) = input.email {
            if !is_valid_email(&email) {
                return Err(UserServiceError::ValidationError(
                    "invalid email address".to_string(),
                ));
            }
            if email != user.email {
                if let Some(existing) = self.user_repo.get_by_email(&email).await? {
                    if existing.id != id {
                        return Err(UserServiceError::UserExists(format!(
                            "email '{}' is already registered",
                            email
                        )));
                    }
                }
            }
            user.email = email;
        }

        if let Some(password) = input.password {
            if password.is_empty() {
                return Err(UserServiceError::ValidationError(
                    "password cannot be empty".to_string(),
                ));
            }
            user.password_hash = hash_password(&password)?;
        }

        if let Some(role_name) = input.role {
            let role = self
                .role_repo
                .get_by_name(&role_name)
                .await?
                .ok_or_else(|| UserServiceError::NotFound(format!("role '{}'", role_name)))?;
            user.role_id = role.id;
            user.role = role.name;
        }

        if let Some(first_name) = input.first_name {
            user.first_name = Some(first_name);
        }
        if let Some(last_name) = input.last_name {
            user.last_name = Some(last_name);
        }
        if let Some(about) = input.about {
            user.about = Some(about);
        }

        if !self.user_repo.update(&user).await? {
            return Err(UserServiceError::NotFound(format!("user {}", id)));
        }
        self.get_by_id(id).await
    }

    /// Assign a different role to a user
    pub async fn change_role(&self, id: i64, role_name: &str) -> Result<User, UserServiceError> {
        let mut user = self.get_by_id(id).await?;
        let role = self
            .role_repo
            .get_by_name(role_name)
            .await?
            .ok_or_else(|| UserServiceError::NotFound(format!("role '{}'", role_name)))?;

        user.role_id = role.id;
        user.role = role.name;
        self.user_repo.update(&user).await?;
        self.get_by_id(id).await
    }

    /// Delete a user account
    pub async fn delete(&self, id: i64) -> Result<(), UserServiceError> {
        if !self.user_repo.delete(id).await? {
            return Err(UserServiceError::NotFound(format!("user {}", id)));
        }
        Ok(())
    }

    async fn create_with_role(
        &self,
        input: RegisterInput,
        role_id: i64,
    ) -> Result<User, UserServiceError> {
        let password_hash = hash_password(&input.password)?;
        let user = self
            .user_repo
            .create(&NewUser {
                username: input.username,
                email: input.email,
                password_hash,
                role_id,
                first_name: input.first_name,
                last_name: input.last_name,
                about: input.about,
            })
            .await?;
        Ok(user)
    }

    async fn ensure_role(&self, name: &str) -> Result<crate::models::Role, UserServiceError> {
        if let Some(role) = self.role_repo.get_by_name(name).await? {
            return Ok(role);
        }
        Ok(self.role_repo.create(name).await?)
    }

    fn validate_register_input(&self, input: &RegisterInput) -> Result<(), UserServiceError> {
        if input.username.trim().is_empty() {
            return Err(UserServiceError::ValidationError(
                "username cannot be empty".to_string(),
            ));
        }
        if input.email.trim().is_empty() {
            return Err(UserServiceError::ValidationError(
                "email cannot be empty".to_string(),
            ));
        }
        if !is_valid_email(&input.email) {
            return Err(UserServiceError::ValidationError(
                "invalid email address".to_string(),
            ));
        }
        if input.password.is_empty() {
            return Err(UserServiceError::ValidationError(
                "password cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxRoleRepository, SqlxSessionRepository, SqlxUserRepository};
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> UserService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        UserService::new(
            Arc::new(SqlxUserRepository::new(pool.clone())),
            Arc::new(SqlxSessionRepository::new(pool.clone())),
            Arc::new(SqlxRoleRepository::new(pool)),
        )
    }

    fn register_input(username: &str, email: &str) -> RegisterInput {
        RegisterInput {
            username: username.to_string(),
            email: email.to_string(),
            password: "secret123".to_string(),
            first_name: None,
            last_name: None,
            about: None,
        }
    }

    #[tokio::test]
    async fn test_register_assigns_default_role() {
        let service = setup().await;

        let user = service
            .register(register_input("alice", "alice@example.com"))
            .await
            .expect("Registration failed");

        assert_eq!(user.role, ROLE_USER);
        assert!(user.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_register_rejects_bad_input() {
        let service = setup().await;

        let empty_name = service
            .register(register_input("", "a@example.com"))
            .await
            .unwrap_err();
        assert_eq!(empty_name.status_code(), 400);

        let bad_email = service
            .register(register_input("alice", "not-an-email"))
            .await
            .unwrap_err();
        assert_eq!(bad_email.status_code(), 400);

        let mut no_password = register_input("alice", "alice@example.com");
        no_password.password = String::new();
        let err = service.register(no_password).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_register_rejects_duplicates() {
        let service = setup().await;
        service
            .register(register_input("alice", "alice@example.com"))
            .await
            .expect("Registration failed");

        let dup_username = service
            .register(register_input("alice", "other@example.com"))
            .await
            .unwrap_err();
        assert_eq!(dup_username.status_code(), 409);

        let dup_email = service
            .register(register_input("bob", "alice@example.com"))
            .await
            .unwrap_err();
        assert_eq!(dup_email.status_code(), 409);
    }

    #[tokio::test]
    async fn test_register_admin_locks_after_first() {
        let service = setup().await;

        let admin = service
            .register_admin(register_input("root", "root@example.com"))
            .await
            .expect("Bootstrap failed");
        assert!(admin.is_admin());

        let err = service
            .register_admin(register_input("root2", "root2@example.com"))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 403);
    }

    #[tokio::test]
    async fn test_login_and_validate_session() {
        let service = setup().await;
        service
            .register(register_input("alice", "alice@example.com"))
            .await
            .expect("Registration failed");

        let (user, session) = service
            .login("alice@example.com", "secret123")
            .await
            .expect("Login failed");
        assert_eq!(user.username, "alice");
        assert!(!session.is_expired());

        let validated = service
            .validate_session(&session.id)
            .await
            .expect("Validation failed");
        assert_eq!(validated.id, user.id);
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials_uniformly() {
        let service = setup().await;
        service
            .register(register_input("alice", "alice@example.com"))
            .await
            .expect("Registration failed");

        let wrong_password = service
            .login("alice@example.com", "nope")
            .await
            .unwrap_err();
        let unknown_email = service.login("ghost@example.com", "nope").await.unwrap_err();

        assert_eq!(wrong_password.status_code(), 401);
        assert_eq!(unknown_email.status_code(), 401);
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[tokio::test]
    async fn test_logout_invalidates_session() {
        let service = setup().await;
        service
            .register(register_input("alice", "alice@example.com"))
            .await
            .expect("Registration failed");
        let (_, session) = service
            .login("alice@example.com", "secret123")
            .await
            .expect("Login failed");

        service.logout(&session.id).await.expect("Logout failed");

        let err = service.validate_session(&session.id).await.unwrap_err();
        assert_eq!(err.status_code(), 401);
    }

    #[tokio::test]
    async fn test_expired_session_is_rejected_and_removed() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let session_repo = Arc::new(SqlxSessionRepository::new(pool.clone()));
        let service = UserService::new(
            Arc::new(SqlxUserRepository::new(pool.clone())),
            session_repo.clone(),
            Arc::new(SqlxRoleRepository::new(pool)),
        );

        let user = service
            .register(register_input("alice", "alice@example.com"))
            .await
            .expect("Registration failed");

        let stale = Session {
            id: Uuid::new_v4().to_string(),
            user_id: user.id,
            expires_at: Utc::now() - Duration::hours(1),
            created_at: Utc::now() - Duration::days(8),
        };
        session_repo.create(&stale).await.expect("Create failed");

        let err = service.validate_session(&stale.id).await.unwrap_err();
        assert!(matches!(err, UserServiceError::SessionExpired));

        // A second lookup finds nothing: the stale session was deleted
        let err = service.validate_session(&stale.id).await.unwrap_err();
        assert!(matches!(err, UserServiceError::SessionNotFound));
    }

    #[tokio::test]
    async fn test_update_profile_and_password() {
        let service = setup().await;
        let user = service
            .register(register_input("alice", "alice@example.com"))
            .await
            .expect("Registration failed");

        let updated = service
            .update(
                user.id,
                UpdateUserInput {
                    first_name: Some("Alice".to_string()),
                    about: Some("Rustacean".to_string()),
                    password: Some("newsecret".to_string()),
                    ..Default::default()
                },
            )
            .await
            .expect("Update failed");
        assert_eq!(updated.first_name.as_deref(), Some("Alice"));

        // Old password no longer works, new one does
        assert!(service.login("alice@example.com", "secret123").await.is_err());
        service
            .login("alice@example.com", "newsecret")
            .await
            .expect("Login with new password failed");
    }

    #[tokio::test]
    async fn test_update_rejects_taken_username() {
        let service = setup().await;
        service
            .register(register_input("alice", "alice@example.com"))
            .await
            .expect("Registration failed");
        let bob = service
            .register(register_input("bob", "bob@example.com"))
            .await
            .expect("Registration failed");

        let err = service
            .update(
                bob.id,
                UpdateUserInput {
                    username: Some("alice".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 409);
    }

    #[tokio::test]
    async fn test_change_role() {
        let service = setup().await;
        let user = service
            .register(register_input("alice", "alice@example.com"))
            .await
            .expect("Registration failed");

        let promoted = service
            .change_role(user.id, "moderator")
            .await
            .expect("Role change failed");
        assert!(promoted.is_moderator());

        let err = service.change_role(user.id, "ghost-role").await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn test_delete_missing_user_is_not_found() {
        let service = setup().await;
        let err = service.delete(9999).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("first.last@sub.example.org"));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@nodot"));
        assert!(!is_valid_email("user@.com"));
    }
}
