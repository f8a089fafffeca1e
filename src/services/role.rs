//! Role service
//!
//! Builtin roles (user, moderator, administrator) are seeded by the
//! migrations and cannot be renamed or deleted.

use anyhow::Result;
use std::sync::Arc;

use crate::db::repositories::RoleRepository;
use crate::models::Role;

/// Error types for role service operations
#[derive(Debug, thiserror::Error)]
pub enum RoleServiceError {
    /// Validation error (invalid input or builtin role)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Requested role not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Role name already taken
    #[error("Role already exists: {0}")]
    RoleExists(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl RoleServiceError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::ValidationError(_) => 400,
            Self::NotFound(_) => 404,
            Self::RoleExists(_) => 409,
            Self::InternalError(_) => 500,
        }
    }
}

/// Role service for managing roles
pub struct RoleService {
    role_repo: Arc<dyn RoleRepository>,
}

impl RoleService {
    pub fn new(role_repo: Arc<dyn RoleRepository>) -> Self {
        Self { role_repo }
    }

    /// Create a new custom role
    pub async fn create(&self, name: &str) -> Result<Role, RoleServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RoleServiceError::ValidationError(
                "role name cannot be empty".to_string(),
            ));
        }
        if self.role_repo.get_by_name(name).await?.is_some() {
            return Err(RoleServiceError::RoleExists(name.to_string()));
        }
        Ok(self.role_repo.create(name).await?)
    }

    /// Rename an existing role; builtin roles are immutable
    pub async fn update(&self, id: i64, name: &str) -> Result<Role, RoleServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RoleServiceError::ValidationError(
                "role name cannot be empty".to_string(),
            ));
        }

        let role = self.get_by_id(id).await?;
        if role.is_builtin {
            return Err(RoleServiceError::ValidationError(
                "builtin roles cannot be edited".to_string(),
            ));
        }

        if let Some(existing) = self.role_repo.get_by_name(name).await? {
            if existing.id != id {
                return Err(RoleServiceError::RoleExists(name.to_string()));
            }
        }

        self.role_repo.rename(id, name).await?;
        self.get_by_id(id).await
    }

    /// Delete a role; builtin roles are immutable
    pub async fn delete(&self, id: i64) -> Result<(), RoleServiceError> {
        let role = self.get_by_id(id).await?;
        if role.is_builtin {
            return Err(RoleServiceError::ValidationError(
                "builtin roles cannot be deleted".to_string(),
            ));
        }
        self.role_repo.delete(id).await?;
        Ok(())
    }

    /// List all roles
    pub async fn list(&self) -> Result<Vec<Role>, RoleServiceError> {
        Ok(self.role_repo.list().await?)
    }

    /// Get a role by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Role, RoleServiceError> {
        self.role_repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| RoleServiceError::NotFound(format!("role {}", id)))
    }

    /// Get a role by exact name
    pub async fn get_by_name(&self, name: &str) -> Result<Role, RoleServiceError> {
        self.role_repo
            .get_by_name(name)
            .await?
            .ok_or_else(|| RoleServiceError::NotFound(format!("role '{}'", name)))
    }

    /// Case-insensitive substring search; an empty result is 404
    pub async fn search(&self, name: &str) -> Result<Vec<Role>, RoleServiceError> {
        let roles = self.role_repo.search(name).await?;
        if roles.is_empty() {
            return Err(RoleServiceError::NotFound(format!(
                "no roles matching '{}'",
                name
            )));
        }
        Ok(roles)
    }
}
