//! Tag service

use anyhow::Result;
use std::sync::Arc;

use crate::db::repositories::{NewTag, TagRepository};
use crate::models::{CreateTagInput, Tag, UpdateTagInput};

/// Error types for tag service operations
#[derive(Debug, thiserror::Error)]
pub enum TagServiceError {
    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Requested tag not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Tag name already taken
    #[error("Tag already exists: {0}")]
    TagExists(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl TagServiceError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::ValidationError(_) => 400,
            Self::NotFound(_) => 404,
            Self::TagExists(_) => 409,
            Self::InternalError(_) => 500,
        }
    }
}

/// Tag service for managing tags
pub struct TagService {
    tag_repo: Arc<dyn TagRepository>,
}

impl TagService {
    pub fn new(tag_repo: Arc<dyn TagRepository>) -> Self {
        Self { tag_repo }
    }

    /// Create a new tag, recording the creating user
    pub async fn create(
        &self,
        input: CreateTagInput,
        created_by: i64,
    ) -> Result<Tag, TagServiceError> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(TagServiceError::ValidationError(
                "tag name cannot be empty".to_string(),
            ));
        }
        if self.tag_repo.get_by_name(name).await?.is_some() {
            return Err(TagServiceError::TagExists(name.to_string()));
        }

        Ok(self
            .tag_repo
            .create(&NewTag {
                name: name.to_string(),
                description: input.description,
                created_by,
            })
            .await?)
    }

    /// List tags, optionally filtered by a case-insensitive name substring
    pub async fn find(&self, name: Option<&str>) -> Result<Vec<Tag>, TagServiceError> {
        Ok(self.tag_repo.list(name).await?)
    }

    /// Get a tag by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Tag, TagServiceError> {
        self.tag_repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| TagServiceError::NotFound(format!("tag {}", id)))
    }

    /// Update a tag.
    ///
    /// The name is only replaced when the input carries a non-empty
    /// name; the description is always overwritten.
    pub async fn update(&self, id: i64, input: UpdateTagInput) -> Result<Tag, TagServiceError> {
        let mut tag = self.get_by_id(id).await?;

        let new_name = input.name.trim();
        if !new_name.is_empty() && new_name != tag.name {
            if self.tag_repo.get_by_name(new_name).await?.is_some() {
                return Err(TagServiceError::TagExists(new_name.to_string()));
            }
            tag.name = new_name.to_string();
        }
        tag.description = input.description;

        if !self.tag_repo.update(&tag).await? {
            return Err(TagServiceError::NotFound(format!("tag {}", id)));
        }
        self.get_by_id(id).await
    }

    /// Delete a tag
    pub async fn delete(&self, id: i64) -> Result<(), TagServiceError> {
        if !self.tag_repo.delete(id).await? {
            return Err(TagServiceError::NotFound(format!("tag {}", id)));
        }
        Ok(())
    }

    /// Resolve tag names to the tags that actually exist
    pub async fn get_existing(&self, names: &[String]) -> Result<Vec<Tag>, TagServiceError> {
        Ok(self.tag_repo.get_by_names(names).await?)
    }

    /// Number of articles carrying the tag
    pub async fn usage_count(&self, tag_id: i64) -> Result<i64, TagServiceError> {
        self.get_by_id(tag_id).await?;
        Ok(self.tag_repo.usage_count(tag_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{NewUser, SqlxTagRepository, SqlxUserRepository, UserRepository};
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> (TagService, i64) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let users = SqlxUserRepository::new(pool.clone());
        let user = users
            .create(&NewUser {
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                password_hash: "$argon2id$test".to_string(),
                role_id: 1,
                first_name: None,
                last_name: None,
                about: None,
            })
            .await
            .expect("Failed to create user");

        (
            TagService::new(Arc::new(SqlxTagRepository::new(pool))),
            user.id,
        )
    }

    fn tag_input(name: &str) -> CreateTagInput {
        CreateTagInput {
            name: name.to_string(),
            description: String::new(),
        }
    }

    #[tokio::test]
    async fn test_create_validates_and_records_creator() {
        let (service, user_id) = setup().await;

        let empty = service.create(tag_input("  "), user_id).await.unwrap_err();
        assert_eq!(empty.status_code(), 400);

        let tag = service
            .create(tag_input("rust"), user_id)
            .await
            .expect("Create failed");
        assert_eq!(tag.created_by, user_id);

        let dup = service.create(tag_input("rust"), user_id).await.unwrap_err();
        assert_eq!(dup.status_code(), 409);
    }

    #[tokio::test]
    async fn test_update_keeps_name_when_input_name_is_empty() {
        let (service, user_id) = setup().await;
        let tag = service
            .create(
                CreateTagInput {
                    name: "rust".to_string(),
                    description: "old".to_string(),
                },
                user_id,
            )
            .await
            .expect("Create failed");

        let updated = service
            .update(
                tag.id,
                UpdateTagInput {
                    name: String::new(),
                    description: "new description".to_string(),
                },
            )
            .await
            .expect("Update failed");

        assert_eq!(updated.name, "rust");
        assert_eq!(updated.description, "new description");
    }

    #[tokio::test]
    async fn test_update_renames_when_name_is_present() {
        let (service, user_id) = setup().await;
        let tag = service
            .create(tag_input("rust"), user_id)
            .await
            .expect("Create failed");
        service
            .create(tag_input("web"), user_id)
            .await
            .expect("Create failed");

        let renamed = service
            .update(
                tag.id,
                UpdateTagInput {
                    name: "rust-lang".to_string(),
                    description: String::new(),
                },
            )
            .await
            .expect("Update failed");
        assert_eq!(renamed.name, "rust-lang");

        // Renaming onto an existing tag is a conflict
        let err = service
            .update(
                tag.id,
                UpdateTagInput {
                    name: "web".to_string(),
                    description: String::new(),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 409);
    }

    #[tokio::test]
    async fn test_get_existing_filters_unknown_names() {
        let (service, user_id) = setup().await;
        service
            .create(tag_input("rust"), user_id)
            .await
            .expect("Create failed");

        let found = service
            .get_existing(&["rust".to_string(), "ghost".to_string()])
            .await
            .expect("Query failed");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "rust");
    }

    #[tokio::test]
    async fn test_missing_tag_operations_are_not_found() {
        let (service, _user_id) = setup().await;

        assert_eq!(service.get_by_id(9999).await.unwrap_err().status_code(), 404);
        assert_eq!(service.delete(9999).await.unwrap_err().status_code(), 404);
        assert_eq!(
            service.usage_count(9999).await.unwrap_err().status_code(),
            404
        );
    }
}
