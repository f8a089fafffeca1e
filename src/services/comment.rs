//! Comment service

use anyhow::Result;
use std::sync::Arc;

use crate::db::repositories::{ArticleRepository, CommentRepository, NewComment, UserRepository};
use crate::models::{CommentWithAuthor, CreateCommentInput, User};

/// Error types for comment service operations
#[derive(Debug, thiserror::Error)]
pub enum CommentServiceError {
    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Actor may not edit or delete this comment
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Requested comment, article, or author not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl CommentServiceError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::ValidationError(_) => 400,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::InternalError(_) => 500,
        }
    }
}

/// Comment service for managing article comments
pub struct CommentService {
    comment_repo: Arc<dyn CommentRepository>,
    article_repo: Arc<dyn ArticleRepository>,
    user_repo: Arc<dyn UserRepository>,
}

impl CommentService {
    pub fn new(
        comment_repo: Arc<dyn CommentRepository>,
        article_repo: Arc<dyn ArticleRepository>,
        user_repo: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            comment_repo,
            article_repo,
            user_repo,
        }
    }

    /// Post a comment on an article
    pub async fn create(
        &self,
        input: CreateCommentInput,
        author_id: i64,
    ) -> Result<CommentWithAuthor, CommentServiceError> {
        if input.message.trim().is_empty() {
            return Err(CommentServiceError::ValidationError(
                "message cannot be empty".to_string(),
            ));
        }
        if self.user_repo.get_by_id(author_id).await?.is_none() {
            return Err(CommentServiceError::NotFound(format!(
                "user {}",
                author_id
            )));
        }
        if self
            .article_repo
            .get_by_id(input.article_id)
            .await?
            .is_none()
        {
            return Err(CommentServiceError::NotFound(format!(
                "article {}",
                input.article_id
            )));
        }

        let comment = self
            .comment_repo
            .create(&NewComment {
                article_id: input.article_id,
                author_id,
                message: input.message,
            })
            .await?;

        self.get_by_id(comment.id).await
    }

    /// Get a comment with its author's username
    pub async fn get_by_id(&self, id: i64) -> Result<CommentWithAuthor, CommentServiceError> {
        self.comment_repo
            .get_with_author(id)
            .await?
            .ok_or_else(|| CommentServiceError::NotFound(format!("comment {}", id)))
    }

    /// Comments on an article, newest first, optionally limited
    pub async fn list(
        &self,
        article_id: i64,
        count: Option<i64>,
    ) -> Result<Vec<CommentWithAuthor>, CommentServiceError> {
        if count.is_some_and(|c| c < 0) {
            return Err(CommentServiceError::ValidationError(
                "count cannot be negative".to_string(),
            ));
        }
        if self.article_repo.get_by_id(article_id).await?.is_none() {
            return Err(CommentServiceError::NotFound(format!(
                "article {}",
                article_id
            )));
        }
        Ok(self.comment_repo.list_for_article(article_id, count).await?)
    }

    /// Edit a comment's message.
    ///
    /// Permitted for the comment's author and for moderators and
    /// administrators.
    pub async fn update(
        &self,
        id: i64,
        message: &str,
        actor: &User,
    ) -> Result<CommentWithAuthor, CommentServiceError> {
        if message.trim().is_empty() {
            return Err(CommentServiceError::ValidationError(
                "message cannot be empty".to_string(),
            ));
        }

        let comment = self
            .comment_repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| CommentServiceError::NotFound(format!("comment {}", id)))?;

        if !actor.can_edit(comment.author_id) {
            return Err(CommentServiceError::Forbidden(
                "only the author or a moderator can edit this comment".to_string(),
            ));
        }

        self.comment_repo.update_message(id, message).await?;
        self.get_by_id(id).await
    }

    /// Delete a comment, subject to the same owner-or-moderator rule
    pub async fn delete(&self, id: i64, actor: &User) -> Result<(), CommentServiceError> {
        let comment = self
            .comment_repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| CommentServiceError::NotFound(format!("comment {}", id)))?;

        if !actor.can_edit(comment.author_id) {
            return Err(CommentServiceError::Forbidden(
                "only the author or a moderator can delete this comment".to_string(),
            ));
        }

        self.comment_repo.delete(id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        NewArticle, NewUser, SqlxArticleRepository, SqlxCommentRepository, SqlxUserRepository,
    };
    use crate::db::{create_test_pool, migrations, DynDatabasePool};

    struct Fixture {
        pool: DynDatabasePool,
        service: CommentService,
        author: User,
        article_id: i64,
    }

    async fn setup() -> Fixture {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let users = Arc::new(SqlxUserRepository::new(pool.clone()));
        let author = users
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

        let articles = Arc::new(SqlxArticleRepository::new(pool.clone()));
        let article = articles
            .create(&NewArticle {
                title: "Post".to_string(),
                content: "Body".to_string(),
                description: String::new(),
                author_id: author.id,
            })
            .await
            .expect("Failed to create article");

        let service = CommentService::new(
            Arc::new(SqlxCommentRepository::new(pool.clone())),
            articles,
            users,
        );

        Fixture {
            pool,
            service,
            author,
            article_id: article.id,
        }
    }

    fn comment_input(article_id: i64, message: &str) -> CreateCommentInput {
        CreateCommentInput {
            article_id,
            message: message.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_list_comments() {
        let fx = setup().await;

        let comment = fx
            .service
            .create(comment_input(fx.article_id, "Nice post"), fx.author.id)
            .await
            .expect("Create failed");
        assert_eq!(comment.author_name, "alice");

        let comments = fx
            .service
            .list(fx.article_id, None)
            .await
            .expect("List failed");
        assert_eq!(comments.len(), 1);
    }

    #[tokio::test]
    async fn test_create_validates_message_and_targets() {
        let fx = setup().await;

        let empty = fx
            .service
            .create(comment_input(fx.article_id, "   "), fx.author.id)
            .await
            .unwrap_err();
        assert_eq!(empty.status_code(), 400);

        let ghost_article = fx
            .service
            .create(comment_input(9999, "Hello"), fx.author.id)
            .await
            .unwrap_err();
        assert_eq!(ghost_article.status_code(), 404);

        let ghost_author = fx
            .service
            .create(comment_input(fx.article_id, "Hello"), 9999)
            .await
            .unwrap_err();
        assert_eq!(ghost_author.status_code(), 404);
    }

    #[tokio::test]
    async fn test_list_on_missing_article_is_not_found() {
        let fx = setup().await;
        let err = fx.service.list(9999, None).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn test_list_rejects_negative_count() {
        let fx = setup().await;
        let err = fx.service.list(fx.article_id, Some(-1)).await.unwrap_err();
        assert_eq!(err.status_code(), 400);

        let none = fx
            .service
            .list(fx.article_id, Some(0))
            .await
            .expect("List failed");
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_author_can_edit_own_comment() {
        let fx = setup().await;
        let comment = fx
            .service
            .create(comment_input(fx.article_id, "Typo hear"), fx.author.id)
            .await
            .expect("Create failed");

        let updated = fx
            .service
            .update(comment.comment.id, "Typo here", &fx.author)
            .await
            .expect("Update failed");
        assert_eq!(updated.comment.message, "Typo here");
    }

    #[tokio::test]
    async fn test_stranger_cannot_touch_comment_but_moderator_can() {
        let fx = setup().await;
        let users = SqlxUserRepository::new(fx.pool.clone());
        let stranger = users
            .create(&NewUser {
                username: "bob".to_string(),
                email: "bob@example.com".to_string(),
                password_hash: "$argon2id$test".to_string(),
                role_id: 1,
                first_name: None,
                last_name: None,
                about: None,
            })
            .await
            .expect("Failed to create user");
        let moderator = users
            .create(&NewUser {
                username: "mod".to_string(),
                email: "mod@example.com".to_string(),
                password_hash: "$argon2id$test".to_string(),
                role_id: 2,
                first_name: None,
                last_name: None,
                about: None,
            })
            .await
            .expect("Failed to create user");

        let comment = fx
            .service
            .create(comment_input(fx.article_id, "Mine"), fx.author.id)
            .await
            .expect("Create failed");

        let err = fx
            .service
            .update(comment.comment.id, "Hijacked", &stranger)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 403);

        let err = fx
            .service
            .delete(comment.comment.id, &stranger)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 403);

        fx.service
            .delete(comment.comment.id, &moderator)
            .await
            .expect("Moderator delete failed");
    }
}
