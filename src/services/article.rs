//! Article service
//!
//! Articles reference tags by name on the way in; names that don't
//! resolve to existing tags are rejected, never silently dropped.

use anyhow::Result;
use std::sync::Arc;

use crate::db::repositories::{
    ArticleRepository, CommentRepository, NewArticle, TagRepository, UserRepository,
};
use crate::models::{Article, ArticleDetail, CreateArticleInput, UpdateArticleInput, User};

/// Error types for article service operations
#[derive(Debug, thiserror::Error)]
pub enum ArticleServiceError {
    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Actor may not edit or delete this article
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Requested article, author, or tag not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl ArticleServiceError {
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

/// Article service for managing articles and their tag assignments
pub struct ArticleService {
    article_repo: Arc<dyn ArticleRepository>,
    tag_repo: Arc<dyn TagRepository>,
    user_repo: Arc<dyn UserRepository>,
    comment_repo: Arc<dyn CommentRepository>,
}

impl ArticleService {
    pub fn new(
        article_repo: Arc<dyn ArticleRepository>,
        tag_repo: Arc<dyn TagRepository>,
        user_repo: Arc<dyn UserRepository>,
        comment_repo: Arc<dyn CommentRepository>,
    ) -> Self {
        Self {
            article_repo,
            tag_repo,
            user_repo,
            comment_repo,
        }
    }

    /// Create a new article, attaching existing tags by name
    pub async fn create(
        &self,
        input: CreateArticleInput,
        author_id: i64,
    ) -> Result<ArticleDetail, ArticleServiceError> {
        if input.title.trim().is_empty() {
            return Err(ArticleServiceError::ValidationError(
                "title cannot be empty".to_string(),
            ));
        }
        if input.content.trim().is_empty() {
            return Err(ArticleServiceError::ValidationError(
                "content cannot be empty".to_string(),
            ));
        }
        if self.user_repo.get_by_id(author_id).await?.is_none() {
            return Err(ArticleServiceError::NotFound(format!(
                "user {}",
                author_id
            )));
        }

        let tag_ids = self.resolve_tags(&input.tags).await?;

        let article = self
            .article_repo
            .create(&NewArticle {
                title: input.title,
                content: input.content,
                description: input.description,
                author_id,
            })
            .await?;

        if !tag_ids.is_empty() {
            self.article_repo.set_tags(article.id, &tag_ids).await?;
        }

        self.get_detail(article.id).await
    }

    /// An article together with author name, tags, and comment count
    pub async fn get_detail(&self, id: i64) -> Result<ArticleDetail, ArticleServiceError> {
        let article = self
            .article_repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ArticleServiceError::NotFound(format!("article {}", id)))?;
        self.detail_for(article).await
    }

    /// All articles, optionally filtered by a title substring
    pub async fn search(&self, title: Option<&str>) -> Result<Vec<Article>, ArticleServiceError> {
        Ok(self.article_repo.list(title).await?)
    }

    /// Newest-first window of articles
    pub async fn latest(
        &self,
        start_index: i64,
        count: i64,
    ) -> Result<Vec<Article>, ArticleServiceError> {
        if start_index < 0 || count < 0 {
            return Err(ArticleServiceError::ValidationError(
                "start index and count must be non-negative".to_string(),
            ));
        }
        Ok(self.article_repo.latest(start_index, count).await?)
    }

    /// All articles by one author
    pub async fn by_author(&self, author_id: i64) -> Result<Vec<Article>, ArticleServiceError> {
        Ok(self.article_repo.by_author(author_id).await?)
    }

    /// Update an article.
    ///
    /// Permitted for the article's author and for moderators and
    /// administrators. A tag list in the input replaces the article's
    /// current tag set.
    pub async fn update(
        &self,
        id: i64,
        input: UpdateArticleInput,
        editor: &User,
    ) -> Result<ArticleDetail, ArticleServiceError> {
        let mut article = self
            .article_repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ArticleServiceError::NotFound(format!("article {}", id)))?;

        if !editor.can_edit(article.author_id) {
            return Err(ArticleServiceError::Forbidden(
                "only the author or a moderator can edit this article".to_string(),
            ));
        }

        if let Some(title) = input.title {
            if title.trim().is_empty() {
                return Err(ArticleServiceError::ValidationError(
                    "title cannot be empty".to_string(),
                ));
            }
            article.title = title;
        }
        if let Some(content) = input.content {
            if content.trim().is_empty() {
                return Err(ArticleServiceError::ValidationError(
                    "content cannot be empty".to_string(),
                ));
            }
            article.content = content;
        }
        if let Some(description) = input.description {
            article.description = description;
        }

        if let Some(tag_names) = input.tags {
            let tag_ids = self.resolve_tags(&tag_names).await?;
            self.article_repo.set_tags(id, &tag_ids).await?;
        }

        self.article_repo.update(&article).await?;
        self.get_detail(id).await
    }

    /// Delete an article, subject to the same owner-or-moderator rule
    pub async fn delete(&self, id: i64, actor: &User) -> Result<(), ArticleServiceError> {
        let article = self
            .article_repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ArticleServiceError::NotFound(format!("article {}", id)))?;

        if !actor.can_edit(article.author_id) {
            return Err(ArticleServiceError::Forbidden(
                "only the author or a moderator can delete this article".to_string(),
            ));
        }

        self.article_repo.delete(id).await?;
        Ok(())
    }

    async fn detail_for(&self, article: Article) -> Result<ArticleDetail, ArticleServiceError> {
        let author_name = self
            .user_repo
            .get_by_id(article.author_id)
            .await?
            .map(|u| u.username)
            .unwrap_or_default();
        let tags = self.article_repo.tags_for(article.id).await?;
        let comment_count = self.comment_repo.count_for_article(article.id).await?;

        Ok(ArticleDetail {
            article,
            author_name,
            tags,
            comment_count,
        })
    }

    /// Resolve tag names to IDs, rejecting names with no matching tag.
    /// Repeated names count once.
    async fn resolve_tags(&self, names: &[String]) -> Result<Vec<i64>, ArticleServiceError> {
        let mut unique: Vec<String> = Vec::new();
        for name in names {
            if !unique.contains(name) {
                unique.push(name.clone());
            }
        }
        if unique.is_empty() {
            return Ok(Vec::new());
        }

        let found = self.tag_repo.get_by_names(&unique).await?;
        if found.len() != unique.len() {
            let missing: Vec<&str> = unique
                .iter()
                .filter(|name| !found.iter().any(|t| &t.name == *name))
                .map(String::as_str)
                .collect();
            return Err(ArticleServiceError::NotFound(format!(
                "unknown tags: {}",
                missing.join(", ")
            )));
        }
        Ok(found.iter().map(|t| t.id).collect())
    }
}
