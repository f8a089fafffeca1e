//! Article models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::tag::Tag;

/// An article entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub description: String,
    pub author_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An article together with its author name, tags, and comment count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleDetail {
    #[serde(flatten)]
    pub article: Article,
    pub author_name: String,
    pub tags: Vec<Tag>,
    pub comment_count: i64,
}

/// Input for creating an article
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateArticleInput {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub description: String,
    /// Names of existing tags to attach; unknown names are rejected
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Input for updating an article
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateArticleInput {
    pub title: Option<String>,
    pub content: Option<String>,
    pub description: Option<String>,
    /// When present, replaces the article's tag set
    pub tags: Option<Vec<String>>,
}
