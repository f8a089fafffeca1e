//! Tag models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tag entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub description: String,
    /// User who created the tag
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a tag
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateTagInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Input for updating a tag.
///
/// An empty name leaves the current name in place; the description is
/// always overwritten.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTagInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}
