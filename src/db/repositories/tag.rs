//! Tag repository

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Tag;

/// Fields needed to insert a new tag
pub struct NewTag {
    pub name: String,
    pub description: String,
    pub created_by: i64,
}

/// Tag repository trait
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Insert a new tag and return the stored record
    async fn create(&self, tag: &NewTag) -> Result<Tag>;

    /// Get a tag by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Tag>>;

    /// Get a tag by exact name
    async fn get_by_name(&self, name: &str) -> Result<Option<Tag>>;

    /// List tags, optionally filtered by a case-insensitive substring
    /// match over the name
    async fn list(&self, name: Option<&str>) -> Result<Vec<Tag>>;

    /// Fetch all tags whose names appear in the given list
    async fn get_by_names(&self, names: &[String]) -> Result<Vec<Tag>>;

    /// Persist name and description changes; returns false if missing
    async fn update(&self, tag: &Tag) -> Result<bool>;

    /// Delete a tag; returns false if missing
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Count how many articles carry this tag
    async fn usage_count(&self, tag_id: i64) -> Result<i64>;
}

/// sqlx-backed tag repository
pub struct SqlxTagRepository {
    pool: DynDatabasePool,
}

impl SqlxTagRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TagRepository for SqlxTagRepository {
    async fn create(&self, tag: &NewTag) -> Result<Tag> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.pool.as_sqlite().unwrap(), tag).await,
            DatabaseDriver::Mysql => create_mysql(self.pool.as_mysql().unwrap(), tag).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Tag>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Tag>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_by_name_sqlite(self.pool.as_sqlite().unwrap(), name).await
            }
            DatabaseDriver::Mysql => get_by_name_mysql(self.pool.as_mysql().unwrap(), name).await,
        }
    }

    async fn list(&self, name: Option<&str>) -> Result<Vec<Tag>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_sqlite(self.pool.as_sqlite().unwrap(), name).await,
            DatabaseDriver::Mysql => list_mysql(self.pool.as_mysql().unwrap(), name).await,
        }
    }

    async fn get_by_names(&self, names: &[String]) -> Result<Vec<Tag>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_by_names_sqlite(self.pool.as_sqlite().unwrap(), names).await
            }
            DatabaseDriver::Mysql => get_by_names_mysql(self.pool.as_mysql().unwrap(), names).await,
        }
    }

    async fn update(&self, tag: &Tag) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_sqlite(self.pool.as_sqlite().unwrap(), tag).await,
            DatabaseDriver::Mysql => update_mysql(self.pool.as_mysql().unwrap(), tag).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => delete_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn usage_count(&self, tag_id: i64) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                usage_count_sqlite(self.pool.as_sqlite().unwrap(), tag_id).await
            }
            DatabaseDriver::Mysql => usage_count_mysql(self.pool.as_mysql().unwrap(), tag_id).await,
        }
    }
}

const SELECT_TAG: &str =
    "SELECT id, name, description, created_by, created_at, updated_at FROM tags";

fn tag_from_sqlite_row(row: &sqlx::sqlite::SqliteRow) -> Tag {
    Tag {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        created_by: row.get("created_by"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn tag_from_mysql_row(row: &sqlx::mysql::MySqlRow) -> Tag {
    Tag {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        created_by: row.get("created_by"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn in_placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

// SQLite implementations

async fn create_sqlite(pool: &SqlitePool, tag: &NewTag) -> Result<Tag> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO tags (name, description, created_by, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&tag.name)
    .bind(&tag.description)
    .bind(tag.created_by)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(Tag {
        id: result.last_insert_rowid(),
        name: tag.name.clone(),
        description: tag.description.clone(),
        created_by: tag.created_by,
        created_at: now,
        updated_at: now,
    })
}

async fn get_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Tag>> {
    let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_TAG))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| tag_from_sqlite_row(&r)))
}

async fn get_by_name_sqlite(pool: &SqlitePool, name: &str) -> Result<Option<Tag>> {
    let row = sqlx::query(&format!("{} WHERE name = ?", SELECT_TAG))
        .bind(name)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| tag_from_sqlite_row(&r)))
}

async fn list_sqlite(pool: &SqlitePool, name: Option<&str>) -> Result<Vec<Tag>> {
    let rows = match name {
        Some(term) => {
            let pattern = format!("%{}%", term.to_lowercase());
            sqlx::query(&format!(
                "{} WHERE LOWER(name) LIKE ? ORDER BY name",
                SELECT_TAG
            ))
            .bind(pattern)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query(&format!("{} ORDER BY name", SELECT_TAG))
                .fetch_all(pool)
                .await?
        }
    };
    Ok(rows.iter().map(tag_from_sqlite_row).collect())
}

async fn get_by_names_sqlite(pool: &SqlitePool, names: &[String]) -> Result<Vec<Tag>> {
    let sql = format!(
        "{} WHERE name IN ({}) ORDER BY name",
        SELECT_TAG,
        in_placeholders(names.len())
    );
    let mut query = sqlx::query(&sql);
    for name in names {
        query = query.bind(name);
    }
    let rows = query.fetch_all(pool).await?;
    Ok(rows.iter().map(tag_from_sqlite_row).collect())
}

async fn update_sqlite(pool: &SqlitePool, tag: &Tag) -> Result<bool> {
    let result =
        sqlx::query("UPDATE tags SET name = ?, description = ?, updated_at = ? WHERE id = ?")
            .bind(&tag.name)
            .bind(&tag.description)
            .bind(Utc::now())
            .bind(tag.id)
            .execute(pool)
            .await?;
    Ok(result.rows_affected() > 0)
}

async fn delete_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM tags WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

async fn usage_count_sqlite(pool: &SqlitePool, tag_id: i64) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) AS total FROM article_tags WHERE tag_id = ?")
        .bind(tag_id)
        .fetch_one(pool)
        .await?;
    Ok(row.get("total"))
}

// MySQL implementations

async fn create_mysql(pool: &MySqlPool, tag: &NewTag) -> Result<Tag> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO tags (name, description, created_by, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&tag.name)
    .bind(&tag.description)
    .bind(tag.created_by)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(Tag {
        id: result.last_insert_id() as i64,
        name: tag.name.clone(),
        description: tag.description.clone(),
        created_by: tag.created_by,
        created_at: now,
        updated_at: now,
    })
}

async fn get_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Tag>> {
    let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_TAG))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| tag_from_mysql_row(&r)))
}

async fn get_by_name_mysql(pool: &MySqlPool, name: &str) -> Result<Option<Tag>> {
    let row = sqlx::query(&format!("{} WHERE name = ?", SELECT_TAG))
        .bind(name)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| tag_from_mysql_row(&r)))
}

async fn list_mysql(pool: &MySqlPool, name: Option<&str>) -> Result<Vec<Tag>> {
    let rows = match name {
        Some(term) => {
            let pattern = format!("%{}%", term.to_lowercase());
            sqlx::query(&format!(
                "{} WHERE LOWER(name) LIKE ? ORDER BY name",
                SELECT_TAG
            ))
            .bind(pattern)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query(&format!("{} ORDER BY name", SELECT_TAG))
                .fetch_all(pool)
                .await?
        }
    };
    Ok(rows.iter().map(tag_from_mysql_row).collect())
}

async fn get_by_names_mysql(pool: &MySqlPool, names: &[String]) -> Result<Vec<Tag>> {
    let sql = format!(
        "{} WHERE name IN ({}) ORDER BY name",
        SELECT_TAG,
        in_placeholders(names.len())
    );
    let mut query = sqlx::query(&sql);
    for name in names {
        query = query.bind(name);
    }
    let rows = query.fetch_all(pool).await?;
    Ok(rows.iter().map(tag_from_mysql_row).collect())
}

async fn update_mysql(pool: &MySqlPool, tag: &Tag) -> Result<bool> {
    let result =
        sqlx::query("UPDATE tags SET name = ?, description = ?, updated_at = ? WHERE id = ?")
            .bind(&tag.name)
            .bind(&tag.description)
            .bind(Utc::now())
            .bind(tag.id)
            .execute(pool)
            .await?;
    Ok(result.rows_affected() > 0)
}

async fn delete_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM tags WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

async fn usage_count_mysql(pool: &MySqlPool, tag_id: i64) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) AS total FROM article_tags WHERE tag_id = ?")
        .bind(tag_id)
        .fetch_one(pool)
        .await?;
    Ok(row.get("total"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{NewUser, SqlxUserRepository, UserRepository};
    use crate::db::{create_test_pool, migrations, DynDatabasePool};

    async fn setup() -> (DynDatabasePool, SqlxTagRepository, i64) {
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

        (pool.clone(), SqlxTagRepository::new(pool), user.id)
    }

    fn new_tag(name: &str, created_by: i64) -> NewTag {
        NewTag {
            name: name.to_string(),
            description: String::new(),
            created_by,
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup_tag() {
        let (_pool, repo, user_id) = setup().await;

        let created = repo
            .create(&new_tag("rust", user_id))
            .await
            .expect("Failed to create tag");
        assert_eq!(created.name, "rust");
        assert_eq!(created.description, "");

        let by_id = repo
            .get_by_id(created.id)
            .await
            .expect("Query failed")
            .expect("Tag not found");
        assert_eq!(by_id.created_by, user_id);

        let by_name = repo
            .get_by_name("rust")
            .await
            .expect("Query failed")
            .expect("Tag not found");
        assert_eq!(by_name.id, created.id);
    }

    #[tokio::test]
    async fn test_duplicate_tag_name_fails() {
        let (_pool, repo, user_id) = setup().await;

        repo.create(&new_tag("rust", user_id))
            .await
            .expect("First create failed");
        assert!(repo.create(&new_tag("rust", user_id)).await.is_err());
    }

    #[tokio::test]
    async fn test_list_with_name_filter() {
        let (_pool, repo, user_id) = setup().await;
        repo.create(&new_tag("databases", user_id))
            .await
            .expect("Create failed");
        repo.create(&new_tag("Database-Design", user_id))
            .await
            .expect("Create failed");
        repo.create(&new_tag("rust", user_id))
            .await
            .expect("Create failed");

        let all = repo.list(None).await.expect("List failed");
        assert_eq!(all.len(), 3);

        let hits = repo.list(Some("database")).await.expect("List failed");
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn test_get_by_names_returns_only_existing() {
        let (_pool, repo, user_id) = setup().await;
        repo.create(&new_tag("rust", user_id))
            .await
            .expect("Create failed");
        repo.create(&new_tag("sqlite", user_id))
            .await
            .expect("Create failed");

        let names = vec![
            "rust".to_string(),
            "sqlite".to_string(),
            "missing".to_string(),
        ];
        let found = repo.get_by_names(&names).await.expect("Query failed");
        assert_eq!(found.len(), 2);

        let empty = repo.get_by_names(&[]).await.expect("Query failed");
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete_tag() {
        let (_pool, repo, user_id) = setup().await;
        let mut tag = repo
            .create(&new_tag("rust", user_id))
            .await
            .expect("Create failed");

        tag.name = "rust-lang".to_string();
        tag.description = "Systems programming".to_string();
        assert!(repo.update(&tag).await.expect("Update failed"));

        let fetched = repo
            .get_by_id(tag.id)
            .await
            .expect("Query failed")
            .expect("Tag missing");
        assert_eq!(fetched.name, "rust-lang");
        assert_eq!(fetched.description, "Systems programming");

        assert!(repo.delete(tag.id).await.expect("Delete failed"));
        assert!(repo.get_by_id(tag.id).await.expect("Query failed").is_none());
    }

    #[tokio::test]
    async fn test_usage_count_starts_at_zero() {
        let (_pool, repo, user_id) = setup().await;
        let tag = repo
            .create(&new_tag("rust", user_id))
            .await
            .expect("Create failed");

        let count = repo.usage_count(tag.id).await.expect("Count failed");
        assert_eq!(count, 0);
    }
}
