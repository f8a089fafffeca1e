//! Article repository
//!
//! Also owns the article_tags junction table: tag assignments are
//! replaced wholesale on update rather than diffed.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Article, Tag};

/// Fields needed to insert a new article
pub struct NewArticle {
    pub title: String,
    pub content: String,
    pub description: String,
    pub author_id: i64,
}

/// Article repository trait
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// Insert a new article and return the stored record
    async fn create(&self, article: &NewArticle) -> Result<Article>;

    /// Get an article by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Article>>;

    /// List articles, optionally filtered by a case-insensitive
    /// substring match over the title
    async fn list(&self, title: Option<&str>) -> Result<Vec<Article>>;

    /// Page through articles, newest first
    async fn latest(&self, offset: i64, limit: i64) -> Result<Vec<Article>>;

    /// All articles by one author, newest first
    async fn by_author(&self, author_id: i64) -> Result<Vec<Article>>;

    /// Persist editable fields; returns false if missing
    async fn update(&self, article: &Article) -> Result<bool>;

    /// Delete an article; returns false if missing
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Replace the article's tag assignments with the given tag IDs
    async fn set_tags(&self, article_id: i64, tag_ids: &[i64]) -> Result<()>;

    /// All tags assigned to an article, ordered by name
    async fn tags_for(&self, article_id: i64) -> Result<Vec<Tag>>;
}

/// sqlx-backed article repository
pub struct SqlxArticleRepository {
    pool: DynDatabasePool,
}

impl SqlxArticleRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ArticleRepository for SqlxArticleRepository {
    async fn create(&self, article: &NewArticle) -> Result<Article> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.pool.as_sqlite().unwrap(), article).await,
            DatabaseDriver::Mysql => create_mysql(self.pool.as_mysql().unwrap(), article).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Article>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn list(&self, title: Option<&str>) -> Result<Vec<Article>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_sqlite(self.pool.as_sqlite().unwrap(), title).await,
            DatabaseDriver::Mysql => list_mysql(self.pool.as_mysql().unwrap(), title).await,
        }
    }

    async fn latest(&self, offset: i64, limit: i64) -> Result<Vec<Article>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                latest_sqlite(self.pool.as_sqlite().unwrap(), offset, limit).await
            }
            DatabaseDriver::Mysql => {
                latest_mysql(self.pool.as_mysql().unwrap(), offset, limit).await
            }
        }
    }

    async fn by_author(&self, author_id: i64) -> Result<Vec<Article>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                by_author_sqlite(self.pool.as_sqlite().unwrap(), author_id).await
            }
            DatabaseDriver::Mysql => by_author_mysql(self.pool.as_mysql().unwrap(), author_id).await,
        }
    }

    async fn update(&self, article: &Article) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_sqlite(self.pool.as_sqlite().unwrap(), article).await,
            DatabaseDriver::Mysql => update_mysql(self.pool.as_mysql().unwrap(), article).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => delete_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn set_tags(&self, article_id: i64, tag_ids: &[i64]) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                set_tags_sqlite(self.pool.as_sqlite().unwrap(), article_id, tag_ids).await
            }
            DatabaseDriver::Mysql => {
                set_tags_mysql(self.pool.as_mysql().unwrap(), article_id, tag_ids).await
            }
        }
    }

    async fn tags_for(&self, article_id: i64) -> Result<Vec<Tag>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                tags_for_sqlite(self.pool.as_sqlite().unwrap(), article_id).await
            }
            DatabaseDriver::Mysql => tags_for_mysql(self.pool.as_mysql().unwrap(), article_id).await,
        }
    }
}

const SELECT_ARTICLE: &str =
    "SELECT id, title, content, description, author_id, created_at, updated_at FROM articles";

const SELECT_ARTICLE_TAGS: &str = "SELECT t.id, t.name, t.description, t.created_by, \
     t.created_at, t.updated_at FROM tags t \
     JOIN article_tags at ON at.tag_id = t.id \
     WHERE at.article_id = ? ORDER BY t.name";

fn article_from_sqlite_row(row: &sqlx::sqlite::SqliteRow) -> Article {
    Article {
        id: row.get("id"),
        title: row.get("title"),
        content: row.get("content"),
        description: row.get("description"),
        author_id: row.get("author_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn article_from_mysql_row(row: &sqlx::mysql::MySqlRow) -> Article {
    Article {
        id: row.get("id"),
        title: row.get("title"),
        content: row.get("content"),
        description: row.get("description"),
        author_id: row.get("author_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

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

// SQLite implementations

async fn create_sqlite(pool: &SqlitePool, article: &NewArticle) -> Result<Article> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO articles (title, content, description, author_id, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&article.title)
    .bind(&article.content)
    .bind(&article.description)
    .bind(article.author_id)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(Article {
        id: result.last_insert_rowid(),
        title: article.title.clone(),
        content: article.content.clone(),
        description: article.description.clone(),
        author_id: article.author_id,
        created_at: now,
        updated_at: now,
    })
}

async fn get_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Article>> {
    let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_ARTICLE))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| article_from_sqlite_row(&r)))
}

async fn list_sqlite(pool: &SqlitePool, title: Option<&str>) -> Result<Vec<Article>> {
    let rows = match title {
        Some(term) => {
            let pattern = format!("%{}%", term.to_lowercase());
            sqlx::query(&format!(
                "{} WHERE LOWER(title) LIKE ? ORDER BY created_at DESC",
                SELECT_ARTICLE
            ))
            .bind(pattern)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query(&format!("{} ORDER BY created_at DESC", SELECT_ARTICLE))
                .fetch_all(pool)
                .await?
        }
    };
    Ok(rows.iter().map(article_from_sqlite_row).collect())
}

async fn latest_sqlite(pool: &SqlitePool, offset: i64, limit: i64) -> Result<Vec<Article>> {
    let rows = sqlx::query(&format!(
        "{} ORDER BY created_at DESC LIMIT ? OFFSET ?",
        SELECT_ARTICLE
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(rows.iter().map(article_from_sqlite_row).collect())
}

async fn by_author_sqlite(pool: &SqlitePool, author_id: i64) -> Result<Vec<Article>> {
    let rows = sqlx::query(&format!(
        "{} WHERE author_id = ? ORDER BY created_at DESC",
        SELECT_ARTICLE
    ))
    .bind(author_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.iter().map(article_from_sqlite_row).collect())
}

async fn update_sqlite(pool: &SqlitePool, article: &Article) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE articles SET title = ?, content = ?, description = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&article.title)
    .bind(&article.content)
    .bind(&article.description)
    .bind(Utc::now())
    .bind(article.id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

async fn delete_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM articles WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

async fn set_tags_sqlite(pool: &SqlitePool, article_id: i64, tag_ids: &[i64]) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM article_tags WHERE article_id = ?")
        .bind(article_id)
        .execute(&mut *tx)
        .await?;

    let now = Utc::now();
    for tag_id in tag_ids {
        sqlx::query("INSERT INTO article_tags (article_id, tag_id, created_at) VALUES (?, ?, ?)")
            .bind(article_id)
            .bind(tag_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(())
}

async fn tags_for_sqlite(pool: &SqlitePool, article_id: i64) -> Result<Vec<Tag>> {
    let rows = sqlx::query(SELECT_ARTICLE_TAGS)
        .bind(article_id)
        .fetch_all(pool)
        .await?;
    Ok(rows.iter().map(tag_from_sqlite_row).collect())
}

// MySQL implementations

async fn create_mysql(pool: &MySqlPool, article: &NewArticle) -> Result<Article> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO articles (title, content, description, author_id, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&article.title)
    .bind(&article.content)
    .bind(&article.description)
    .bind(article.author_id)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(Article {
        id: result.last_insert_id() as i64,
        title: article.title.clone(),
        content: article.content.clone(),
        description: article.description.clone(),
        author_id: article.author_id,
        created_at: now,
        updated_at: now,
    })
}

async fn get_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Article>> {
    let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_ARTICLE))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| article_from_mysql_row(&r)))
}

async fn list_mysql(pool: &MySqlPool, title: Option<&str>) -> Result<Vec<Article>> {
    let rows = match title {
        Some(term) => {
            let pattern = format!("%{}%", term.to_lowercase());
            sqlx::query(&format!(
                "{} WHERE LOWER(title) LIKE ? ORDER BY created_at DESC",
                SELECT_ARTICLE
            ))
            .bind(pattern)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query(&format!("{} ORDER BY created_at DESC", SELECT_ARTICLE))
                .fetch_all(pool)
                .await?
        }
    };
    Ok(rows.iter().map(article_from_mysql_row).collect())
}

async fn latest_mysql(pool: &MySqlPool, offset: i64, limit: i64) -> Result<Vec<Article>> {
    let rows = sqlx::query(&format!(
        "{} ORDER BY created_at DESC LIMIT ? OFFSET ?",
        SELECT_ARTICLE
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(rows.iter().map(article_from_mysql_row).collect())
}

async fn by_author_mysql(pool: &MySqlPool, author_id: i64) -> Result<Vec<Article>> {
    let rows = sqlx::query(&format!(
        "{} WHERE author_id = ? ORDER BY created_at DESC",
        SELECT_ARTICLE
    ))
    .bind(author_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.iter().map(article_from_mysql_row).collect())
}

async fn update_mysql(pool: &MySqlPool, article: &Article) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE articles SET title = ?, content = ?, description = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&article.title)
    .bind(&article.content)
    .bind(&article.description)
    .bind(Utc::now())
    .bind(article.id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

async fn delete_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM articles WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

async fn set_tags_mysql(pool: &MySqlPool, article_id: i64, tag_ids: &[i64]) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM article_tags WHERE article_id = ?")
        .bind(article_id)
        .execute(&mut *tx)
        .await?;

    let now = Utc::now();
    for tag_id in tag_ids {
        sqlx::query("INSERT INTO article_tags (article_id, tag_id, created_at) VALUES (?, ?, ?)")
            .bind(article_id)
            .bind(tag_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(())
}

async fn tags_for_mysql(pool: &MySqlPool, article_id: i64) -> Result<Vec<Tag>> {
    let rows = sqlx::query(SELECT_ARTICLE_TAGS)
        .bind(article_id)
        .fetch_all(pool)
        .await?;
    Ok(rows.iter().map(tag_from_mysql_row).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        NewTag, NewUser, SqlxTagRepository, SqlxUserRepository, TagRepository, UserRepository,
    };
    use crate::db::{create_test_pool, migrations, DynDatabasePool};

    async fn setup() -> (DynDatabasePool, SqlxArticleRepository, i64) {
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

        (pool.clone(), SqlxArticleRepository::new(pool), user.id)
    }

    fn new_article(title: &str, author_id: i64) -> NewArticle {
        NewArticle {
            title: title.to_string(),
            content: "Body text".to_string(),
            description: String::new(),
            author_id,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_article() {
        let (_pool, repo, author_id) = setup().await;

        let created = repo
            .create(&new_article("Hello SQLite", author_id))
            .await
            .expect("Failed to create article");

        let fetched = repo
            .get_by_id(created.id)
            .await
            .expect("Query failed")
            .expect("Article not found");
        assert_eq!(fetched.title, "Hello SQLite");
        assert_eq!(fetched.author_id, author_id);
        assert_eq!(fetched.description, "");
    }

    #[tokio::test]
    async fn test_list_filters_by_title() {
        let (_pool, repo, author_id) = setup().await;
        repo.create(&new_article("Intro to Rust", author_id))
            .await
            .expect("Create failed");
        repo.create(&new_article("Advanced Rust", author_id))
            .await
            .expect("Create failed");
        repo.create(&new_article("Gardening", author_id))
            .await
            .expect("Create failed");

        let all = repo.list(None).await.expect("List failed");
        assert_eq!(all.len(), 3);

        let hits = repo.list(Some("rust")).await.expect("List failed");
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn test_latest_pages_newest_first() {
        let (_pool, repo, author_id) = setup().await;
        for i in 0..5 {
            repo.create(&new_article(&format!("Post {}", i), author_id))
                .await
                .expect("Create failed");
            // Distinct created_at values so ordering is deterministic
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        let first_page = repo.latest(0, 2).await.expect("Query failed");
        assert_eq!(first_page.len(), 2);
        assert_eq!(first_page[0].title, "Post 4");
        assert_eq!(first_page[1].title, "Post 3");

        let second_page = repo.latest(2, 2).await.expect("Query failed");
        assert_eq!(second_page[0].title, "Post 2");

        let past_end = repo.latest(10, 2).await.expect("Query failed");
        assert!(past_end.is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete_article() {
        let (_pool, repo, author_id) = setup().await;
        let mut article = repo
            .create(&new_article("Draft", author_id))
            .await
            .expect("Create failed");

        article.title = "Published".to_string();
        article.description = "Short summary".to_string();
        assert!(repo.update(&article).await.expect("Update failed"));

        let fetched = repo
            .get_by_id(article.id)
            .await
            .expect("Query failed")
            .expect("Article missing");
        assert_eq!(fetched.title, "Published");
        assert_eq!(fetched.description, "Short summary");

        assert!(repo.delete(article.id).await.expect("Delete failed"));
        assert!(repo
            .get_by_id(article.id)
            .await
            .expect("Query failed")
            .is_none());
    }

    #[tokio::test]
    async fn test_set_tags_replaces_assignments() {
        let (pool, repo, author_id) = setup().await;
        let tags = SqlxTagRepository::new(pool);

        let rust = tags
            .create(&NewTag {
                name: "rust".to_string(),
                description: String::new(),
                created_by: author_id,
            })
            .await
            .expect("Create tag failed");
        let web = tags
            .create(&NewTag {
                name: "web".to_string(),
                description: String::new(),
                created_by: author_id,
            })
            .await
            .expect("Create tag failed");

        let article = repo
            .create(&new_article("Tagged", author_id))
            .await
            .expect("Create failed");

        repo.set_tags(article.id, &[rust.id, web.id])
            .await
            .expect("Set tags failed");
        let assigned = repo.tags_for(article.id).await.expect("Query failed");
        assert_eq!(assigned.len(), 2);

        repo.set_tags(article.id, &[web.id])
            .await
            .expect("Set tags failed");
        let assigned = repo.tags_for(article.id).await.expect("Query failed");
        assert_eq!(assigned.len(), 1);
        assert_eq!(assigned[0].name, "web");

        assert_eq!(tags.usage_count(web.id).await.expect("Count failed"), 1);
        assert_eq!(tags.usage_count(rust.id).await.expect("Count failed"), 0);
    }

    #[tokio::test]
    async fn test_deleting_article_clears_tag_assignments() {
        let (pool, repo, author_id) = setup().await;
        let tags = SqlxTagRepository::new(pool);

        let rust = tags
            .create(&NewTag {
                name: "rust".to_string(),
                description: String::new(),
                created_by: author_id,
            })
            .await
            .expect("Create tag failed");

        let article = repo
            .create(&new_article("Tagged", author_id))
            .await
            .expect("Create failed");
        repo.set_tags(article.id, &[rust.id])
            .await
            .expect("Set tags failed");

        repo.delete(article.id).await.expect("Delete failed");
        assert_eq!(tags.usage_count(rust.id).await.expect("Count failed"), 0);
    }
}
