//! Comment repository

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Comment, CommentWithAuthor};

/// Fields needed to insert a new comment
pub struct NewComment {
    pub article_id: i64,
    pub author_id: i64,
    pub message: String,
}

/// Comment repository trait
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Insert a new comment and return the stored record
    async fn create(&self, comment: &NewComment) -> Result<Comment>;

    /// Get a comment by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>>;

    /// Get a comment with its author's username
    async fn get_with_author(&self, id: i64) -> Result<Option<CommentWithAuthor>>;

    /// Comments for an article, newest first, optionally limited
    async fn list_for_article(
        &self,
        article_id: i64,
        limit: Option<i64>,
    ) -> Result<Vec<CommentWithAuthor>>;

    /// Count comments on an article
    async fn count_for_article(&self, article_id: i64) -> Result<i64>;

    /// Replace the comment message; returns false if missing
    async fn update_message(&self, id: i64, message: &str) -> Result<bool>;

    /// Delete a comment; returns false if missing
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// sqlx-backed comment repository
pub struct SqlxCommentRepository {
    pool: DynDatabasePool,
}

impl SqlxCommentRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentRepository for SqlxCommentRepository {
    async fn create(&self, comment: &NewComment) -> Result<Comment> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.pool.as_sqlite().unwrap(), comment).await,
            DatabaseDriver::Mysql => create_mysql(self.pool.as_mysql().unwrap(), comment).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn get_with_author(&self, id: i64) -> Result<Option<CommentWithAuthor>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_with_author_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => get_with_author_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn list_for_article(
        &self,
        article_id: i64,
        limit: Option<i64>,
    ) -> Result<Vec<CommentWithAuthor>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_for_article_sqlite(self.pool.as_sqlite().unwrap(), article_id, limit).await
            }
            DatabaseDriver::Mysql => {
                list_for_article_mysql(self.pool.as_mysql().unwrap(), article_id, limit).await
            }
        }
    }

    async fn count_for_article(&self, article_id: i64) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                count_for_article_sqlite(self.pool.as_sqlite().unwrap(), article_id).await
            }
            DatabaseDriver::Mysql => {
                count_for_article_mysql(self.pool.as_mysql().unwrap(), article_id).await
            }
        }
    }

    async fn update_message(&self, id: i64, message: &str) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_message_sqlite(self.pool.as_sqlite().unwrap(), id, message).await
            }
            DatabaseDriver::Mysql => {
                update_message_mysql(self.pool.as_mysql().unwrap(), id, message).await
            }
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => delete_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }
}

const SELECT_COMMENT: &str =
    "SELECT id, article_id, author_id, message, created_at, updated_at FROM comments";

const SELECT_COMMENT_WITH_AUTHOR: &str = "SELECT c.id, c.article_id, c.author_id, c.message, \
     c.created_at, c.updated_at, u.username AS author_name \
     FROM comments c JOIN users u ON c.author_id = u.id";

fn comment_from_sqlite_row(row: &sqlx::sqlite::SqliteRow) -> Comment {
    Comment {
        id: row.get("id"),
        article_id: row.get("article_id"),
        author_id: row.get("author_id"),
        message: row.get("message"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn comment_from_mysql_row(row: &sqlx::mysql::MySqlRow) -> Comment {
    Comment {
        id: row.get("id"),
        article_id: row.get("article_id"),
        author_id: row.get("author_id"),
        message: row.get("message"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn with_author_from_sqlite_row(row: &sqlx::sqlite::SqliteRow) -> CommentWithAuthor {
    CommentWithAuthor {
        comment: comment_from_sqlite_row(row),
        author_name: row.get("author_name"),
    }
}

fn with_author_from_mysql_row(row: &sqlx::mysql::MySqlRow) -> CommentWithAuthor {
    CommentWithAuthor {
        comment: comment_from_mysql_row(row),
        author_name: row.get("author_name"),
    }
}

// SQLite implementations

async fn create_sqlite(pool: &SqlitePool, comment: &NewComment) -> Result<Comment> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO comments (article_id, author_id, message, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(comment.article_id)
    .bind(comment.author_id)
    .bind(&comment.message)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(Comment {
        id: result.last_insert_rowid(),
        article_id: comment.article_id,
        author_id: comment.author_id,
        message: comment.message.clone(),
        created_at: now,
        updated_at: now,
    })
}

async fn get_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Comment>> {
    let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_COMMENT))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| comment_from_sqlite_row(&r)))
}

async fn get_with_author_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<CommentWithAuthor>> {
    let row = sqlx::query(&format!("{} WHERE c.id = ?", SELECT_COMMENT_WITH_AUTHOR))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| with_author_from_sqlite_row(&r)))
}

async fn list_for_article_sqlite(
    pool: &SqlitePool,
    article_id: i64,
    limit: Option<i64>,
) -> Result<Vec<CommentWithAuthor>> {
    let rows = match limit {
        Some(n) => {
            sqlx::query(&format!(
                "{} WHERE c.article_id = ? ORDER BY c.created_at DESC LIMIT ?",
                SELECT_COMMENT_WITH_AUTHOR
            ))
            .bind(article_id)
            .bind(n)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query(&format!(
                "{} WHERE c.article_id = ? ORDER BY c.created_at DESC",
                SELECT_COMMENT_WITH_AUTHOR
            ))
            .bind(article_id)
            .fetch_all(pool)
            .await?
        }
    };
    Ok(rows.iter().map(with_author_from_sqlite_row).collect())
}

async fn count_for_article_sqlite(pool: &SqlitePool, article_id: i64) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) AS total FROM comments WHERE article_id = ?")
        .bind(article_id)
        .fetch_one(pool)
        .await?;
    Ok(row.get("total"))
}

async fn update_message_sqlite(pool: &SqlitePool, id: i64, message: &str) -> Result<bool> {
    let result = sqlx::query("UPDATE comments SET message = ?, updated_at = ? WHERE id = ?")
        .bind(message)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

async fn delete_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM comments WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

// MySQL implementations

async fn create_mysql(pool: &MySqlPool, comment: &NewComment) -> Result<Comment> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO comments (article_id, author_id, message, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(comment.article_id)
    .bind(comment.author_id)
    .bind(&comment.message)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(Comment {
        id: result.last_insert_id() as i64,
        article_id: comment.article_id,
        author_id: comment.author_id,
        message: comment.message.clone(),
        created_at: now,
        updated_at: now,
    })
}

async fn get_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Comment>> {
    let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_COMMENT))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| comment_from_mysql_row(&r)))
}

async fn get_with_author_mysql(pool: &MySqlPool, id: i64) -> Result<Option<CommentWithAuthor>> {
    let row = sqlx::query(&format!("{} WHERE c.id = ?", SELECT_COMMENT_WITH_AUTHOR))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| with_author_from_mysql_row(&r)))
}

async fn list_for_article_mysql(
    pool: &MySqlPool,
    article_id: i64,
    limit: Option<i64>,
) -> Result<Vec<CommentWithAuthor>> {
    let rows = match limit {
        Some(n) => {
            sqlx::query(&format!(
                "{} WHERE c.article_id = ? ORDER BY c.created_at DESC LIMIT ?",
                SELECT_COMMENT_WITH_AUTHOR
            ))
            .bind(article_id)
            .bind(n)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query(&format!(
                "{} WHERE c.article_id = ? ORDER BY c.created_at DESC",
                SELECT_COMMENT_WITH_AUTHOR
            ))
            .bind(article_id)
            .fetch_all(pool)
            .await?
        }
    };
    Ok(rows.iter().map(with_author_from_mysql_row).collect())
}

async fn count_for_article_mysql(pool: &MySqlPool, article_id: i64) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) AS total FROM comments WHERE article_id = ?")
        .bind(article_id)
        .fetch_one(pool)
        .await?;
    Ok(row.get("total"))
}

async fn update_message_mysql(pool: &MySqlPool, id: i64, message: &str) -> Result<bool> {
    let result = sqlx::query("UPDATE comments SET message = ?, updated_at = ? WHERE id = ?")
        .bind(message)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

async fn delete_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM comments WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
