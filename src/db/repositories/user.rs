//! User repository
//!
//! Users are always fetched together with their role name so the rest
//! of the application never has to resolve role IDs by hand.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::User;

/// Fields needed to insert a new user
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub about: Option<String>,
}

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user and return the stored record
    async fn create(&self, user: &NewUser) -> Result<User>;

    /// Get a user by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Get a user by exact username
    async fn get_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Get a user by exact email
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    /// List users, optionally filtered by a case-insensitive substring
    /// match over username and first/last names
    async fn list(&self, search: Option<&str>) -> Result<Vec<User>>;

    /// Persist editable fields of a user; returns false if missing
    async fn update(&self, user: &User) -> Result<bool>;

    /// Delete a user; returns false if missing
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Count users holding the given role
    async fn count_with_role(&self, role_name: &str) -> Result<i64>;
}

/// sqlx-backed user repository
pub struct SqlxUserRepository {
    pool: DynDatabasePool,
}

impl SqlxUserRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &NewUser) -> Result<User> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.pool.as_sqlite().unwrap(), user).await,
            DatabaseDriver::Mysql => create_mysql(self.pool.as_mysql().unwrap(), user).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_by_username_sqlite(self.pool.as_sqlite().unwrap(), username).await
            }
            DatabaseDriver::Mysql => {
                get_by_username_mysql(self.pool.as_mysql().unwrap(), username).await
            }
        }
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_by_email_sqlite(self.pool.as_sqlite().unwrap(), email).await
            }
            DatabaseDriver::Mysql => get_by_email_mysql(self.pool.as_mysql().unwrap(), email).await,
        }
    }

    async fn list(&self, search: Option<&str>) -> Result<Vec<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_sqlite(self.pool.as_sqlite().unwrap(), search).await,
            DatabaseDriver::Mysql => list_mysql(self.pool.as_mysql().unwrap(), search).await,
        }
    }

    async fn update(&self, user: &User) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_sqlite(self.pool.as_sqlite().unwrap(), user).await,
            DatabaseDriver::Mysql => update_mysql(self.pool.as_mysql().unwrap(), user).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => delete_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn count_with_role(&self, role_name: &str) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                count_with_role_sqlite(self.pool.as_sqlite().unwrap(), role_name).await
            }
            DatabaseDriver::Mysql => {
                count_with_role_mysql(self.pool.as_mysql().unwrap(), role_name).await
            }
        }
    }
}

const SELECT_USER: &str = "SELECT u.id, u.username, u.email, u.password_hash, u.role_id, \
     r.name AS role_name, u.first_name, u.last_name, u.about, u.created_at, u.updated_at \
     FROM users u JOIN roles r ON u.role_id = r.id";

fn user_from_sqlite_row(row: &sqlx::sqlite::SqliteRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role_id: row.get("role_id"),
        role: row.get("role_name"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        about: row.get("about"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn user_from_mysql_row(row: &sqlx::mysql::MySqlRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role_id: row.get("role_id"),
        role: row.get("role_name"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        about: row.get("about"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

// SQLite implementations

async fn create_sqlite(pool: &SqlitePool, user: &NewUser) -> Result<User> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO users (username, email, password_hash, role_id, first_name, last_name, about, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.role_id)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.about)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    let id = result.last_insert_rowid();
    let created = get_by_id_sqlite(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("User {} missing after insert", id))?;
    Ok(created)
}

async fn get_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<User>> {
    let row = sqlx::query(&format!("{} WHERE u.id = ?", SELECT_USER))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| user_from_sqlite_row(&r)))
}

async fn get_by_username_sqlite(pool: &SqlitePool, username: &str) -> Result<Option<User>> {
    let row = sqlx::query(&format!("{} WHERE u.username = ?", SELECT_USER))
        .bind(username)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| user_from_sqlite_row(&r)))
}

async fn get_by_email_sqlite(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let row = sqlx::query(&format!("{} WHERE u.email = ?", SELECT_USER))
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| user_from_sqlite_row(&r)))
}

async fn list_sqlite(pool: &SqlitePool, search: Option<&str>) -> Result<Vec<User>> {
    let rows = match search {
        Some(term) => {
            let pattern = format!("%{}%", term.to_lowercase());
            sqlx::query(&format!(
                "{} WHERE LOWER(u.username) LIKE ? OR LOWER(u.first_name) LIKE ? \
                 OR LOWER(u.last_name) LIKE ? ORDER BY u.username",
                SELECT_USER
            ))
            .bind(&pattern)
            .bind(&pattern)
            .bind(&pattern)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query(&format!("{} ORDER BY u.username", SELECT_USER))
                .fetch_all(pool)
                .await?
        }
    };
    Ok(rows.iter().map(user_from_sqlite_row).collect())
}

async fn update_sqlite(pool: &SqlitePool, user: &User) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE users SET username = ?, email = ?, password_hash = ?, role_id = ?, \
         first_name = ?, last_name = ?, about = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.role_id)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.about)
    .bind(Utc::now())
    .bind(user.id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

async fn delete_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

async fn count_with_role_sqlite(pool: &SqlitePool, role_name: &str) -> Result<i64> {
    let row = sqlx::query(
        "SELECT COUNT(*) AS total FROM users u JOIN roles r ON u.role_id = r.id WHERE r.name = ?",
    )
    .bind(role_name)
    .fetch_one(pool)
    .await?;
    Ok(row.get("total"))
}

// MySQL implementations

async fn create_mysql(pool: &MySqlPool, user: &NewUser) -> Result<User> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO users (username, email, password_hash, role_id, first_name, last_name, about, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.role_id)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.about)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    let id = result.last_insert_id() as i64;
    let created = get_by_id_mysql(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("User {} missing after insert", id))?;
    Ok(created)
}

async fn get_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<User>> {
    let row = sqlx::query(&format!("{} WHERE u.id = ?", SELECT_USER))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| user_from_mysql_row(&r)))
}

async fn get_by_username_mysql(pool: &MySqlPool, username: &str) -> Result<Option<User>> {
    let row = sqlx::query(&format!("{} WHERE u.username = ?", SELECT_USER))
        .bind(username)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| user_from_mysql_row(&r)))
}

async fn get_by_email_mysql(pool: &MySqlPool, email: &str) -> Result<Option<User>> {
    let row = sqlx::query(&format!("{} WHERE u.email = ?", SELECT_USER))
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| user_from_mysql_row(&r)))
}

async fn list_mysql(pool: &MySqlPool, search: Option<&str>) -> Result<Vec<User>> {
    let rows = match search {
        Some(term) => {
            let pattern = format!("%{}%", term.to_lowercase());
            sqlx::query(&format!(
                "{} WHERE LOWER(u.username) LIKE ? OR LOWER(u.first_name) LIKE ? \
                 OR LOWER(u.last_name) LIKE ? ORDER BY u.username",
                SELECT_USER
            ))
            .bind(&pattern)
            .bind(&pattern)
            .bind(&pattern)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query(&format!("{} ORDER BY u.username", SELECT_USER))
                .fetch_all(pool)
                .await?
        }
    };
    Ok(rows.iter().map(user_from_mysql_row).collect())
}

async fn update_mysql(pool: &MySqlPool, user: &User) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE users SET username = ?, email = ?, password_hash = ?, role_id = ?, \
         first_name = ?, last_name = ?, about = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.role_id)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.about)
    .bind(Utc::now())
    .bind(user.id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

async fn delete_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

async fn count_with_role_mysql(pool: &MySqlPool, role_name: &str) -> Result<i64> {
    let row = sqlx::query(
        "SELECT COUNT(*) AS total FROM users u JOIN roles r ON u.role_id = r.id WHERE r.name = ?",
    )
    .bind(role_name)
    .fetch_one(pool)
    .await?;
    Ok(row.get("total"))
}
