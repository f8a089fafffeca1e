//! Role repository

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Role;

/// Role repository trait
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Create a new (non-builtin) role
    async fn create(&self, name: &str) -> Result<Role>;

    /// Get a role by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Role>>;

    /// Get a role by exact name
    async fn get_by_name(&self, name: &str) -> Result<Option<Role>>;

    /// List all roles ordered by name
    async fn list(&self) -> Result<Vec<Role>>;

    /// Case-insensitive substring search over role names
    async fn search(&self, name: &str) -> Result<Vec<Role>>;

    /// Rename a role; returns false if the role doesn't exist
    async fn rename(&self, id: i64, name: &str) -> Result<bool>;

    /// Delete a role; returns false if the role doesn't exist
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// sqlx-backed role repository
pub struct SqlxRoleRepository {
    pool: DynDatabasePool,
}

impl SqlxRoleRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleRepository for SqlxRoleRepository {
    async fn create(&self, name: &str) -> Result<Role> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.pool.as_sqlite().unwrap(), name).await,
            DatabaseDriver::Mysql => create_mysql(self.pool.as_mysql().unwrap(), name).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Role>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Role>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_name_sqlite(self.pool.as_sqlite().unwrap(), name).await,
            DatabaseDriver::Mysql => get_by_name_mysql(self.pool.as_mysql().unwrap(), name).await,
        }
    }

    async fn list(&self) -> Result<Vec<Role>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Mysql => list_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }

    async fn search(&self, name: &str) -> Result<Vec<Role>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => search_sqlite(self.pool.as_sqlite().unwrap(), name).await,
            DatabaseDriver::Mysql => search_mysql(self.pool.as_mysql().unwrap(), name).await,
        }
    }

    async fn rename(&self, id: i64, name: &str) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => rename_sqlite(self.pool.as_sqlite().unwrap(), id, name).await,
            DatabaseDriver::Mysql => rename_mysql(self.pool.as_mysql().unwrap(), id, name).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => delete_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }
}

fn role_from_sqlite_row(row: &sqlx::sqlite::SqliteRow) -> Role {
    Role {
        id: row.get("id"),
        name: row.get("name"),
        is_builtin: row.get("is_builtin"),
        created_at: row.get("created_at"),
    }
}

fn role_from_mysql_row(row: &sqlx::mysql::MySqlRow) -> Role {
    Role {
        id: row.get("id"),
        name: row.get("name"),
        is_builtin: row.get("is_builtin"),
        created_at: row.get("created_at"),
    }
}

// SQLite implementations

async fn create_sqlite(pool: &SqlitePool, name: &str) -> Result<Role> {
    let now = Utc::now();
    let result = sqlx::query("INSERT INTO roles (name, is_builtin, created_at) VALUES (?, 0, ?)")
        .bind(name)
        .bind(now)
        .execute(pool)
        .await?;

    Ok(Role {
        id: result.last_insert_rowid(),
        name: name.to_string(),
        is_builtin: false,
        created_at: now,
    })
}

async fn get_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Role>> {
    let row = sqlx::query("SELECT id, name, is_builtin, created_at FROM roles WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| role_from_sqlite_row(&r)))
}

async fn get_by_name_sqlite(pool: &SqlitePool, name: &str) -> Result<Option<Role>> {
    let row = sqlx::query("SELECT id, name, is_builtin, created_at FROM roles WHERE name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| role_from_sqlite_row(&r)))
}

async fn list_sqlite(pool: &SqlitePool) -> Result<Vec<Role>> {
    let rows = sqlx::query("SELECT id, name, is_builtin, created_at FROM roles ORDER BY name")
        .fetch_all(pool)
        .await?;
    Ok(rows.iter().map(role_from_sqlite_row).collect())
}

async fn search_sqlite(pool: &SqlitePool, name: &str) -> Result<Vec<Role>> {
    let pattern = format!("%{}%", name.to_lowercase());
    let rows = sqlx::query(
        "SELECT id, name, is_builtin, created_at FROM roles WHERE LOWER(name) LIKE ? ORDER BY name",
    )
    .bind(pattern)
    .fetch_all(pool)
    .await?;
    Ok(rows.iter().map(role_from_sqlite_row).collect())
}

async fn rename_sqlite(pool: &SqlitePool, id: i64, name: &str) -> Result<bool> {
    let result = sqlx::query("UPDATE roles SET name = ? WHERE id = ?")
        .bind(name)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

async fn delete_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM roles WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

// MySQL implementations

async fn create_mysql(pool: &MySqlPool, name: &str) -> Result<Role> {
    let now = Utc::now();
    let result = sqlx::query("INSERT INTO roles (name, is_builtin, created_at) VALUES (?, 0, ?)")
        .bind(name)
        .bind(now)
        .execute(pool)
        .await?;

    Ok(Role {
        id: result.last_insert_id() as i64,
        name: name.to_string(),
        is_builtin: false,
        created_at: now,
    })
}

async fn get_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Role>> {
    let row = sqlx::query("SELECT id, name, is_builtin, created_at FROM roles WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| role_from_mysql_row(&r)))
}

async fn get_by_name_mysql(pool: &MySqlPool, name: &str) -> Result<Option<Role>> {
    let row = sqlx::query("SELECT id, name, is_builtin, created_at FROM roles WHERE name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| role_from_mysql_row(&r)))
}

async fn list_mysql(pool: &MySqlPool) -> Result<Vec<Role>> {
    let rows = sqlx::query("SELECT id, name, is_builtin, created_at FROM roles ORDER BY name")
        .fetch_all(pool)
        .await?;
    Ok(rows.iter().map(role_from_mysql_row).collect())
}

async fn search_mysql(pool: &MySqlPool, name: &str) -> Result<Vec<Role>> {
    let pattern = format!("%{}%", name.to_lowercase());
    let rows = sqlx::query(
        "SELECT id, name, is_builtin, created_at FROM roles WHERE LOWER(name) LIKE ? ORDER BY name",
    )
    .bind(pattern)
    .fetch_all(pool)
    .await?;
    Ok(rows.iter().map(role_from_mysql_row).collect())
}

async fn rename_mysql(pool: &MySqlPool, id: i64, name: &str) -> Result<bool> {
    let result = sqlx::query("UPDATE roles SET name = ? WHERE id = ?")
        .bind(name)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

async fn delete_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM roles WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> SqlxRoleRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxRoleRepository::new(pool)
    }

    #[tokio::test]
    async fn test_builtin_roles_are_seeded() {
        let repo = setup().await;

        let roles = repo.list().await.expect("Failed to list roles");
        assert_eq!(roles.len(), 3);
        assert!(roles.iter().all(|r| r.is_builtin));

        let admin = repo
            .get_by_name("administrator")
            .await
            .expect("Query failed")
            .expect("administrator role missing");
        assert!(admin.is_builtin);
    }

    #[tokio::test]
    async fn test_create_and_get_role() {
        let repo = setup().await;

        let created = repo.create("editor").await.expect("Failed to create role");
        assert!(!created.is_builtin);

        let fetched = repo
            .get_by_id(created.id)
            .await
            .expect("Query failed")
            .expect("Role not found");
        assert_eq!(fetched.name, "editor");

        let by_name = repo
            .get_by_name("editor")
            .await
            .expect("Query failed")
            .expect("Role not found");
        assert_eq!(by_name.id, created.id);
    }

    #[tokio::test]
    async fn test_duplicate_role_name_fails() {
        let repo = setup().await;

        repo.create("editor").await.expect("First create failed");
        let result = repo.create("editor").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let repo = setup().await;
        repo.create("Content-Editor").await.expect("Create failed");

        let hits = repo.search("editor").await.expect("Search failed");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Content-Editor");

        let misses = repo.search("nonexistent").await.expect("Search failed");
        assert!(misses.is_empty());
    }

    #[tokio::test]
    async fn test_rename_and_delete() {
        let repo = setup().await;
        let role = repo.create("editor").await.expect("Create failed");

        assert!(repo.rename(role.id, "reviewer").await.expect("Rename failed"));
        let renamed = repo
            .get_by_id(role.id)
            .await
            .expect("Query failed")
            .expect("Role missing");
        assert_eq!(renamed.name, "reviewer");

        assert!(repo.delete(role.id).await.expect("Delete failed"));
        assert!(repo.get_by_id(role.id).await.expect("Query failed").is_none());
    }

    #[tokio::test]
    async fn test_rename_missing_role_returns_false() {
        let repo = setup().await;
        assert!(!repo.rename(9999, "ghost").await.expect("Rename failed"));
        assert!(!repo.delete(9999).await.expect("Delete failed"));
    }
}
