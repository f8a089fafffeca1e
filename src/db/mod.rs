//! Database layer
//!
//! Connection pooling, code-based migrations, and per-entity repositories
//! over SQLite or MySQL.

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{create_pool, create_test_pool, DatabasePool, DynDatabasePool};
