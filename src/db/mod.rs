//! Database layer
//!
//! SQLite connection pool, embedded migrations and the repositories that
//! load and store marketplace entities.
//!
//! # Usage
//!
//! ```ignore
//! use staybnb::config::DatabaseConfig;
//! use staybnb::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! pool.ping().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{create_pool, create_test_pool, DatabasePool, DynDatabasePool, SqliteDatabase};
