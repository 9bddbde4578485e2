//! User repository
//!
//! Database operations for users.
//!
//! This module provides:
//! - `UserRepository` trait defining the interface for user data access
//! - `SqlxUserRepository` implementing the trait for SQLite

use crate::db::DynDatabasePool;
use crate::models::User;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user
    async fn create(&self, user: &User) -> Result<User>;

    /// Get user by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Get user by username
    async fn get_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Get user by email
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Get user whose username or email equals `credential`
    async fn get_by_credential(&self, credential: &str) -> Result<Option<User>>;
}

/// SQLx-based user repository implementation
pub struct SqlxUserRepository {
    pool: DynDatabasePool,
}

impl SqlxUserRepository {
    /// Create a new SQLx user repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        create_user(self.pool.sqlite(), user).await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        fetch_one_where(self.pool.sqlite(), "id = ?", Bind::Int(id)).await
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        fetch_one_where(self.pool.sqlite(), "username = ?", Bind::Text(username)).await
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        fetch_one_where(self.pool.sqlite(), "email = ?", Bind::Text(email)).await
    }

    async fn get_by_credential(&self, credential: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "{} WHERE username = ? OR email = ? LIMIT 1",
            SELECT_USER
        ))
        .bind(credential)
        .bind(credential)
        .fetch_optional(self.pool.sqlite())
        .await
        .context("Failed to get user by credential")?;

        row.as_ref().map(row_to_user).transpose()
    }
}

const SELECT_USER: &str = r#"
    SELECT id, first_name, last_name, email, username, password_hash, created_at, updated_at
    FROM users
"#;

enum Bind<'a> {
    Int(i64),
    Text(&'a str),
}

async fn create_user(pool: &SqlitePool, user: &User) -> Result<User> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO users (first_name, last_name, email, username, password_hash, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.email)
    .bind(&user.username)
    .bind(&user.password_hash)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create user")?;

    Ok(User {
        id: result.last_insert_rowid(),
        created_at: now,
        updated_at: now,
        ..user.clone()
    })
}

async fn fetch_one_where(pool: &SqlitePool, clause: &str, value: Bind<'_>) -> Result<Option<User>> {
    let sql = format!("{} WHERE {}", SELECT_USER, clause);
    let query = sqlx::query(&sql);
    let query = match value {
        Bind::Int(v) => query.bind(v),
        Bind::Text(v) => query.bind(v),
    };

    let row = query
        .fetch_optional(pool)
        .await
        .with_context(|| format!("Failed to get user where {}", clause))?;

    row.as_ref().map(row_to_user).transpose()
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        email: row.try_get("email")?,
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use crate::services::password::hash_password;

    async fn setup_test_repo() -> (DynDatabasePool, SqlxUserRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxUserRepository::new(pool.clone());
        (pool, repo)
    }

    fn create_test_user(username: &str, email: &str) -> User {
        User::new(
            "Test".to_string(),
            "User".to_string(),
            email.to_string(),
            username.to_string(),
            "hash".to_string(),
        )
    }

    #[tokio::test]
    async fn test_create_user() {
        let (_pool, repo) = setup_test_repo().await;
        let user = create_test_user("testuser", "test@example.com");

        let created = repo.create(&user).await.expect("Failed to create user");

        assert!(created.id > 0);
        assert_eq!(created.username, "testuser");
        assert_eq!(created.first_name, "Test");
    }

    #[tokio::test]
    async fn test_get_user_by_id_not_found() {
        let (_pool, repo) = setup_test_repo().await;

        let found = repo.get_by_id(999).await.expect("Failed to get user");

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_get_user_by_username_and_email() {
        let (_pool, repo) = setup_test_repo().await;
        let created = repo
            .create(&create_test_user("findme", "findme@example.com"))
            .await
            .expect("Failed to create user");

        let by_name = repo.get_by_username("findme").await.unwrap().unwrap();
        let by_email = repo.get_by_email("findme@example.com").await.unwrap().unwrap();

        assert_eq!(by_name.id, created.id);
        assert_eq!(by_email.id, created.id);
        assert!(repo.get_by_username("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_by_credential_matches_either_field() {
        let (_pool, repo) = setup_test_repo().await;
        let created = repo
            .create(&create_test_user("demo", "demo@user.io"))
            .await
            .expect("Failed to create user");

        let by_name = repo.get_by_credential("demo").await.unwrap().unwrap();
        let by_email = repo.get_by_credential("demo@user.io").await.unwrap().unwrap();

        assert_eq!(by_name.id, created.id);
        assert_eq!(by_email.id, created.id);
        assert!(repo.get_by_credential("other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unique_constraints() {
        let (_pool, repo) = setup_test_repo().await;
        repo.create(&create_test_user("duplicate", "one@example.com"))
            .await
            .expect("Failed to create first user");

        let same_name = repo.create(&create_test_user("duplicate", "two@example.com")).await;
        let same_email = repo.create(&create_test_user("other", "one@example.com")).await;

        assert!(same_name.is_err(), "Should fail due to duplicate username");
        assert!(same_email.is_err(), "Should fail due to duplicate email");
    }

    #[tokio::test]
    async fn test_password_hash_stored_correctly() {
        let (_pool, repo) = setup_test_repo().await;
        let hash = hash_password("my_secure_password").expect("Failed to hash password");
        let mut user = create_test_user("hashtest", "hashtest@example.com");
        user.password_hash = hash.clone();

        let created = repo.create(&user).await.expect("Failed to create user");
        let found = repo.get_by_id(created.id).await.unwrap().unwrap();

        assert_eq!(found.password_hash, hash);
        assert!(found.password_hash.starts_with("$argon2id$"));
    }
}
