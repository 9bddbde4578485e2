//! User service
//!
//! Signup validation and uniqueness checks, credential login, and the
//! session lifecycle behind the `token` cookie.

use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::{CreateUserInput, Session, User};
use crate::services::error::{FieldErrors, ServiceError};
use crate::services::password::{hash_password, verify_password};
use anyhow::Context;
use chrono::{Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::sync::Arc;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// Whether `value` looks like an email address
pub fn is_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

/// Signup request body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupInput {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl SignupInput {
    /// Check field rules and return the cleaned input
    pub fn validate(self) -> Result<CreateUserInput, ServiceError> {
        let mut errors = FieldErrors::new();
        let email = self.email.unwrap_or_default();
        let username = self.username.unwrap_or_default();
        let password = self.password.unwrap_or_default();

        if !is_email(&email) {
            errors.insert("email".into(), "The provided email is invalid.".into());
        }
        if username.chars().count() < 4 {
            errors.insert(
                "username".into(),
                "Please provide a username with at least 4 characters.".into(),
            );
        } else if is_email(&username) {
            errors.insert("username".into(), "Username cannot be an email.".into());
        }
        if password.chars().count() < 6 {
            errors.insert("password".into(), "Password must be 6 characters or more.".into());
        }

        if !errors.is_empty() {
            return Err(ServiceError::Validation(errors));
        }

        Ok(CreateUserInput {
            first_name: self.first_name,
            last_name: self.last_name,
            email,
            username,
            password,
        })
    }
}

/// Login request body. `credential` is a username or an email.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginInput {
    #[serde(default)]
    pub credential: String,
    #[serde(default)]
    pub password: String,
}

/// User service for accounts and sessions
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    session_expiration_days: i64,
}

impl UserService {
    /// Create a user service with a custom session lifetime
    pub fn with_session_expiration(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        session_expiration_days: i64,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            session_expiration_days,
        }
    }

    /// Register a user and open a session for them.
    ///
    /// Email and username uniqueness are both checked before reporting, so a
    /// request that collides on both gets both fields back.
    pub async fn signup(&self, input: SignupInput) -> Result<(User, Session), ServiceError> {
        let input = input.validate()?;

        let email_taken = self
            .user_repo
            .get_by_email(&input.email)
            .await
            .context("Failed to check email")?
            .is_some();
        let username_taken = self
            .user_repo
            .get_by_username(&input.username)
            .await
            .context("Failed to check username")?
            .is_some();

        if let Some(err) = duplicate_error(email_taken, username_taken) {
            tracing::info!("Signup rejected for duplicate email or username");
            return Err(err);
        }

        let password_hash = hash_password(&input.password).context("Failed to hash password")?;
        let user = User::new(
            input.first_name,
            input.last_name,
            input.email,
            input.username,
            password_hash,
        );
        let user = self
            .user_repo
            .create(&user)
            .await
            .context("Failed to create user")?;

        tracing::info!(user_id = user.id, "User signed up");
        let session = self.open_session(user.id).await?;
        Ok((user, session))
    }

    /// Log in by username or email
    pub async fn login(&self, input: LoginInput) -> Result<(User, Session), ServiceError> {
        let mut errors = FieldErrors::new();
        if input.credential.trim().is_empty() {
            errors.insert("credential".into(), "Email or username is required".into());
        }
        if input.password.is_empty() {
            errors.insert("password".into(), "Password is required".into());
        }
        if !errors.is_empty() {
            return Err(ServiceError::Validation(errors));
        }

        let user = self
            .user_repo
            .get_by_credential(&input.credential)
            .await
            .context("Failed to look up credential")?;

        let Some(user) = user else {
            return Err(invalid_credentials());
        };
        let valid = verify_password(&input.password, &user.password_hash)
            .context("Failed to verify password")?;
        if !valid {
            tracing::info!(user_id = user.id, "Login failed: wrong password");
            return Err(invalid_credentials());
        }

        let session = self.open_session(user.id).await?;
        Ok((user, session))
    }

    /// Invalidate a session. Unknown tokens are ignored.
    pub async fn logout(&self, token: &str) -> Result<(), ServiceError> {
        self.session_repo
            .delete(token)
            .await
            .context("Failed to delete session")?;
        Ok(())
    }

    /// Resolve a session token to its user, or `None` if the token is
    /// unknown or expired. Expired sessions are removed on sight.
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>, ServiceError> {
        let session = match self
            .session_repo
            .get_by_id(token)
            .await
            .context("Failed to get session")?
        {
            Some(s) => s,
            None => return Ok(None),
        };

        if session.is_expired() {
            self.session_repo
                .delete(token)
                .await
                .context("Failed to delete expired session")?;
            return Ok(None);
        }

        let user = self
            .user_repo
            .get_by_id(session.user_id)
            .await
            .context("Failed to get user")?;
        Ok(user)
    }

    /// Drop every expired session, returning how many were removed
    pub async fn cleanup_expired_sessions(&self) -> Result<u64, ServiceError> {
        let removed = self
            .session_repo
            .delete_expired(Utc::now())
            .await
            .context("Failed to delete expired sessions")?;
        Ok(removed)
    }

    async fn open_session(&self, user_id: i64) -> Result<Session, ServiceError> {
        let lifetime = Duration::try_days(self.session_expiration_days)
            .context("Session lifetime out of range")?;
        let session = Session::open(user_id, lifetime);
        let session = self
            .session_repo
            .create(&session)
            .await
            .context("Failed to create session")?;
        Ok(session)
    }
}

fn invalid_credentials() -> ServiceError {
    ServiceError::Unauthorized("Invalid credentials".to_string())
}

fn duplicate_error(email_taken: bool, username_taken: bool) -> Option<ServiceError> {
    let mut errors = FieldErrors::new();
    if email_taken {
        errors.insert("email".into(), "Email must be unique.".into());
    }
    if username_taken {
        errors.insert("username".into(), "Username must be unique.".into());
    }

    let message = match (email_taken, username_taken) {
        (true, true) => "Email/user already exists",
        (true, false) => "Email already exists",
        (false, true) => "User already exists",
        (false, false) => return None,
    };
    Some(ServiceError::Duplicate(message.to_string(), errors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxSessionRepository, SqlxUserRepository};
    use crate::db::{create_test_pool, migrations, DynDatabasePool};

    async fn setup_test_service() -> (DynDatabasePool, UserService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let session_repo = SqlxSessionRepository::boxed(pool.clone());
        (pool, UserService::with_session_expiration(user_repo, session_repo, 7))
    }

    fn signup(email: &str, username: &str) -> SignupInput {
        SignupInput {
            first_name: "Demo".into(),
            last_name: "Lition".into(),
            email: Some(email.into()),
            username: Some(username.into()),
            password: Some("password".into()),
        }
    }

    #[test]
    fn test_signup_validation_messages() {
        let err = SignupInput {
            email: Some("not-an-email".into()),
            username: Some("abc".into()),
            password: Some("12345".into()),
            ..Default::default()
        }
        .validate()
        .unwrap_err();

        let errors = err.field_errors().unwrap();
        assert_eq!(errors["email"], "The provided email is invalid.");
        assert_eq!(errors["username"], "Please provide a username with at least 4 characters.");
        assert_eq!(errors["password"], "Password must be 6 characters or more.");
    }

    #[test]
    fn test_username_cannot_be_email() {
        let err = signup("a@b.io", "me@b.io").validate().unwrap_err();
        assert_eq!(err.field_errors().unwrap()["username"], "Username cannot be an email.");
    }

    #[tokio::test]
    async fn test_signup_opens_session() {
        let (_pool, service) = setup_test_service().await;

        let (user, session) = service.signup(signup("demo@user.io", "Demo-lition")).await.unwrap();

        assert!(user.id > 0);
        assert_eq!(session.user_id, user.id);
        let resolved = service.validate_session(&session.id).await.unwrap().unwrap();
        assert_eq!(resolved.username, "Demo-lition");
    }

    #[tokio::test]
    async fn test_out_of_range_session_lifetime_is_an_error() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let service = UserService::with_session_expiration(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxSessionRepository::boxed(pool.clone()),
            200_000_000_000_000,
        );

        let err = service
            .signup(signup("demo@user.io", "Demo-lition"))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Internal(_)));
    }

    #[tokio::test]
    async fn test_signup_duplicate_reports_both_fields() {
        let (_pool, service) = setup_test_service().await;
        service.signup(signup("demo@user.io", "Demo-lition")).await.unwrap();

        let err = service
            .signup(signup("demo@user.io", "Demo-lition"))
            .await
            .unwrap_err();

        match err {
            ServiceError::Duplicate(message, errors) => {
                assert_eq!(message, "Email/user already exists");
                assert_eq!(errors["email"], "Email must be unique.");
                assert_eq!(errors["username"], "Username must be unique.");
            }
            other => panic!("expected duplicate, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_signup_duplicate_single_field() {
        let (_pool, service) = setup_test_service().await;
        service.signup(signup("demo@user.io", "Demo-lition")).await.unwrap();

        let email_err = service.signup(signup("demo@user.io", "fresh-name")).await.unwrap_err();
        let name_err = service.signup(signup("fresh@user.io", "Demo-lition")).await.unwrap_err();

        assert!(matches!(&email_err, ServiceError::Duplicate(m, e) if m == "Email already exists" && !e.contains_key("username")));
        assert!(matches!(&name_err, ServiceError::Duplicate(m, e) if m == "User already exists" && !e.contains_key("email")));
    }

    #[tokio::test]
    async fn test_login_by_username_or_email() {
        let (_pool, service) = setup_test_service().await;
        service.signup(signup("demo@user.io", "Demo-lition")).await.unwrap();

        for credential in ["Demo-lition", "demo@user.io"] {
            let (user, _) = service
                .login(LoginInput {
                    credential: credential.into(),
                    password: "password".into(),
                })
                .await
                .unwrap();
            assert_eq!(user.email, "demo@user.io");
        }
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials() {
        let (_pool, service) = setup_test_service().await;
        service.signup(signup("demo@user.io", "Demo-lition")).await.unwrap();

        let wrong_password = service
            .login(LoginInput {
                credential: "Demo-lition".into(),
                password: "nope-nope".into(),
            })
            .await
            .unwrap_err();
        let unknown = service
            .login(LoginInput {
                credential: "ghost".into(),
                password: "password".into(),
            })
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, ServiceError::Unauthorized(_)));
        assert!(matches!(unknown, ServiceError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_logout_invalidates_session() {
        let (_pool, service) = setup_test_service().await;
        let (_, session) = service.signup(signup("demo@user.io", "Demo-lition")).await.unwrap();

        service.logout(&session.id).await.unwrap();

        assert!(service.validate_session(&session.id).await.unwrap().is_none());
        service.logout("unknown-token").await.unwrap();
    }

    #[tokio::test]
    async fn test_expired_session_is_rejected_and_removed() {
        let (pool, service) = setup_test_service().await;
        let (user, _) = service.signup(signup("demo@user.io", "Demo-lition")).await.unwrap();
        let stale = Session::open(user.id, Duration::days(-1));
        SqlxSessionRepository::new(pool.clone()).create(&stale).await.unwrap();

        assert!(service.validate_session(&stale.id).await.unwrap().is_none());
        assert_eq!(service.cleanup_expired_sessions().await.unwrap(), 0);
    }
}
