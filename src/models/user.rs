//! User model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered user.
///
/// Users own spots, make bookings and write reviews. The password hash is
/// never serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    /// Email address (unique)
    pub email: String,
    /// Username (unique)
    pub username: String,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new User with the given parameters.
    ///
    /// The password must already be hashed, see `services::password::hash_password()`.
    pub fn new(
        first_name: String,
        last_name: String,
        email: String,
        username: String,
        password_hash: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            first_name,
            last_name,
            email,
            username,
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for creating a new user (before password hashing)
#[derive(Debug, Clone, Default)]
pub struct CreateUserInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
    /// Plaintext password (will be hashed)
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_new() {
        let user = User::new(
            "Demo".to_string(),
            "Lition".to_string(),
            "demo@user.io".to_string(),
            "Demo-lition".to_string(),
            "hashed_password".to_string(),
        );

        assert_eq!(user.id, 0);
        assert_eq!(user.username, "Demo-lition");
        assert_eq!(user.email, "demo@user.io");
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User::new(
            "A".to_string(),
            "B".to_string(),
            "a@b.com".to_string(),
            "abcd".to_string(),
            "secret-hash".to_string(),
        );

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["firstName"], "A");
    }
}
