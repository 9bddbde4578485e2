//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles the queries for one aggregate.

pub mod booking;
pub mod review;
pub mod session;
pub mod spot;
pub mod user;

pub use booking::{BookingRepository, SqlxBookingRepository};
pub use review::{ReviewRepository, SqlxReviewRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use spot::{SpotRepository, SqlxSpotRepository};
pub use user::{SqlxUserRepository, UserRepository};

/// Row seeding shared by the repository and service tests
#[cfg(test)]
pub(crate) mod fixtures {
    use crate::db::DynDatabasePool;
    use crate::models::{CreateSpotInput, Spot};
    use chrono::{NaiveDate, Utc};

    /// Insert a user named `username` and return its id
    pub async fn seed_user(pool: &DynDatabasePool, username: &str) -> i64 {
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO users (first_name, last_name, email, username, password_hash, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind("Test")
        .bind("User")
        .bind(format!("{}@example.com", username))
        .bind(username)
        .bind("hash")
        .bind(now)
        .bind(now)
        .execute(pool.sqlite())
        .await
        .expect("Failed to seed user")
        .last_insert_rowid()
    }

    /// An unsaved spot owned by `owner_id`
    pub fn spot(owner_id: i64, name: &str) -> Spot {
        Spot::new(
            owner_id,
            CreateSpotInput {
                address: "123 Disney Lane".to_string(),
                city: "San Francisco".to_string(),
                state: "California".to_string(),
                country: "United States of America".to_string(),
                lat: 39.8,
                lng: -122.4,
                name: name.to_string(),
                description: "Place where web developers are created".to_string(),
                price: 123.0,
            },
        )
    }

    pub async fn seed_spot(pool: &DynDatabasePool, owner_id: i64, name: &str) -> i64 {
        let spot = spot(owner_id, name);
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO spots (owner_id, address, city, state, country, lat, lng, name,
                               description, price, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(spot.owner_id)
        .bind(&spot.address)
        .bind(&spot.city)
        .bind(&spot.state)
        .bind(&spot.country)
        .bind(spot.lat)
        .bind(spot.lng)
        .bind(&spot.name)
        .bind(&spot.description)
        .bind(spot.price)
        .bind(now)
        .bind(now)
        .execute(pool.sqlite())
        .await
        .expect("Failed to seed spot")
        .last_insert_rowid()
    }

    pub async fn seed_review(pool: &DynDatabasePool, user_id: i64, spot_id: i64, stars: i64) -> i64 {
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO reviews (user_id, spot_id, review, stars, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(spot_id)
        .bind("Great stay")
        .bind(stars)
        .bind(now)
        .bind(now)
        .execute(pool.sqlite())
        .await
        .expect("Failed to seed review")
        .last_insert_rowid()
    }

    pub async fn seed_booking(
        pool: &DynDatabasePool,
        spot_id: i64,
        user_id: i64,
        start: &str,
        end: &str,
    ) -> i64 {
        let now = Utc::now();
        let start = NaiveDate::parse_from_str(start, "%Y-%m-%d").expect("bad start date");
        let end = NaiveDate::parse_from_str(end, "%Y-%m-%d").expect("bad end date");
        sqlx::query(
            r#"
            INSERT INTO bookings (spot_id, user_id, start_date, end_date, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(spot_id)
        .bind(user_id)
        .bind(start)
        .bind(end)
        .bind(now)
        .bind(now)
        .execute(pool.sqlite())
        .await
        .expect("Failed to seed booking")
        .last_insert_rowid()
    }
}
