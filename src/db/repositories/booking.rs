//! Booking repository
//!
//! Plain storage for bookings. Overlap checks happen in `policy` against
//! the lists loaded here; nothing in this module decides availability.

use crate::db::repositories::spot::{fetch_spot_images, row_to_spot, SpotImageScope, SPOT_COLUMNS};
use crate::db::DynDatabasePool;
use crate::models::{Booking, BookingWithSpot, DateRange};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row};
use std::sync::Arc;

/// Booking repository trait
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Store a new booking
    async fn create(&self, booking: &Booking) -> Result<Booking>;

    /// Get booking by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Booking>>;

    /// Bookings of one spot, ordered by id
    async fn list_for_spot(&self, spot_id: i64) -> Result<Vec<Booking>>;

    /// Every booking, ordered by id
    async fn list_all(&self) -> Result<Vec<Booking>>;

    /// A user's bookings joined with their spots
    async fn list_for_user(&self, user_id: i64) -> Result<Vec<BookingWithSpot>>;

    /// Move a booking to `range` and return the stored row
    async fn update_dates(&self, id: i64, range: DateRange) -> Result<Booking>;

    /// Delete a booking
    async fn delete(&self, id: i64) -> Result<()>;
}

/// SQLx-based booking repository implementation
pub struct SqlxBookingRepository {
    pool: DynDatabasePool,
}

impl SqlxBookingRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn BookingRepository> {
        Arc::new(Self::new(pool))
    }

    async fn fetch_where(&self, clause: &str, id: Option<i64>) -> Result<Vec<Booking>> {
        let sql = format!(
            "SELECT id, spot_id, user_id, start_date, end_date, created_at, updated_at \
             FROM bookings {} ORDER BY id",
            clause
        );
        let mut query = sqlx::query(&sql);
        if let Some(id) = id {
            query = query.bind(id);
        }

        let rows = query
            .fetch_all(self.pool.sqlite())
            .await
            .context("Failed to load bookings")?;

        rows.iter().map(|row| row_to_booking(row, "")).collect()
    }
}

#[async_trait]
impl BookingRepository for SqlxBookingRepository {
    async fn create(&self, booking: &Booking) -> Result<Booking> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO bookings (spot_id, user_id, start_date, end_date, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(booking.spot_id)
        .bind(booking.user_id)
        .bind(booking.start_date)
        .bind(booking.end_date)
        .bind(now)
        .bind(now)
        .execute(self.pool.sqlite())
        .await
        .context("Failed to create booking")?;

        Ok(Booking {
            id: result.last_insert_rowid(),
            created_at: now,
            updated_at: now,
            ..booking.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Booking>> {
        Ok(self.fetch_where("WHERE id = ?", Some(id)).await?.pop())
    }

    async fn list_for_spot(&self, spot_id: i64) -> Result<Vec<Booking>> {
        self.fetch_where("WHERE spot_id = ?", Some(spot_id)).await
    }

    async fn list_all(&self) -> Result<Vec<Booking>> {
        self.fetch_where("", None).await
    }

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<BookingWithSpot>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {},
                   b.id AS b_id, b.spot_id AS b_spot_id, b.user_id AS b_user_id,
                   b.start_date AS b_start_date, b.end_date AS b_end_date,
                   b.created_at AS b_created_at, b.updated_at AS b_updated_at
            FROM bookings b
            JOIN spots s ON s.id = b.spot_id
            WHERE b.user_id = ?
            ORDER BY b.id
            "#,
            SPOT_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(self.pool.sqlite())
        .await
        .context("Failed to load user bookings")?;

        let images =
            fetch_spot_images(self.pool.sqlite(), SpotImageScope::BookedBy(user_id)).await?;

        rows.iter()
            .map(|row| -> Result<BookingWithSpot> {
                let spot = row_to_spot(row)?;
                Ok(BookingWithSpot {
                    booking: row_to_booking(row, "b_")?,
                    spot_images: images.get(&spot.id).cloned().unwrap_or_default(),
                    spot,
                })
            })
            .collect()
    }

    async fn update_dates(&self, id: i64, range: DateRange) -> Result<Booking> {
        sqlx::query("UPDATE bookings SET start_date = ?, end_date = ?, updated_at = ? WHERE id = ?")
            .bind(range.start())
            .bind(range.end())
            .bind(Utc::now())
            .bind(id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to update booking")?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Booking {} not found after update", id))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM bookings WHERE id = ?")
            .bind(id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to delete booking")?;

        Ok(())
    }
}

fn row_to_booking(row: &SqliteRow, prefix: &str) -> Result<Booking> {
    let col = |name: &str| format!("{}{}", prefix, name);
    Ok(Booking {
        id: row.try_get(col("id").as_str())?,
        spot_id: row.try_get(col("spot_id").as_str())?,
        user_id: row.try_get(col("user_id").as_str())?,
        start_date: row.try_get(col("start_date").as_str())?,
        end_date: row.try_get(col("end_date").as_str())?,
        created_at: row.try_get(col("created_at").as_str())?,
        updated_at: row.try_get(col("updated_at").as_str())?,
    })
}
