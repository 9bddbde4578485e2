//! Spot repository
//!
//! Spots, their images, and the aggregates (average rating, review count)
//! that list and detail views need.

use crate::db::DynDatabasePool;
use crate::models::{Spot, SpotDetails, SpotImage, SpotSummary, UserSummary};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use std::collections::HashMap;
use std::sync::Arc;

/// Spot repository trait
#[async_trait]
pub trait SpotRepository: Send + Sync {
    /// Create a new spot
    async fn create(&self, spot: &Spot) -> Result<Spot>;

    /// Get spot by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Spot>>;

    /// Every spot with its images and average rating, oldest first
    async fn list_summaries(&self) -> Result<Vec<SpotSummary>>;

    /// A spot with its owner, images and review aggregates
    async fn get_details(&self, id: i64) -> Result<Option<SpotDetails>>;

    /// Images of one spot, in insertion order
    async fn images_of(&self, spot_id: i64) -> Result<Vec<SpotImage>>;

    /// Attach an image to a spot
    async fn add_image(&self, spot_id: i64, url: &str, preview: bool) -> Result<SpotImage>;
}

/// SQLx-based spot repository implementation
pub struct SqlxSpotRepository {
    pool: DynDatabasePool,
}

impl SqlxSpotRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SpotRepository> {
        Arc::new(Self::new(pool))
    }
}

pub(crate) const SPOT_COLUMNS: &str = "s.id, s.owner_id, s.address, s.city, s.state, s.country, \
     s.lat, s.lng, s.name, s.description, s.price, s.created_at, s.updated_at";

#[async_trait]
impl SpotRepository for SqlxSpotRepository {
    async fn create(&self, spot: &Spot) -> Result<Spot> {
        let now = Utc::now();

        let result = sqlx::query(
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
        .execute(self.pool.sqlite())
        .await
        .context("Failed to create spot")?;

        Ok(Spot {
            id: result.last_insert_rowid(),
            created_at: now,
            updated_at: now,
            ..spot.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Spot>> {
        let row = sqlx::query(&format!("SELECT {} FROM spots s WHERE s.id = ?", SPOT_COLUMNS))
            .bind(id)
            .fetch_optional(self.pool.sqlite())
            .await
            .context("Failed to get spot by ID")?;

        row.as_ref().map(row_to_spot).transpose()
    }

    async fn list_summaries(&self) -> Result<Vec<SpotSummary>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {},
                   (SELECT AVG(r.stars) FROM reviews r WHERE r.spot_id = s.id) AS avg_rating
            FROM spots s
            ORDER BY s.id
            "#,
            SPOT_COLUMNS
        ))
        .fetch_all(self.pool.sqlite())
        .await
        .context("Failed to list spots")?;

        let mut images = fetch_spot_images(self.pool.sqlite(), SpotImageScope::All).await?;

        rows.iter()
            .map(|row| -> Result<SpotSummary> {
                let spot = row_to_spot(row)?;
                Ok(SpotSummary {
                    avg_rating: row.try_get("avg_rating")?,
                    images: images.remove(&spot.id).unwrap_or_default(),
                    spot,
                })
            })
            .collect()
    }

    async fn get_details(&self, id: i64) -> Result<Option<SpotDetails>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {},
                   u.first_name AS owner_first_name,
                   u.last_name AS owner_last_name,
                   (SELECT COUNT(*) FROM reviews r WHERE r.spot_id = s.id) AS num_reviews,
                   (SELECT AVG(r.stars) FROM reviews r WHERE r.spot_id = s.id) AS avg_star_rating
            FROM spots s
            JOIN users u ON u.id = s.owner_id
            WHERE s.id = ?
            "#,
            SPOT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.pool.sqlite())
        .await
        .context("Failed to get spot details")?;

        let Some(row) = row else {
            return Ok(None);
        };

        let spot = row_to_spot(&row)?;
        let images = self.images_of(spot.id).await?;

        Ok(Some(SpotDetails {
            owner: UserSummary {
                id: spot.owner_id,
                first_name: row.try_get("owner_first_name")?,
                last_name: row.try_get("owner_last_name")?,
            },
            images,
            num_reviews: row.try_get("num_reviews")?,
            avg_star_rating: row.try_get("avg_star_rating")?,
            spot,
        }))
    }

    async fn images_of(&self, spot_id: i64) -> Result<Vec<SpotImage>> {
        let mut grouped = fetch_spot_images(self.pool.sqlite(), SpotImageScope::Spot(spot_id)).await?;
        Ok(grouped.remove(&spot_id).unwrap_or_default())
    }

    async fn add_image(&self, spot_id: i64, url: &str, preview: bool) -> Result<SpotImage> {
        let result = sqlx::query(
            "INSERT INTO spot_images (spot_id, url, preview, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(spot_id)
        .bind(url)
        .bind(preview)
        .bind(Utc::now())
        .execute(self.pool.sqlite())
        .await
        .context("Failed to add spot image")?;

        Ok(SpotImage {
            id: result.last_insert_rowid(),
            spot_id,
            url: url.to_string(),
            preview,
        })
    }
}

/// Which spots a batch image load covers.
///
/// Each scope is a predicate evaluated by SQLite, so the query carries at
/// most one bound parameter however many spots match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SpotImageScope {
    All,
    Spot(i64),
    /// Spots the user holds bookings for
    BookedBy(i64),
    /// Spots the user has reviewed
    ReviewedBy(i64),
}

impl SpotImageScope {
    fn predicate(self) -> (&'static str, Option<i64>) {
        match self {
            Self::All => ("", None),
            Self::Spot(id) => ("WHERE spot_id = ?", Some(id)),
            Self::BookedBy(user_id) => (
                "WHERE spot_id IN (SELECT spot_id FROM bookings WHERE user_id = ?)",
                Some(user_id),
            ),
            Self::ReviewedBy(user_id) => (
                "WHERE spot_id IN (SELECT spot_id FROM reviews WHERE user_id = ?)",
                Some(user_id),
            ),
        }
    }
}

/// Load the images of every spot in `scope`, grouped by spot
pub(crate) async fn fetch_spot_images(
    pool: &SqlitePool,
    scope: SpotImageScope,
) -> Result<HashMap<i64, Vec<SpotImage>>> {
    let (predicate, param) = scope.predicate();
    let sql = format!(
        "SELECT id, spot_id, url, preview FROM spot_images {} ORDER BY id",
        predicate
    );
    let mut query = sqlx::query(&sql);
    if let Some(param) = param {
        query = query.bind(param);
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to load spot images")?;

    let mut grouped: HashMap<i64, Vec<SpotImage>> = HashMap::new();
    for row in rows {
        let image = SpotImage {
            id: row.try_get("id")?,
            spot_id: row.try_get("spot_id")?,
            url: row.try_get("url")?,
            preview: row.try_get("preview")?,
        };
        grouped.entry(image.spot_id).or_default().push(image);
    }

    Ok(grouped)
}

/// Map a row selected with [`SPOT_COLUMNS`]
pub(crate) fn row_to_spot(row: &SqliteRow) -> Result<Spot> {
    Ok(Spot {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        address: row.try_get("address")?,
        city: row.try_get("city")?,
        state: row.try_get("state")?,
        country: row.try_get("country")?,
        lat: row.try_get("lat")?,
        lng: row.try_get("lng")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        price: row.try_get("price")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
