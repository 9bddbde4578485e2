//! Review repository
//!
//! Reviews, their images, and the joined shapes used by the review listings.

use crate::db::repositories::spot::{fetch_spot_images, row_to_spot, SpotImageScope, SPOT_COLUMNS};
use crate::db::DynDatabasePool;
use crate::models::{Review, ReviewImage, ReviewWithDetails, UserSummary};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use std::collections::HashMap;
use std::sync::Arc;

/// Review repository trait
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Store a new review
    async fn create(&self, review: &Review) -> Result<Review>;

    /// Get review by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Review>>;

    /// The review `user_id` left on `spot_id`, if any
    async fn get_by_user_and_spot(&self, user_id: i64, spot_id: i64) -> Result<Option<Review>>;

    /// Reviews of a spot with author and images
    async fn list_for_spot(&self, spot_id: i64) -> Result<Vec<ReviewWithDetails>>;

    /// Reviews written by a user with author, images and the reviewed spot
    async fn list_for_user(&self, user_id: i64) -> Result<Vec<ReviewWithDetails>>;

    /// Number of images attached to a review
    async fn count_images(&self, review_id: i64) -> Result<usize>;

    /// Attach an image to a review
    async fn add_image(&self, review_id: i64, url: &str) -> Result<ReviewImage>;
}

/// SQLx-based review repository implementation
pub struct SqlxReviewRepository {
    pool: DynDatabasePool,
}

impl SqlxReviewRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ReviewRepository> {
        Arc::new(Self::new(pool))
    }
}

const REVIEW_COLUMNS: &str = "r.id AS r_id, r.user_id AS r_user_id, r.spot_id AS r_spot_id, \
     r.review AS r_review, r.stars AS r_stars, r.created_at AS r_created_at, \
     r.updated_at AS r_updated_at, u.first_name AS u_first_name, u.last_name AS u_last_name";

#[async_trait]
impl ReviewRepository for SqlxReviewRepository {
    async fn create(&self, review: &Review) -> Result<Review> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO reviews (user_id, spot_id, review, stars, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(review.user_id)
        .bind(review.spot_id)
        .bind(&review.review)
        .bind(review.stars)
        .bind(now)
        .bind(now)
        .execute(self.pool.sqlite())
        .await
        .context("Failed to create review")?;

        Ok(Review {
            id: result.last_insert_rowid(),
            created_at: now,
            updated_at: now,
            ..review.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Review>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM reviews r JOIN users u ON u.id = r.user_id WHERE r.id = ?",
            REVIEW_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.pool.sqlite())
        .await
        .context("Failed to get review by ID")?;

        row.as_ref().map(row_to_review).transpose()
    }

    async fn get_by_user_and_spot(&self, user_id: i64, spot_id: i64) -> Result<Option<Review>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM reviews r JOIN users u ON u.id = r.user_id \
             WHERE r.user_id = ? AND r.spot_id = ?",
            REVIEW_COLUMNS
        ))
        .bind(user_id)
        .bind(spot_id)
        .fetch_optional(self.pool.sqlite())
        .await
        .context("Failed to look up existing review")?;

        row.as_ref().map(row_to_review).transpose()
    }

    async fn list_for_spot(&self, spot_id: i64) -> Result<Vec<ReviewWithDetails>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM reviews r JOIN users u ON u.id = r.user_id \
             WHERE r.spot_id = ? ORDER BY r.id",
            REVIEW_COLUMNS
        ))
        .bind(spot_id)
        .fetch_all(self.pool.sqlite())
        .await
        .context("Failed to list spot reviews")?;

        let mut images = fetch_review_images(
            self.pool.sqlite(),
            "SELECT id FROM reviews WHERE spot_id = ?",
            spot_id,
        )
        .await?;

        rows.iter()
            .map(|row| -> Result<ReviewWithDetails> {
                let review = row_to_review(row)?;
                Ok(ReviewWithDetails {
                    author: row_to_author(row)?,
                    images: images.remove(&review.id).unwrap_or_default(),
                    spot: None,
                    review,
                })
            })
            .collect()
    }

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<ReviewWithDetails>> {
        let rows = sqlx::query(&format!(
            "SELECT {}, {} FROM reviews r \
             JOIN users u ON u.id = r.user_id \
             JOIN spots s ON s.id = r.spot_id \
             WHERE r.user_id = ? ORDER BY r.id",
            REVIEW_COLUMNS, SPOT_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(self.pool.sqlite())
        .await
        .context("Failed to list user reviews")?;

        let pool = self.pool.sqlite();
        let mut images =
            fetch_review_images(pool, "SELECT id FROM reviews WHERE user_id = ?", user_id).await?;
        let spot_images = fetch_spot_images(pool, SpotImageScope::ReviewedBy(user_id)).await?;

        rows.iter()
            .map(|row| -> Result<ReviewWithDetails> {
                let review = row_to_review(row)?;
                let spot = row_to_spot(row)?;
                let spot_imgs = spot_images.get(&spot.id).cloned().unwrap_or_default();
                Ok(ReviewWithDetails {
                    author: row_to_author(row)?,
                    images: images.remove(&review.id).unwrap_or_default(),
                    spot: Some((spot, spot_imgs)),
                    review,
                })
            })
            .collect()
    }

    async fn count_images(&self, review_id: i64) -> Result<usize> {
        let count: i64 = sqlx::query("SELECT COUNT(*) AS count FROM review_images WHERE review_id = ?")
            .bind(review_id)
            .fetch_one(self.pool.sqlite())
            .await
            .context("Failed to count review images")?
            .try_get("count")?;

        Ok(count as usize)
    }

    async fn add_image(&self, review_id: i64, url: &str) -> Result<ReviewImage> {
        let result = sqlx::query(
            "INSERT INTO review_images (review_id, url, created_at) VALUES (?, ?, ?)",
        )
        .bind(review_id)
        .bind(url)
        .bind(Utc::now())
        .execute(self.pool.sqlite())
        .await
        .context("Failed to add review image")?;

        Ok(ReviewImage {
            id: result.last_insert_rowid(),
            url: url.to_string(),
        })
    }
}

/// Images of the reviews selected by `review_ids_sql`, a one-parameter
/// subquery yielding review ids
async fn fetch_review_images(
    pool: &SqlitePool,
    review_ids_sql: &str,
    param: i64,
) -> Result<HashMap<i64, Vec<ReviewImage>>> {
    let sql = format!(
        "SELECT id, review_id, url FROM review_images WHERE review_id IN ({}) ORDER BY id",
        review_ids_sql
    );

    let mut grouped: HashMap<i64, Vec<ReviewImage>> = HashMap::new();
    for row in sqlx::query(&sql)
        .bind(param)
        .fetch_all(pool)
        .await
        .context("Failed to load review images")?
    {
        let review_id: i64 = row.try_get("review_id")?;
        grouped.entry(review_id).or_default().push(ReviewImage {
            id: row.try_get("id")?,
            url: row.try_get("url")?,
        });
    }

    Ok(grouped)
}

fn row_to_review(row: &SqliteRow) -> Result<Review> {
    Ok(Review {
        id: row.try_get("r_id")?,
        user_id: row.try_get("r_user_id")?,
        spot_id: row.try_get("r_spot_id")?,
        review: row.try_get("r_review")?,
        stars: row.try_get("r_stars")?,
        created_at: row.try_get("r_created_at")?,
        updated_at: row.try_get("r_updated_at")?,
    })
}

fn row_to_author(row: &SqliteRow) -> Result<UserSummary> {
    Ok(UserSummary {
        id: row.try_get("r_user_id")?,
        first_name: row.try_get("u_first_name")?,
        last_name: row.try_get("u_last_name")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::fixtures;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> (DynDatabasePool, SqlxReviewRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxReviewRepository::new(pool.clone());
        (pool, repo)
    }

    #[tokio::test]
    async fn test_create_and_find_review() {
        let (pool, repo) = setup_test_repo().await;
        let owner = fixtures::seed_user(&pool, "owner").await;
        let guest = fixtures::seed_user(&pool, "guest").await;
        let spot = fixtures::seed_spot(&pool, owner, "Cabin").await;

        let created = repo
            .create(&Review::new(guest, spot, "Cozy".to_string(), 4))
            .await
            .unwrap();

        let by_id = repo.get_by_id(created.id).await.unwrap().unwrap();
        let by_pair = repo.get_by_user_and_spot(guest, spot).await.unwrap().unwrap();
        assert_eq!(by_id.review, "Cozy");
        assert_eq!(by_pair.id, created.id);
        assert!(repo.get_by_user_and_spot(owner, spot).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_one_review_per_user_per_spot() {
        let (pool, repo) = setup_test_repo().await;
        let owner = fixtures::seed_user(&pool, "owner").await;
        let guest = fixtures::seed_user(&pool, "guest").await;
        let spot = fixtures::seed_spot(&pool, owner, "Cabin").await;
        repo.create(&Review::new(guest, spot, "One".to_string(), 3))
            .await
            .unwrap();

        let again = repo.create(&Review::new(guest, spot, "Two".to_string(), 5)).await;

        assert!(again.is_err());
    }

    #[tokio::test]
    async fn test_images_counted_and_listed() {
        let (pool, repo) = setup_test_repo().await;
        let owner = fixtures::seed_user(&pool, "owner").await;
        let guest = fixtures::seed_user(&pool, "guest").await;
        let spot = fixtures::seed_spot(&pool, owner, "Cabin").await;
        let review = fixtures::seed_review(&pool, guest, spot, 5).await;

        repo.add_image(review, "one.jpg").await.unwrap();
        repo.add_image(review, "two.jpg").await.unwrap();

        assert_eq!(repo.count_images(review).await.unwrap(), 2);

        let listed = repo.list_for_spot(spot).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].images.len(), 2);
        assert_eq!(listed[0].author.id, guest);
        assert!(listed[0].spot.is_none());
    }

    #[tokio::test]
    async fn test_list_for_user_carries_spot() {
        let (pool, repo) = setup_test_repo().await;
        let owner = fixtures::seed_user(&pool, "owner").await;
        let guest = fixtures::seed_user(&pool, "guest").await;
        let spot = fixtures::seed_spot(&pool, owner, "Cabin").await;
        fixtures::seed_review(&pool, guest, spot, 5).await;

        let listed = repo.list_for_user(guest).await.unwrap();

        assert_eq!(listed.len(), 1);
        let (reviewed, images) = listed[0].spot.as_ref().unwrap();
        assert_eq!(reviewed.id, spot);
        assert!(images.is_empty());
        assert!(repo.list_for_user(owner).await.unwrap().is_empty());
    }
}
