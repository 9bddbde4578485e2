//! Review service

use crate::db::repositories::{ReviewRepository, SpotRepository};
use crate::models::{Review, ReviewImage, ReviewWithDetails};
use crate::policy::{self, RequestContext};
use crate::services::error::{FieldErrors, ServiceError};
use crate::services::spot::spot_not_found;
use anyhow::Context;
use serde::Deserialize;
use std::sync::Arc;

/// Review creation request body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewInput {
    pub review: Option<String>,
    pub stars: Option<i64>,
}

impl ReviewInput {
    fn validate(self) -> Result<(String, i64), ServiceError> {
        let mut errors = FieldErrors::new();
        let text = self.review.filter(|r| !r.trim().is_empty());
        if text.is_none() {
            errors.insert("review".into(), "Review text is required".into());
        }
        let stars = self.stars.filter(|s| (1..=5).contains(s));
        if stars.is_none() {
            errors.insert("stars".into(), "Stars must be an integer from 1 to 5".into());
        }

        match (text, stars) {
            (Some(text), Some(stars)) => Ok((text, stars)),
            _ => Err(ServiceError::Validation(errors)),
        }
    }
}

/// Review image request body
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewImageInput {
    #[serde(default)]
    pub url: String,
}

pub struct ReviewService {
    reviews: Arc<dyn ReviewRepository>,
    spots: Arc<dyn SpotRepository>,
}

impl ReviewService {
    pub fn new(reviews: Arc<dyn ReviewRepository>, spots: Arc<dyn SpotRepository>) -> Self {
        Self { reviews, spots }
    }

    /// Reviews written by the requester, with the reviewed spots
    pub async fn current(&self, ctx: &RequestContext) -> Result<Vec<ReviewWithDetails>, ServiceError> {
        Ok(self
            .reviews
            .list_for_user(ctx.user_id)
            .await
            .context("Failed to list user reviews")?)
    }

    pub async fn list_for_spot(&self, spot_id: i64) -> Result<Vec<ReviewWithDetails>, ServiceError> {
        self.spots
            .get_by_id(spot_id)
            .await
            .context("Failed to load spot")?
            .ok_or_else(spot_not_found)?;

        Ok(self
            .reviews
            .list_for_spot(spot_id)
            .await
            .context("Failed to list spot reviews")?)
    }

    /// Review a spot. A user reviews a given spot at most once.
    pub async fn create(
        &self,
        ctx: &RequestContext,
        spot_id: i64,
        input: ReviewInput,
    ) -> Result<Review, ServiceError> {
        let (text, stars) = input.validate()?;

        self.spots
            .get_by_id(spot_id)
            .await
            .context("Failed to load spot")?
            .ok_or_else(spot_not_found)?;

        let existing = self
            .reviews
            .get_by_user_and_spot(ctx.user_id, spot_id)
            .await
            .context("Failed to check existing review")?;
        if existing.is_some() {
            return Err(ServiceError::Duplicate(
                "User already has a review for this spot".to_string(),
                FieldErrors::new(),
            ));
        }

        let review = self
            .reviews
            .create(&Review::new(ctx.user_id, spot_id, text, stars))
            .await
            .context("Failed to create review")?;
        Ok(review)
    }

    /// Attach an image to one of the requester's reviews
    pub async fn add_image(
        &self,
        ctx: &RequestContext,
        review_id: i64,
        input: ReviewImageInput,
    ) -> Result<ReviewImage, ServiceError> {
        let review = self
            .reviews
            .get_by_id(review_id)
            .await
            .context("Failed to load review")?;
        let attached = match &review {
            Some(r) => self
                .reviews
                .count_images(r.id)
                .await
                .context("Failed to count review images")?,
            None => 0,
        };

        if let Err(denial) = policy::authorize_review_image(review.as_ref(), ctx, attached) {
            tracing::info!(review_id, user_id = ctx.user_id, "Review image denied: {}", denial);
            return Err(denial.into());
        }
        if input.url.trim().is_empty() {
            return Err(ServiceError::invalid("url", "Image url is required"));
        }

        let image = self
            .reviews
            .add_image(review_id, &input.url)
            .await
            .context("Failed to add review image")?;
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{fixtures, SqlxReviewRepository, SqlxSpotRepository};
    use crate::db::{create_test_pool, migrations, DynDatabasePool};

    async fn setup_test_service() -> (DynDatabasePool, ReviewService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let service = ReviewService::new(
            SqlxReviewRepository::boxed(pool.clone()),
            SqlxSpotRepository::boxed(pool.clone()),
        );
        (pool, service)
    }

    fn input(text: &str, stars: i64) -> ReviewInput {
        ReviewInput {
            review: Some(text.into()),
            stars: Some(stars),
        }
    }

    fn image(url: &str) -> ReviewImageInput {
        ReviewImageInput { url: url.into() }
    }

    #[tokio::test]
    async fn test_create_review_once_per_spot() {
        let (pool, service) = setup_test_service().await;
        let owner = fixtures::seed_user(&pool, "owner").await;
        let guest = fixtures::seed_user(&pool, "guest").await;
        let spot = fixtures::seed_spot(&pool, owner, "Cabin").await;
        let ctx = RequestContext::new(guest);

        let review = service.create(&ctx, spot, input("Lovely", 5)).await.unwrap();
        let again = service.create(&ctx, spot, input("Still lovely", 4)).await;

        assert_eq!(review.stars, 5);
        assert!(matches!(again, Err(ServiceError::Duplicate(_, _))));
    }

    #[tokio::test]
    async fn test_create_review_validation_and_missing_spot() {
        let (pool, service) = setup_test_service().await;
        let guest = fixtures::seed_user(&pool, "guest").await;
        let ctx = RequestContext::new(guest);

        let invalid = service.create(&ctx, 1, input("", 6)).await.unwrap_err();
        let missing = service.create(&ctx, 999, input("Fine", 3)).await.unwrap_err();

        let errors = invalid.field_errors().unwrap();
        assert!(errors.contains_key("review"));
        assert!(errors.contains_key("stars"));
        assert!(matches!(missing, ServiceError::NotFound(m) if m == "Spot couldn't be found"));
    }

    #[tokio::test]
    async fn test_eleventh_image_is_refused() {
        let (pool, service) = setup_test_service().await;
        let owner = fixtures::seed_user(&pool, "owner").await;
        let guest = fixtures::seed_user(&pool, "guest").await;
        let spot = fixtures::seed_spot(&pool, owner, "Cabin").await;
        let review = fixtures::seed_review(&pool, guest, spot, 4).await;
        let ctx = RequestContext::new(guest);

        for i in 0..10 {
            service
                .add_image(&ctx, review, image(&format!("{}.jpg", i)))
                .await
                .unwrap();
        }
        let err = service.add_image(&ctx, review, image("extra.jpg")).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "Maximum number of images for this resource was reached"
        );
    }

    #[tokio::test]
    async fn test_review_image_owner_and_existence() {
        let (pool, service) = setup_test_service().await;
        let owner = fixtures::seed_user(&pool, "owner").await;
        let guest = fixtures::seed_user(&pool, "guest").await;
        let spot = fixtures::seed_spot(&pool, owner, "Cabin").await;
        let review = fixtures::seed_review(&pool, guest, spot, 4).await;

        let forbidden = service
            .add_image(&RequestContext::new(owner), review, image("a.jpg"))
            .await
            .unwrap_err();
        let missing = service
            .add_image(&RequestContext::new(guest), 999, image("a.jpg"))
            .await
            .unwrap_err();

        assert!(matches!(forbidden, ServiceError::Forbidden(_)));
        assert_eq!(missing.to_string(), "Review couldn't be found");
    }

    #[tokio::test]
    async fn test_listings() {
        let (pool, service) = setup_test_service().await;
        let owner = fixtures::seed_user(&pool, "owner").await;
        let guest = fixtures::seed_user(&pool, "guest").await;
        let spot = fixtures::seed_spot(&pool, owner, "Cabin").await;
        fixtures::seed_review(&pool, guest, spot, 4).await;

        assert_eq!(service.list_for_spot(spot).await.unwrap().len(), 1);
        assert!(service.list_for_spot(999).await.is_err());
        assert_eq!(service.current(&RequestContext::new(guest)).await.unwrap().len(), 1);
        assert!(service.current(&RequestContext::new(owner)).await.unwrap().is_empty());
    }
}
