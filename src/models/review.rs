//! Review model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Spot, SpotImage, UserSummary};

/// Most images a single review may carry
pub const MAX_REVIEW_IMAGES: usize = 10;

/// A user's review of a spot. One per user per spot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i64,
    pub user_id: i64,
    pub spot_id: i64,
    pub review: String,
    /// 1 to 5
    pub stars: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Review {
    pub fn new(user_id: i64, spot_id: i64, review: String, stars: i64) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            user_id,
            spot_id,
            review,
            stars,
            created_at: now,
            updated_at: now,
        }
    }
}

/// An image attached to a review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewImage {
    pub id: i64,
    pub url: String,
}

/// A review joined with its author, its images and (optionally) its spot
#[derive(Debug, Clone)]
pub struct ReviewWithDetails {
    pub review: Review,
    pub author: UserSummary,
    pub images: Vec<ReviewImage>,
    /// Loaded for the reviewer's own listing only
    pub spot: Option<(Spot, Vec<SpotImage>)>,
}
