//! Spot model
//!
//! A spot is a listed property. Its images are stored separately; one of
//! them may carry the `preview` flag and represent the spot in list views.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A listed property available for booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spot {
    pub id: i64,
    /// Owning user
    pub owner_id: i64,
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub lat: f64,
    pub lng: f64,
    /// At most 49 characters
    pub name: String,
    pub description: String,
    /// Price per night
    pub price: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Spot {
    pub fn new(owner_id: i64, input: CreateSpotInput) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            owner_id,
            address: input.address,
            city: input.city,
            state: input.state,
            country: input.country,
            lat: input.lat,
            lng: input.lng,
            name: input.name,
            description: input.description,
            price: input.price,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.owner_id == user_id
    }
}

/// An image attached to a spot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotImage {
    pub id: i64,
    #[serde(rename = "spotId")]
    pub spot_id: i64,
    pub url: String,
    pub preview: bool,
}

/// Validated input for a new spot
#[derive(Debug, Clone, PartialEq)]
pub struct CreateSpotInput {
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub lat: f64,
    pub lng: f64,
    pub name: String,
    pub description: String,
    pub price: f64,
}

/// A spot with its images and average rating, as listed by `GET /spots`
#[derive(Debug, Clone)]
pub struct SpotSummary {
    pub spot: Spot,
    pub avg_rating: Option<f64>,
    pub images: Vec<SpotImage>,
}

/// Public profile of a spot's owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
}

/// Everything shown on a spot's detail page
#[derive(Debug, Clone)]
pub struct SpotDetails {
    pub spot: Spot,
    pub owner: UserSummary,
    pub images: Vec<SpotImage>,
    pub num_reviews: i64,
    pub avg_star_rating: Option<f64>,
}
