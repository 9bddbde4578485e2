//! Response bodies
//!
//! Repositories hand back joined row structs; these types reshape them into
//! the JSON the clients expect. Association keys keep their capitalized
//! names (`Spot`, `User`, `SpotImages`, ...).

use serde::Serialize;

use crate::models::{
    Booking, BookingWithSpot, Review, ReviewImage, ReviewWithDetails, Spot, SpotDetails, SpotImage,
    SpotSummary, User, UserSummary,
};
use crate::policy::select_preview;

/// A user without credentials
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeUser {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
}

impl From<User> for SafeUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            username: user.username,
        }
    }
}

/// `{user}`, where `user` is `null` for anonymous requests
#[derive(Debug, Serialize)]
pub struct UserEnvelope {
    pub user: Option<SafeUser>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ============================================================================
// Spots
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotListItem {
    #[serde(flatten)]
    pub spot: Spot,
    pub avg_rating: Option<f64>,
    pub preview_image: String,
}

impl From<SpotSummary> for SpotListItem {
    fn from(summary: SpotSummary) -> Self {
        Self {
            preview_image: select_preview(&summary.images),
            avg_rating: summary.avg_rating,
            spot: summary.spot,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SpotsResponse {
    #[serde(rename = "Spots")]
    pub spots: Vec<SpotListItem>,
}

/// An image as shown on a spot page
#[derive(Debug, Serialize)]
pub struct SpotImageItem {
    pub id: i64,
    pub url: String,
    pub preview: bool,
}

impl From<SpotImage> for SpotImageItem {
    fn from(image: SpotImage) -> Self {
        Self {
            id: image.id,
            url: image.url,
            preview: image.preview,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotDetailsResponse {
    #[serde(flatten)]
    pub spot: Spot,
    pub num_reviews: i64,
    pub avg_star_rating: Option<f64>,
    #[serde(rename = "SpotImages")]
    pub spot_images: Vec<SpotImageItem>,
    #[serde(rename = "Owner")]
    pub owner: UserSummary,
}

impl From<SpotDetails> for SpotDetailsResponse {
    fn from(details: SpotDetails) -> Self {
        Self {
            spot: details.spot,
            num_reviews: details.num_reviews,
            avg_star_rating: details.avg_star_rating,
            spot_images: details.images.into_iter().map(Into::into).collect(),
            owner: details.owner,
        }
    }
}

/// The abbreviated spot nested inside bookings and reviews
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NestedSpot {
    pub id: i64,
    pub owner_id: i64,
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub lat: f64,
    pub lng: f64,
    pub name: String,
    pub price: f64,
    pub preview_image: String,
}

impl NestedSpot {
    fn new(spot: Spot, images: &[SpotImage]) -> Self {
        Self {
            id: spot.id,
            owner_id: spot.owner_id,
            address: spot.address,
            city: spot.city,
            state: spot.state,
            country: spot.country,
            lat: spot.lat,
            lng: spot.lng,
            name: spot.name,
            price: spot.price,
            preview_image: select_preview(images),
        }
    }
}

// ============================================================================
// Bookings
// ============================================================================

#[derive(Debug, Serialize)]
pub struct BookingItem {
    #[serde(flatten)]
    pub booking: Booking,
    #[serde(rename = "Spot")]
    pub spot: NestedSpot,
}

impl From<BookingWithSpot> for BookingItem {
    fn from(row: BookingWithSpot) -> Self {
        Self {
            spot: NestedSpot::new(row.spot, &row.spot_images),
            booking: row.booking,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BookingsResponse {
    #[serde(rename = "Bookings")]
    pub bookings: Vec<BookingItem>,
}

// ============================================================================
// Reviews
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ReviewItem {
    #[serde(flatten)]
    pub review: Review,
    #[serde(rename = "User")]
    pub user: UserSummary,
    #[serde(rename = "Spot", skip_serializing_if = "Option::is_none")]
    pub spot: Option<NestedSpot>,
    #[serde(rename = "ReviewImages")]
    pub review_images: Vec<ReviewImage>,
}

impl From<ReviewWithDetails> for ReviewItem {
    fn from(row: ReviewWithDetails) -> Self {
        Self {
            review: row.review,
            user: row.author,
            spot: row.spot.map(|(spot, images)| NestedSpot::new(spot, &images)),
            review_images: row.images,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReviewsResponse {
    #[serde(rename = "Reviews")]
    pub reviews: Vec<ReviewItem>,
}
