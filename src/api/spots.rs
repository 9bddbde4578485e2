//! Spot endpoints
//!
//! - GET /api/spots
//! - POST /api/spots
//! - GET /api/spots/{spot_id}
//! - POST /api/spots/{spot_id}/images
//! - GET /api/spots/{spot_id}/reviews
//! - POST /api/spots/{spot_id}/reviews
//! - POST /api/spots/{spot_id}/bookings

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::api::middleware::{ApiError, ApiJson, ApiPath, AppState, AuthenticatedUser};
use crate::api::responses::{
    ReviewItem, ReviewsResponse, SpotDetailsResponse, SpotImageItem, SpotListItem, SpotsResponse,
};
use crate::services::{BookingDates, ReviewInput, SpotImageInput, SpotInput};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_spots).post(create_spot))
        .route("/{spot_id}", get(get_spot))
        .route("/{spot_id}/images", post(add_spot_image))
        .route("/{spot_id}/reviews", get(list_spot_reviews).post(create_review))
        .route("/{spot_id}/bookings", post(create_booking))
}

/// GET /api/spots
async fn list_spots(State(state): State<AppState>) -> Result<Json<SpotsResponse>, ApiError> {
    let spots = state.spot_service.list().await?;

    Ok(Json(SpotsResponse {
        spots: spots.into_iter().map(SpotListItem::from).collect(),
    }))
}

/// POST /api/spots
async fn create_spot(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiJson(body): ApiJson<SpotInput>,
) -> Result<impl IntoResponse, ApiError> {
    let spot = state.spot_service.create(&user.context(), body).await?;
    Ok((StatusCode::CREATED, Json(spot)))
}

/// GET /api/spots/{spot_id}
async fn get_spot(
    State(state): State<AppState>,
    ApiPath(spot_id): ApiPath<i64>,
) -> Result<Json<SpotDetailsResponse>, ApiError> {
    let details = state.spot_service.details(spot_id).await?;
    Ok(Json(details.into()))
}

/// POST /api/spots/{spot_id}/images
async fn add_spot_image(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(spot_id): ApiPath<i64>,
    ApiJson(body): ApiJson<SpotImageInput>,
) -> Result<Json<SpotImageItem>, ApiError> {
    let image = state
        .spot_service
        .add_image(&user.context(), spot_id, body)
        .await?;
    Ok(Json(image.into()))
}

/// GET /api/spots/{spot_id}/reviews
async fn list_spot_reviews(
    State(state): State<AppState>,
    ApiPath(spot_id): ApiPath<i64>,
) -> Result<Json<ReviewsResponse>, ApiError> {
    let reviews = state.review_service.list_for_spot(spot_id).await?;

    Ok(Json(ReviewsResponse {
        reviews: reviews.into_iter().map(ReviewItem::from).collect(),
    }))
}

/// POST /api/spots/{spot_id}/reviews
async fn create_review(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(spot_id): ApiPath<i64>,
    ApiJson(body): ApiJson<ReviewInput>,
) -> Result<impl IntoResponse, ApiError> {
    let review = state
        .review_service
        .create(&user.context(), spot_id, body)
        .await?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// POST /api/spots/{spot_id}/bookings
async fn create_booking(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(spot_id): ApiPath<i64>,
    ApiJson(body): ApiJson<BookingDates>,
) -> Result<impl IntoResponse, ApiError> {
    let booking = state
        .booking_service
        .create(&user.context(), spot_id, &body)
        .await?;
    Ok((StatusCode::CREATED, Json(booking)))
}
