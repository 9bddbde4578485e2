//! Review endpoints
//!
//! - GET /api/reviews/current
//! - POST /api/reviews/{review_id}/images

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use crate::api::middleware::{ApiError, ApiJson, ApiPath, AppState, AuthenticatedUser};
use crate::api::responses::{ReviewItem, ReviewsResponse};
use crate::models::ReviewImage;
use crate::services::ReviewImageInput;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/current", get(current_reviews))
        .route("/{review_id}/images", post(add_review_image))
}

/// GET /api/reviews/current
async fn current_reviews(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ReviewsResponse>, ApiError> {
    let reviews = state.review_service.current(&user.context()).await?;

    Ok(Json(ReviewsResponse {
        reviews: reviews.into_iter().map(ReviewItem::from).collect(),
    }))
}

/// POST /api/reviews/{review_id}/images
async fn add_review_image(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(review_id): ApiPath<i64>,
    ApiJson(body): ApiJson<ReviewImageInput>,
) -> Result<Json<ReviewImage>, ApiError> {
    let image = state
        .review_service
        .add_image(&user.context(), review_id, body)
        .await?;
    Ok(Json(image))
}
