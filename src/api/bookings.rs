//! Booking endpoints
//!
//! - GET /api/bookings/current
//! - PUT /api/bookings/{booking_id}
//! - DELETE /api/bookings/{booking_id}

use axum::{
    extract::State,
    routing::{get, put},
    Json, Router,
};
use chrono::Utc;

use crate::api::middleware::{ApiError, ApiJson, ApiPath, AppState, AuthenticatedUser};
use crate::api::responses::{BookingItem, BookingsResponse, MessageResponse};
use crate::models::Booking;
use crate::services::BookingDates;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/current", get(current_bookings))
        .route("/{booking_id}", put(update_booking).delete(delete_booking))
}

/// GET /api/bookings/current
async fn current_bookings(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<BookingsResponse>, ApiError> {
    let bookings = state.booking_service.current(&user.context()).await?;

    Ok(Json(BookingsResponse {
        bookings: bookings.into_iter().map(BookingItem::from).collect(),
    }))
}

/// PUT /api/bookings/{booking_id}
async fn update_booking(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(booking_id): ApiPath<i64>,
    ApiJson(body): ApiJson<BookingDates>,
) -> Result<Json<Booking>, ApiError> {
    let booking = state
        .booking_service
        .update(&user.context(), booking_id, &body, Utc::now())
        .await?;
    Ok(Json(booking))
}

/// DELETE /api/bookings/{booking_id}
async fn delete_booking(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(booking_id): ApiPath<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .booking_service
        .delete(&user.context(), booking_id, Utc::now())
        .await?;
    Ok(Json(MessageResponse::new("Successfully deleted")))
}
