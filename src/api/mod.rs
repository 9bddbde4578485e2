//! API layer - HTTP handlers and routing
//!
//! Every route lives under `/api`:
//! - `users`, `session` - signup, login, logout
//! - `spots` - listing, creation, details, images, spot reviews, booking
//! - `bookings` - the requester's bookings, reschedule, cancel
//! - `reviews` - the requester's reviews, review images

pub mod bookings;
pub mod middleware;
pub mod responses;
pub mod reviews;
pub mod session;
pub mod spots;
pub mod users;

use anyhow::Context;
use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware, Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::db::repositories::{
    SqlxBookingRepository, SqlxReviewRepository, SqlxSessionRepository, SqlxSpotRepository,
    SqlxUserRepository,
};
use crate::db::DynDatabasePool;
use crate::policy::ConflictScope;
use crate::services::{BookingService, ReviewService, SpotService, UserService};

pub use middleware::{ApiError, AppState, AuthenticatedUser};

/// Wire repositories and services over `pool`
pub fn build_state(pool: DynDatabasePool, config: &Config) -> AppState {
    let spot_repo = SqlxSpotRepository::boxed(pool.clone());

    let user_service = UserService::with_session_expiration(
        SqlxUserRepository::boxed(pool.clone()),
        SqlxSessionRepository::boxed(pool.clone()),
        config.session.expiration_days,
    );
    let review_service =
        ReviewService::new(SqlxReviewRepository::boxed(pool.clone()), spot_repo.clone());
    let booking_service = BookingService::new(
        SqlxBookingRepository::boxed(pool.clone()),
        spot_repo.clone(),
        ConflictScope::from_global_flag(config.compat.global_conflict_scope),
    );

    AppState {
        user_service: Arc::new(user_service),
        spot_service: Arc::new(SpotService::new(spot_repo)),
        review_service: Arc::new(review_service),
        booking_service: Arc::new(booking_service),
        session: config.session.clone(),
        compat: config.compat,
    }
}

/// Build the routes mounted under `/api`
pub fn build_api_router() -> Router<AppState> {
    Router::new()
        .nest("/users", users::router())
        .nest("/session", session::router())
        .nest("/spots", spots::router())
        .nest("/bookings", bookings::router())
        .nest("/reviews", reviews::router())
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> anyhow::Result<Router> {
    let origin = cors_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid CORS origin: {}", cors_origin))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);

    let mut api = build_api_router().layer(axum_middleware::from_fn_with_state(
        state.clone(),
        middleware::resolve_session,
    ));
    if state.compat.legacy_duplicate_status {
        api = api.layer(axum_middleware::from_fn(middleware::legacy_duplicate_status));
    }

    Ok(Router::new()
        .nest("/api", api)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}
