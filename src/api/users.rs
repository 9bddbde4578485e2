//! Signup endpoint
//!
//! - POST /api/users - create an account and log it in

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};

use crate::api::middleware::{session_cookie, ApiError, ApiJson, AppState};
use crate::api::responses::{SafeUser, UserEnvelope};
use crate::services::SignupInput;

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(signup))
}

/// POST /api/users
async fn signup(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SignupInput>,
) -> Result<impl IntoResponse, ApiError> {
    let (user, session) = state.user_service.signup(body).await?;

    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, session_cookie(&session.id, &state.session)?);

    Ok((
        StatusCode::OK,
        headers,
        Json(UserEnvelope {
            user: Some(SafeUser::from(user)),
        }),
    ))
}
