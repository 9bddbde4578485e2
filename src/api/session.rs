//! Session endpoints
//!
//! - POST /api/session - log in with username or email
//! - GET /api/session - the current user, or `null`
//! - DELETE /api/session - log out

use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use crate::api::middleware::{
    clear_session_cookie, extract_session_token, session_cookie, ApiError, ApiJson, AppState,
    AuthenticatedUser,
};
use crate::api::responses::{MessageResponse, SafeUser, UserEnvelope};
use crate::services::LoginInput;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(restore).post(login).delete(logout))
}

/// POST /api/session
async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginInput>,
) -> Result<impl IntoResponse, ApiError> {
    let (user, session) = state.user_service.login(body).await?;

    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, session_cookie(&session.id, &state.session)?);

    Ok((
        headers,
        Json(UserEnvelope {
            user: Some(SafeUser::from(user)),
        }),
    ))
}

/// GET /api/session
async fn restore(user: Option<AuthenticatedUser>) -> Json<UserEnvelope> {
    Json(UserEnvelope {
        user: user.map(|AuthenticatedUser(u)| SafeUser::from(u)),
    })
}

/// DELETE /api/session
async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(token) = extract_session_token(&headers) {
        state.user_service.logout(&token).await?;
    }

    let mut response_headers = HeaderMap::new();
    response_headers.insert(header::SET_COOKIE, clear_session_cookie());

    Ok((response_headers, Json(MessageResponse::new("success"))))
}
