//! API middleware
//!
//! Contains:
//! - Shared application state
//! - The `{message, errors}` error body and its mapping from service errors
//! - Session resolution (`token` cookie or Bearer header)
//! - The `AuthenticatedUser` extractor

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        FromRequest, FromRequestParts, OptionalFromRequestParts, Request, State,
    },
    http::{header, request::Parts, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{CompatConfig, SessionConfig};
use crate::models::User;
use crate::policy::RequestContext;
use crate::services::{BookingService, FieldErrors, ReviewService, ServiceError, SpotService, UserService};

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "token";

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub spot_service: Arc<SpotService>,
    pub review_service: Arc<ReviewService>,
    pub booking_service: Arc<BookingService>,
    pub session: SessionConfig,
    pub compat: CompatConfig,
}

/// Authenticated user extracted from request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl AuthenticatedUser {
    /// The policy context for this request
    pub fn context(&self) -> RequestContext {
        RequestContext::new(self.0.id)
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

impl<S> OptionalFromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<AuthenticatedUser>().cloned())
    }
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

/// Error returned by handlers
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                message: message.into(),
                errors: None,
            },
        }
    }

    pub fn with_errors(mut self, errors: FieldErrors) -> Self {
        self.body.errors = (!errors.is_empty()).then_some(errors);
        self
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal_error() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let errors = err.field_errors();
        let status = match &err {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Forbidden(_) | ServiceError::Conflict | ServiceError::State(_) => {
                StatusCode::FORBIDDEN
            }
            ServiceError::Duplicate(_, _) => StatusCode::CONFLICT,
            ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServiceError::Internal(e) => {
                tracing::error!("Internal error: {:#}", e);
                return Self::internal_error();
            }
        };

        Self::new(status, err.to_string()).with_errors(errors.unwrap_or_default())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let status = match &rejection {
            JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_) => {
                StatusCode::BAD_REQUEST
            }
            other => other.status(),
        };
        let message = status.canonical_reason().unwrap_or("Bad Request");

        let mut errors = FieldErrors::new();
        errors.insert("body".into(), rejection.body_text());
        Self::new(status, message).with_errors(errors)
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        match rejection {
            PathRejection::FailedToDeserializePathParams(e) => {
                let mut errors = FieldErrors::new();
                errors.insert("path".into(), e.body_text());
                Self::new(StatusCode::BAD_REQUEST, "Bad Request").with_errors(errors)
            }
            other => {
                tracing::error!("Path extraction failed: {}", other.body_text());
                Self::internal_error()
            }
        }
    }
}

/// JSON body extractor whose rejections use the `{message, errors}` body
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Path extractor whose rejections use the `{message, errors}` body
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Extract the session token from the `token` cookie or a Bearer header
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.trim().to_string());
            }
        }
    }

    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies
        .split(';')
        .filter_map(|c| c.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|v| !v.is_empty())
}

/// Resolve the session, if any, and attach the user to the request.
///
/// Requests without a valid session pass through untouched; handlers that
/// need a user ask for [`AuthenticatedUser`] and get a 401 instead.
pub async fn resolve_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(token) = extract_session_token(request.headers()) {
        if let Some(user) = state.user_service.validate_session(&token).await? {
            request.extensions_mut().insert(AuthenticatedUser(user));
        }
    }
    Ok(next.run(request).await)
}

/// Rewrite 409 answers to 500 for clients written against the old status
pub async fn legacy_duplicate_status(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    if response.status() == StatusCode::CONFLICT {
        *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    }
    response
}

/// `Set-Cookie` value that installs a session token
pub fn session_cookie(token: &str, session: &SessionConfig) -> Result<HeaderValue, ApiError> {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE,
        token,
        session.expiration_days * 24 * 60 * 60
    );
    if session.cookie_secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).map_err(|e| {
        tracing::error!("Invalid session cookie: {}", e);
        ApiError::internal_error()
    })
}

/// `Set-Cookie` value that clears the session token
pub fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_static("token=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}
