use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::cookie::CookieJar;

use crate::application::sessions::{SESSION_COOKIE, SessionPrincipal};

use super::error::ApiError;
use super::state::ApiState;

/// The session resolved for this request, present on every API route.
/// Anonymous callers carry `None`.
#[derive(Clone)]
pub struct CurrentUser(pub Option<SessionPrincipal>);

impl CurrentUser {
    pub fn require(&self) -> Result<&SessionPrincipal, ApiError> {
        self.0.as_ref().ok_or_else(ApiError::unauthorized)
    }

    pub fn principal(&self) -> Option<&SessionPrincipal> {
        self.0.as_ref()
    }
}

/// Resolve the session cookie, if any, and stash the result for handlers.
/// Invalid or expired tokens degrade to anonymous rather than failing here;
/// routes that need a user reject through `CurrentUser::require`.
pub async fn load_session(
    State(state): State<ApiState>,
    jar: CookieJar,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let principal = match jar.get(SESSION_COOKIE) {
        Some(cookie) => state.sessions.authenticate(cookie.value()).await.ok(),
        None => None,
    };

    request.extensions_mut().insert(CurrentUser(principal));
    next.run(request).await
}

/// Sliding-window limit keyed by session, falling back to the caller address.
pub async fn api_rate_limit(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let key = match request.extensions().get::<CurrentUser>() {
        Some(CurrentUser(Some(principal))) => format!("session:{}", principal.session_id),
        _ => format!(
            "addr:{}",
            client_ip(request.headers()).unwrap_or_else(|| "unknown".to_string())
        ),
    };

    if !state.rate_limiter.allow(&key, &path) {
        return ApiError::rate_limited(state.rate_limiter.retry_after_secs());
    }

    next.run(request).await
}

/// Best-effort client address from proxy headers.
pub fn client_ip(headers: &axum::http::HeaderMap) -> Option<String> {
    if let Some(forwarded) = headers.get("x-forwarded-for")
        && let Ok(value) = forwarded.to_str()
        && let Some(first) = value.split(',').next()
    {
        let first = first.trim();
        if !first.is_empty() {
            return Some(first.to_string());
        }
    }
    headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn user_agent(headers: &axum::http::HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}
