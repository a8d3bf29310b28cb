//! Signup, login, logout, and the current-account endpoint.

use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::OffsetDateTime;

use crate::application::sessions::SESSION_COOKIE;
use crate::application::users::SignupCommand;

use super::super::error::{ApiError, session_to_api, user_to_api};
use super::super::middleware::CurrentUser;
use super::super::models::{AccountJson, LoginRequest, SignupRequest};
use super::super::state::ApiState;

fn session_cookie(state: &ApiState, token: String, expires_at: OffsetDateTime) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(state.secure_cookies);
    cookie.set_expires(expires_at);
    cookie
}

fn expired_cookie(state: &ApiState) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, "");
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(state.secure_cookies);
    cookie.set_expires(OffsetDateTime::UNIX_EPOCH);
    cookie
}

pub async fn signup(
    State(state): State<ApiState>,
    jar: CookieJar,
    Json(payload): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .users
        .signup(SignupCommand {
            name: payload.name,
            username: payload.username,
            email: payload.email,
            password: payload.password,
        })
        .await
        .map_err(user_to_api)?;

    let issued = state.sessions.issue(user.id).await.map_err(session_to_api)?;

    let jar = jar.add(session_cookie(&state, issued.token, issued.expires_at));
    Ok((StatusCode::CREATED, jar, Json(AccountJson::from_record(&user))))
}

pub async fn login(
    State(state): State<ApiState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .users
        .authenticate(&payload.email, &payload.password)
        .await
        .map_err(user_to_api)?;

    let issued = state.sessions.issue(user.id).await.map_err(session_to_api)?;

    let jar = jar.add(session_cookie(&state, issued.token, issued.expires_at));
    Ok((jar, Json(AccountJson::from_record(&user))))
}

pub async fn logout(
    State(state): State<ApiState>,
    Extension(current): Extension<CurrentUser>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let principal = current.require()?;
    state
        .sessions
        .revoke(principal.session_id)
        .await
        .map_err(session_to_api)?;

    let jar = jar.add(expired_cookie(&state));
    Ok((StatusCode::NO_CONTENT, jar))
}

pub async fn me(
    Extension(current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = current.require()?;
    Ok(Json(AccountJson::from_record(&principal.user)))
}
