//! Public profiles and the follow graph.

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::super::error::{ApiError, follow_to_api, profile_to_api};
use super::super::middleware::CurrentUser;
use super::super::models::{PostJson, ProfileJson};
use super::super::state::ApiState;

pub async fn show_profile(
    State(state): State<ApiState>,
    Extension(current): Extension<CurrentUser>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let viewer = current.principal().map(|principal| &principal.user);
    let view = state
        .profiles
        .show(&username, viewer)
        .await
        .map_err(profile_to_api)?;

    Ok(Json(ProfileJson::from_view(&view)))
}

pub async fn liked_posts(
    State(state): State<ApiState>,
    Extension(current): Extension<CurrentUser>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = current.require()?;
    let posts = state
        .profiles
        .liked_posts(&username, &principal.user)
        .await
        .map_err(profile_to_api)?;

    Ok(Json(
        posts.into_iter().map(PostJson::from_view).collect::<Vec<_>>(),
    ))
}

pub async fn follow(
    State(state): State<ApiState>,
    Extension(current): Extension<CurrentUser>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = current.require()?;
    state
        .follows
        .follow(&principal.user, &username)
        .await
        .map_err(follow_to_api)?;

    Ok(StatusCode::CREATED)
}

pub async fn unfollow(
    State(state): State<ApiState>,
    Extension(current): Extension<CurrentUser>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = current.require()?;
    state
        .follows
        .unfollow(&principal.user, &username)
        .await
        .map_err(follow_to_api)?;

    Ok(StatusCode::NO_CONTENT)
}
