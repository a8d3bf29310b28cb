//! Comments and comment likes.

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use super::super::error::{ApiError, comment_to_api, engagement_to_api};
use super::super::middleware::CurrentUser;
use super::super::models::{CommentJson, CreateCommentRequest};
use super::super::state::ApiState;

pub async fn list_comments(
    State(state): State<ApiState>,
    Extension(current): Extension<CurrentUser>,
    Path(post_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let viewer = current.principal().map(|principal| &principal.user);
    let comments = state
        .comments
        .list_for_post(post_id, viewer)
        .await
        .map_err(comment_to_api)?;

    Ok(Json(
        comments
            .into_iter()
            .map(CommentJson::from_view)
            .collect::<Vec<_>>(),
    ))
}

pub async fn create_comment(
    State(state): State<ApiState>,
    Extension(current): Extension<CurrentUser>,
    Path(post_id): Path<Uuid>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = current.require()?;
    let view = state
        .comments
        .create(&principal.user, post_id, &payload.content)
        .await
        .map_err(comment_to_api)?;

    Ok((StatusCode::CREATED, Json(CommentJson::from_view(view))))
}

pub async fn delete_comment(
    State(state): State<ApiState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = current.require()?;
    state
        .comments
        .delete(&principal.user, id)
        .await
        .map_err(comment_to_api)?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn like_comment(
    State(state): State<ApiState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = current.require()?;
    state
        .engagement
        .like_comment(&principal.user, id)
        .await
        .map_err(engagement_to_api)?;

    Ok(StatusCode::CREATED)
}

pub async fn unlike_comment(
    State(state): State<ApiState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = current.require()?;
    state
        .engagement
        .unlike_comment(&principal.user, id)
        .await
        .map_err(engagement_to_api)?;

    Ok(StatusCode::NO_CONTENT)
}
