//! Post feeds, authoring, audio narration, and like/repost toggles.

use axum::Json;
use axum::extract::{Extension, Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::application::posts::{CreatePostCommand, UpdatePostCommand};
use crate::domain::posts::validate_audio_content_type;

use super::super::error::{ApiError, engagement_to_api, post_to_api, upload_to_api};
use super::super::middleware::{CurrentUser, client_ip, user_agent};
use super::super::models::{CreatePostRequest, PostJson, UpdatePostRequest};
use super::super::state::ApiState;

pub async fn list_posts(
    State(state): State<ApiState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let viewer = current.principal().map(|principal| &principal.user);
    let posts = state.posts.latest(viewer).await.map_err(post_to_api)?;
    Ok(Json(to_json(posts)))
}

pub async fn featured_posts(
    State(state): State<ApiState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let viewer = current.principal().map(|principal| &principal.user);
    let posts = state.posts.featured(viewer).await.map_err(post_to_api)?;
    Ok(Json(to_json(posts)))
}

pub async fn trending_posts(
    State(state): State<ApiState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let viewer = current.principal().map(|principal| &principal.user);
    let posts = state.posts.trending(viewer).await.map_err(post_to_api)?;
    Ok(Json(to_json(posts)))
}

pub async fn following_posts(
    State(state): State<ApiState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = current.require()?;
    let posts = state
        .posts
        .following(&principal.user)
        .await
        .map_err(post_to_api)?;
    Ok(Json(to_json(posts)))
}

pub async fn show_post(
    State(state): State<ApiState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let viewer = current.principal().map(|principal| &principal.user);
    let view = state
        .posts
        .show(id, viewer, client_ip(&headers), user_agent(&headers))
        .await
        .map_err(post_to_api)?;

    Ok(Json(PostJson::from_view(view)))
}

pub async fn create_post(
    State(state): State<ApiState>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = current.require()?;
    let view = state
        .posts
        .create(
            &principal.user,
            CreatePostCommand {
                title: payload.title,
                content: payload.content,
                tags: payload.tags,
            },
        )
        .await
        .map_err(post_to_api)?;

    Ok((StatusCode::CREATED, Json(PostJson::from_view(view))))
}

pub async fn update_post(
    State(state): State<ApiState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = current.require()?;
    let view = state
        .posts
        .update(
            &principal.user,
            UpdatePostCommand {
                id,
                title: payload.title,
                content: payload.content,
            },
        )
        .await
        .map_err(post_to_api)?;

    Ok(Json(PostJson::from_view(view)))
}

pub async fn delete_post(
    State(state): State<ApiState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = current.require()?;
    state
        .posts
        .delete(&principal.user, id)
        .await
        .map_err(post_to_api)?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn attach_audio(
    State(state): State<ApiState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let principal = current.require()?;

    let field = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::bad_request(err.to_string()))?
        .ok_or_else(|| ApiError::bad_request("missing audio file"))?;

    let content_type = field
        .content_type()
        .map(|value| value.to_string())
        .ok_or_else(|| ApiError::bad_request("audio content type is required"))?;
    validate_audio_content_type(&content_type)
        .map_err(|err| ApiError::unprocessable(err.to_string()))?;

    let original_name = field.file_name().unwrap_or("narration").to_string();
    let data = field
        .bytes()
        .await
        .map_err(|err| ApiError::bad_request(err.to_string()))?;

    let stored = state
        .upload_storage
        .store(&original_name, data)
        .await
        .map_err(upload_to_api)?;

    // Replacing a narration orphans the previous file; remove it once the
    // row points at the new one.
    let (post, previous) = state
        .posts
        .attach_audio(&principal.user, id, &stored.stored_path)
        .await
        .map_err(post_to_api)?;
    if let Some(previous) = previous {
        let _ = state.upload_storage.delete(&previous).await;
    }

    let view = state
        .posts
        .fetch(post.id, Some(&principal.user))
        .await
        .map_err(post_to_api)?;
    Ok(Json(PostJson::from_view(view)))
}

pub async fn detach_audio(
    State(state): State<ApiState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = current.require()?;
    let previous = state
        .posts
        .detach_audio(&principal.user, id)
        .await
        .map_err(post_to_api)?;

    if let Some(previous) = previous {
        let _ = state.upload_storage.delete(&previous).await;
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn like_post(
    State(state): State<ApiState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = current.require()?;
    state
        .engagement
        .like_post(&principal.user, id)
        .await
        .map_err(engagement_to_api)?;

    Ok(StatusCode::CREATED)
}

pub async fn unlike_post(
    State(state): State<ApiState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = current.require()?;
    state
        .engagement
        .unlike_post(&principal.user, id)
        .await
        .map_err(engagement_to_api)?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn repost(
    State(state): State<ApiState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = current.require()?;
    state
        .engagement
        .repost(&principal.user, id)
        .await
        .map_err(engagement_to_api)?;

    Ok(StatusCode::CREATED)
}

pub async fn unrepost(
    State(state): State<ApiState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = current.require()?;
    state
        .engagement
        .unrepost(&principal.user, id)
        .await
        .map_err(engagement_to_api)?;

    Ok(StatusCode::NO_CONTENT)
}

fn to_json(posts: Vec<crate::application::posts::PostView>) -> Vec<PostJson> {
    posts.into_iter().map(PostJson::from_view).collect()
}
