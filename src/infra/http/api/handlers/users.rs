//! Account settings: profile fields, password, avatar.

use axum::Json;
use axum::extract::{Extension, Multipart, State};
use axum::response::IntoResponse;

use crate::application::users::UpdateProfileCommand;

use super::super::error::{ApiError, upload_to_api, user_to_api};
use super::super::middleware::CurrentUser;
use super::super::models::{AccountJson, UpdatePasswordRequest, UpdateUserRequest};
use super::super::state::ApiState;

const AVATAR_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

pub async fn update_user(
    State(state): State<ApiState>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = current.require()?;
    let updated = state
        .users
        .update_profile(
            &principal.user,
            UpdateProfileCommand {
                name: payload.name,
                bio: payload.bio,
                public_likes: payload.public_likes,
            },
        )
        .await
        .map_err(user_to_api)?;

    Ok(Json(AccountJson::from_record(&updated)))
}

pub async fn update_password(
    State(state): State<ApiState>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<UpdatePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = current.require()?;
    state
        .users
        .update_password(&principal.user, &payload.current_password, &payload.password)
        .await
        .map_err(user_to_api)?;

    Ok(axum::http::StatusCode::NO_CONTENT)
}

pub async fn update_avatar(
    State(state): State<ApiState>,
    Extension(current): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let principal = current.require()?;

    let field = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::bad_request(err.to_string()))?
        .ok_or_else(|| ApiError::bad_request("missing avatar file"))?;

    let content_type = field
        .content_type()
        .map(|value| value.to_string())
        .ok_or_else(|| ApiError::bad_request("avatar content type is required"))?;
    if !AVATAR_CONTENT_TYPES.contains(&content_type.as_str()) {
        return Err(ApiError::unprocessable("avatar must be a JPEG, PNG, GIF, or WebP image"));
    }

    let original_name = field.file_name().unwrap_or("avatar").to_string();
    let data = field
        .bytes()
        .await
        .map_err(|err| ApiError::bad_request(err.to_string()))?;

    let stored = state
        .upload_storage
        .store(&original_name, data)
        .await
        .map_err(upload_to_api)?;

    let previous = principal.user.avatar_path.clone();
    let updated = state
        .users
        .set_avatar(principal.user.id, Some(&stored.stored_path))
        .await
        .map_err(user_to_api)?;

    if let Some(previous) = previous {
        let _ = state.upload_storage.delete(&previous).await;
    }

    Ok(Json(AccountJson::from_record(&updated)))
}
