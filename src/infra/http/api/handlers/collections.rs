//! User-owned collections.

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::application::collections::UpsertCollectionCommand;

use super::super::error::{ApiError, collection_to_api};
use super::super::middleware::CurrentUser;
use super::super::models::{
    AddPostRequest, CollectionDetailJson, CollectionJson, UpsertCollectionRequest,
};
use super::super::state::ApiState;

pub async fn list_collections(
    State(state): State<ApiState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = current.require()?;
    let rows = state
        .collections
        .list(&principal.user)
        .await
        .map_err(collection_to_api)?;

    Ok(Json(
        rows.iter().map(CollectionJson::from_counted).collect::<Vec<_>>(),
    ))
}

pub async fn create_collection(
    State(state): State<ApiState>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<UpsertCollectionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = current.require()?;
    let record = state
        .collections
        .create(
            &principal.user,
            UpsertCollectionCommand {
                name: payload.name,
                description: payload.description,
                is_private: payload.is_private,
            },
        )
        .await
        .map_err(collection_to_api)?;

    Ok((StatusCode::CREATED, Json(CollectionJson::from_record(&record, 0))))
}

pub async fn show_collection(
    State(state): State<ApiState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let viewer = current.principal().map(|principal| &principal.user);
    let detail = state
        .collections
        .show(id, viewer)
        .await
        .map_err(collection_to_api)?;

    Ok(Json(CollectionDetailJson::from_detail(detail)))
}

pub async fn update_collection(
    State(state): State<ApiState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpsertCollectionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = current.require()?;
    let counted = state
        .collections
        .update(
            &principal.user,
            id,
            UpsertCollectionCommand {
                name: payload.name,
                description: payload.description,
                is_private: payload.is_private,
            },
        )
        .await
        .map_err(collection_to_api)?;

    Ok(Json(CollectionJson::from_counted(&counted)))
}

pub async fn delete_collection(
    State(state): State<ApiState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = current.require()?;
    state
        .collections
        .delete(&principal.user, id)
        .await
        .map_err(collection_to_api)?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_post_to_collection(
    State(state): State<ApiState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddPostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = current.require()?;
    state
        .collections
        .add_post(&principal.user, id, payload.post_id)
        .await
        .map_err(collection_to_api)?;

    Ok(StatusCode::CREATED)
}

pub async fn remove_post_from_collection(
    State(state): State<ApiState>,
    Extension(current): Extension<CurrentUser>,
    Path((id, post_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = current.require()?;
    state
        .collections
        .remove_post(&principal.user, id, post_id)
        .await
        .map_err(collection_to_api)?;

    Ok(StatusCode::NO_CONTENT)
}
