//! The read/unread notification feed.

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use super::super::error::{ApiError, notification_to_api};
use super::super::middleware::CurrentUser;
use super::super::models::NotificationJson;
use super::super::state::ApiState;

pub async fn list_notifications(
    State(state): State<ApiState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = current.require()?;
    let rows = state
        .notifications
        .list(principal.user.id)
        .await
        .map_err(notification_to_api)?;

    Ok(Json(
        rows.into_iter()
            .map(NotificationJson::from_row)
            .collect::<Vec<_>>(),
    ))
}

pub async fn mark_notification_read(
    State(state): State<ApiState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = current.require()?;
    state
        .notifications
        .mark_read(principal.user.id, id)
        .await
        .map_err(notification_to_api)?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn mark_all_notifications_read(
    State(state): State<ApiState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = current.require()?;
    state
        .notifications
        .mark_all_read(principal.user.id)
        .await
        .map_err(notification_to_api)?;

    Ok(StatusCode::NO_CONTENT)
}
