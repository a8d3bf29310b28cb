//! Serves stored narration audio and avatars from the upload directory.

use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};

use crate::application::error::ErrorReport;

use super::api::state::ApiState;

pub async fn serve_audio(
    State(state): State<ApiState>,
    Path(path): Path<String>,
) -> Response {
    serve(&state, &path).await
}

pub async fn serve_avatar(
    State(state): State<ApiState>,
    Path(path): Path<String>,
) -> Response {
    serve(&state, &path).await
}

async fn serve(state: &ApiState, stored_path: &str) -> Response {
    match state.upload_storage.read(stored_path).await {
        Ok(data) => {
            let content_type = mime_guess::from_path(stored_path)
                .first_or_octet_stream()
                .to_string();
            ([(header::CONTENT_TYPE, content_type)], data).into_response()
        }
        Err(err) => {
            let mut response = StatusCode::NOT_FOUND.into_response();
            ErrorReport::from_message(
                "infra::http::media",
                StatusCode::NOT_FOUND,
                format!("stored media unavailable: {err}"),
            )
            .attach(&mut response);
            response
        }
    }
}
