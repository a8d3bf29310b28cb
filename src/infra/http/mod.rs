pub mod api;
mod media;
pub mod middleware;

pub use api::rate_limit::ApiRateLimiter;
pub use api::{ApiState, build_api_router};

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Router, middleware as axum_middleware};
use sqlx::Error as SqlxError;

use crate::application::error::ErrorReport;

fn db_health_response(result: Result<(), SqlxError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}

async fn healthz(state: axum::extract::State<ApiState>) -> Response {
    db_health_response(state.db.health_check().await)
}

/// The complete public surface: the JSON API, stored media, and health.
pub fn build_router(state: ApiState) -> Router {
    let upload_limit = state.upload_limit_bytes as usize;

    let media_router = Router::new()
        .route("/audio/{*path}", get(media::serve_audio))
        .route("/avatars/{*path}", get(media::serve_avatar))
        .route("/healthz", get(healthz))
        .with_state(state.clone());

    build_api_router(state)
        .merge(media_router)
        .layer(DefaultBodyLimit::max(upload_limit))
        .layer(axum_middleware::from_fn(middleware::set_request_context))
}
