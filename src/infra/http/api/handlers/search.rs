//! Substring search endpoint.

use axum::Json;
use axum::extract::{Extension, Query, State};
use axum::response::IntoResponse;

use super::super::error::{ApiError, search_to_api};
use super::super::middleware::CurrentUser;
use super::super::models::{SearchQuery, SearchResultsJson};
use super::super::state::ApiState;

pub async fn search(
    State(state): State<ApiState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let viewer = current.principal().map(|principal| &principal.user);
    let results = state
        .search
        .search(&query.query, query.exclude_collection, viewer)
        .await
        .map_err(search_to_api)?;

    Ok(Json(SearchResultsJson::from_results(results)))
}
