//! Author engagement analytics.

use axum::Json;
use axum::extract::{Extension, Query, State};
use axum::response::IntoResponse;

use crate::domain::types::AnalyticsRange;

use super::super::error::{ApiError, analytics_to_api};
use super::super::middleware::CurrentUser;
use super::super::models::AnalyticsQuery;
use super::super::state::ApiState;

pub async fn analytics(
    State(state): State<ApiState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = current.require()?;
    let range = AnalyticsRange::parse(query.range.as_deref());
    let report = state
        .analytics
        .report(&principal.user, range)
        .await
        .map_err(analytics_to_api)?;

    Ok(Json(report))
}
