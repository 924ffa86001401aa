//! Aggregation endpoints

use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    routing::get,
    Json, Router,
};
use gaia_common::db::models::{SeriesPoint, StatsSummary};
use gaia_common::PermissionLevel;
use serde::Deserialize;
use uuid::Uuid;

use super::{authorized, CurrentCaregiver};
use crate::error::ApiResult;
use crate::services::aggregation;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SentimentQuery {
    pub days: Option<u32>,
}

/// GET /api/care-subjects/:id/stats
pub async fn get_stats(
    State(state): State<AppState>,
    caller: CurrentCaregiver,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<StatsSummary>> {
    let Path(id) = path?;
    Ok(Json(
        aggregation::compute_stats(&state.db, caller.id(), id).await?,
    ))
}

/// GET /api/care-subjects/:id/sentiment?days=
pub async fn get_sentiment_series(
    State(state): State<AppState>,
    caller: CurrentCaregiver,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<SentimentQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<SeriesPoint>>> {
    let Path(id) = path?;
    let Query(query) = authorized(&state, &caller, id, PermissionLevel::View, query).await?;
    let days = query
        .days
        .unwrap_or(state.settings.sentiment_default_window_days);
    Ok(Json(
        aggregation::compute_sentiment_series(&state.db, caller.id(), id, days).await?,
    ))
}

/// Build aggregation routes
pub fn stats_routes() -> Router<AppState> {
    Router::new()
        .route("/api/care-subjects/:id/stats", get(get_stats))
        .route("/api/care-subjects/:id/sentiment", get(get_sentiment_series))
}
