//! Health alert endpoints

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{post, put},
    Json, Router,
};
use gaia_common::db::models::{HealthAlert, NewHealthAlert};
use gaia_common::PermissionLevel;
use serde::Deserialize;
use uuid::Uuid;

use super::{authorized, CurrentCaregiver};
use crate::error::ApiResult;
use crate::services::alerts;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListAlertsQuery {
    pub resolved: Option<bool>,
}

/// POST /api/care-subjects/:id/alerts
pub async fn create_alert(
    State(state): State<AppState>,
    caller: CurrentCaregiver,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<NewHealthAlert>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<HealthAlert>)> {
    let Path(id) = path?;
    let Json(body) = authorized(&state, &caller, id, PermissionLevel::Edit, body).await?;
    let alert = alerts::create_alert(&state.db, caller.id(), id, body).await?;
    Ok((StatusCode::CREATED, Json(alert)))
}

/// GET /api/care-subjects/:id/alerts?resolved=
pub async fn list_alerts(
    State(state): State<AppState>,
    caller: CurrentCaregiver,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<ListAlertsQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<HealthAlert>>> {
    let Path(id) = path?;
    let Query(query) = authorized(&state, &caller, id, PermissionLevel::View, query).await?;
    Ok(Json(
        alerts::list_alerts(&state.db, caller.id(), id, query.resolved).await?,
    ))
}

/// PUT /api/alerts/:id/resolve
pub async fn resolve_alert(
    State(state): State<AppState>,
    caller: CurrentCaregiver,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<HealthAlert>> {
    let Path(id) = path?;
    Ok(Json(alerts::resolve_alert(&state.db, caller.id(), id).await?))
}

/// Build alert routes
pub fn alert_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/care-subjects/:id/alerts",
            post(create_alert).get(list_alerts),
        )
        .route("/api/alerts/:id/resolve", put(resolve_alert))
}
