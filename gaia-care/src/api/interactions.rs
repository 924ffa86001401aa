//! Interaction recording and listing

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::post,
    Json, Router,
};
use gaia_common::db::models::{HealthAlert, Interaction, NewInteraction};
use gaia_common::PermissionLevel;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::{authorized, CurrentCaregiver};
use crate::error::ApiResult;
use crate::services::{alerts, ledger};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListInteractionsQuery {
    pub limit: Option<u32>,
}

/// Response of POST /api/care-subjects/:id/interactions
#[derive(Debug, Serialize)]
pub struct RecordedInteraction {
    pub interaction: Interaction,
    /// Alerts raised from this interaction's signals
    pub alerts: Vec<HealthAlert>,
}

/// POST /api/care-subjects/:id/interactions
///
/// Records the interaction, then raises threshold alerts when
/// `auto_alerts_enabled` is set. Once the interaction is stored the request
/// succeeds: a failure while raising alerts is logged and the response lists
/// only the alerts that were raised.
pub async fn record_interaction(
    State(state): State<AppState>,
    caller: CurrentCaregiver,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<NewInteraction>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<RecordedInteraction>)> {
    let Path(id) = path?;
    let Json(body) = authorized(&state, &caller, id, PermissionLevel::Edit, body).await?;

    let interaction = ledger::record_interaction(&state.db, caller.id(), id, body).await?;

    let raised = if state.settings.auto_alerts_enabled {
        alerts::raise_for_interaction(
            &state.db,
            caller.id(),
            &interaction,
            &state.settings.alert_thresholds,
        )
        .await
    } else {
        Vec::new()
    };
    if !raised.is_empty() {
        info!(
            interaction_id = %interaction.id,
            count = raised.len(),
            "Interaction raised alerts"
        );
    }

    Ok((
        StatusCode::CREATED,
        Json(RecordedInteraction {
            interaction,
            alerts: raised,
        }),
    ))
}

/// GET /api/care-subjects/:id/interactions?limit=
pub async fn list_interactions(
    State(state): State<AppState>,
    caller: CurrentCaregiver,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<ListInteractionsQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Interaction>>> {
    let Path(id) = path?;
    let Query(query) = authorized(&state, &caller, id, PermissionLevel::View, query).await?;

    let limit = query
        .limit
        .unwrap_or(state.settings.interactions_default_limit);
    Ok(Json(
        ledger::list_interactions(&state.db, caller.id(), id, limit).await?,
    ))
}

/// Build interaction routes
pub fn interaction_routes() -> Router<AppState> {
    Router::new().route(
        "/api/care-subjects/:id/interactions",
        post(record_interaction).get(list_interactions),
    )
}
