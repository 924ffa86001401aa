//! Caregiver registration and self lookup

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use gaia_common::db::models::{Caregiver, NewCaregiver};

use super::CurrentCaregiver;
use crate::error::ApiResult;
use crate::services::identity;
use crate::AppState;

/// POST /api/caregivers
///
/// Registration carries no caller identity; the gateway decides who may
/// reach it.
pub async fn register_caregiver(
    State(state): State<AppState>,
    body: Result<Json<NewCaregiver>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Caregiver>)> {
    let Json(body) = body?;
    let caregiver = identity::register_caregiver(&state.db, body).await?;
    Ok((StatusCode::CREATED, Json(caregiver)))
}

/// GET /api/me
pub async fn get_me(caller: CurrentCaregiver) -> Json<Caregiver> {
    Json(caller.0)
}

/// Build caregiver routes
pub fn caregiver_routes() -> Router<AppState> {
    Router::new()
        .route("/api/caregivers", post(register_caregiver))
        .route("/api/me", get(get_me))
}
