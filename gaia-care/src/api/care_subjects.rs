//! Care subject endpoints and access granting

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use gaia_common::db::models::{
    AccessRelation, CareSubject, CareSubjectPatch, CareSubjectProfile, PermissionLevel,
    RelationshipType,
};
use serde::Deserialize;
use uuid::Uuid;

use super::{authorized, CurrentCaregiver};
use crate::error::ApiResult;
use crate::services::{access, registry};
use crate::AppState;

/// Body of POST /api/care-subjects/:id/access
#[derive(Debug, Deserialize)]
pub struct GrantAccessRequest {
    pub caregiver_id: Uuid,
    pub relationship_type: RelationshipType,
    pub permission_level: PermissionLevel,
}

/// POST /api/care-subjects
pub async fn create_care_subject(
    State(state): State<AppState>,
    caller: CurrentCaregiver,
    body: Result<Json<CareSubjectProfile>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CareSubject>)> {
    let Json(profile) = body?;
    let subject = registry::create_care_subject(&state.db, caller.id(), profile).await?;
    Ok((StatusCode::CREATED, Json(subject)))
}

/// GET /api/care-subjects
pub async fn list_care_subjects(
    State(state): State<AppState>,
    caller: CurrentCaregiver,
) -> ApiResult<Json<Vec<CareSubject>>> {
    Ok(Json(registry::list_care_subjects(&state.db, caller.id()).await?))
}

/// GET /api/care-subjects/:id
pub async fn get_care_subject(
    State(state): State<AppState>,
    caller: CurrentCaregiver,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<CareSubject>> {
    let Path(id) = path?;
    Ok(Json(registry::get_care_subject(&state.db, caller.id(), id).await?))
}

/// PUT /api/care-subjects/:id
pub async fn update_care_subject(
    State(state): State<AppState>,
    caller: CurrentCaregiver,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<CareSubjectPatch>, JsonRejection>,
) -> ApiResult<Json<CareSubject>> {
    let Path(id) = path?;
    let Json(patch) = authorized(&state, &caller, id, PermissionLevel::Edit, body).await?;
    Ok(Json(
        registry::update_care_subject(&state.db, caller.id(), id, patch).await?,
    ))
}

/// POST /api/care-subjects/:id/access
pub async fn grant_access(
    State(state): State<AppState>,
    caller: CurrentCaregiver,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<GrantAccessRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AccessRelation>)> {
    let Path(id) = path?;
    let Json(body) = authorized(&state, &caller, id, PermissionLevel::Admin, body).await?;
    let relation = access::grant_access(
        &state.db,
        caller.id(),
        body.caregiver_id,
        id,
        body.relationship_type,
        body.permission_level,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(relation)))
}

/// GET /api/care-subjects/:id/access
pub async fn list_access(
    State(state): State<AppState>,
    caller: CurrentCaregiver,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<Vec<AccessRelation>>> {
    let Path(id) = path?;
    Ok(Json(access::list_access(&state.db, caller.id(), id).await?))
}

/// Build care subject routes
pub fn care_subject_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/care-subjects",
            post(create_care_subject).get(list_care_subjects),
        )
        .route(
            "/api/care-subjects/:id",
            get(get_care_subject).put(update_care_subject),
        )
        .route(
            "/api/care-subjects/:id/access",
            post(grant_access).get(list_access),
        )
}
