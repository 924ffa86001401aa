//! Access relation graph
//!
//! The single authorization entry point for the service. Permission levels
//! are totally ordered (`view < edit < admin`), so a check is one
//! comparison against the caller's active relation.

use gaia_common::db::models::{AccessRelation, PermissionLevel, RelationshipType};
use gaia_common::{time, uuid_utils, Error, Result};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::db::{caregivers, relations};

/// Check that the caregiver holds at least `required` on the subject
///
/// Returns the level actually held. An unknown subject is reported as
/// `Denied`, the same as a subject the caller cannot see.
pub async fn authorize(
    pool: &SqlitePool,
    caregiver_id: Uuid,
    care_subject_id: Uuid,
    required: PermissionLevel,
) -> Result<PermissionLevel> {
    match relations::active_permission(pool, caregiver_id, care_subject_id).await? {
        Some(level) if level.satisfies(required) => Ok(level),
        held => {
            debug!(
                %caregiver_id,
                %care_subject_id,
                ?held,
                %required,
                "Access denied"
            );
            Err(Error::Denied {
                caregiver_id,
                care_subject_id,
                required,
            })
        }
    }
}

/// Ids of every subject the caregiver can see
///
/// Inaccessible subjects are omitted rather than reported.
pub async fn list_accessible_subjects(pool: &SqlitePool, caregiver_id: Uuid) -> Result<Vec<Uuid>> {
    relations::accessible_subject_ids(pool, caregiver_id).await
}

/// Create an active relation between a caregiver and a subject
///
/// Fails with `DuplicateRelation` when the pair is already linked.
pub async fn grant_relation(
    pool: &SqlitePool,
    caregiver_id: Uuid,
    care_subject_id: Uuid,
    relationship_type: RelationshipType,
    permission_level: PermissionLevel,
) -> Result<AccessRelation> {
    let relation = AccessRelation {
        id: uuid_utils::generate(),
        caregiver_id,
        care_subject_id,
        relationship_type,
        permission_level,
        is_active: true,
        created_at: time::now(),
    };

    relations::insert_relation(pool, &relation).await?;
    info!(
        %caregiver_id,
        %care_subject_id,
        level = %permission_level,
        "Granted access relation"
    );

    Ok(relation)
}

/// Grant another caregiver access to a subject on the granter's authority
///
/// The granter must hold `admin`.
pub async fn grant_access(
    pool: &SqlitePool,
    granter_id: Uuid,
    target_caregiver_id: Uuid,
    care_subject_id: Uuid,
    relationship_type: RelationshipType,
    permission_level: PermissionLevel,
) -> Result<AccessRelation> {
    authorize(pool, granter_id, care_subject_id, PermissionLevel::Admin).await?;

    if caregivers::get_caregiver(pool, target_caregiver_id)
        .await?
        .is_none()
    {
        return Err(Error::NotFound(format!("Caregiver {}", target_caregiver_id)));
    }

    grant_relation(
        pool,
        target_caregiver_id,
        care_subject_id,
        relationship_type,
        permission_level,
    )
    .await
}

/// Active relations on a subject; visible to its admins only
pub async fn list_access(
    pool: &SqlitePool,
    caller_id: Uuid,
    care_subject_id: Uuid,
) -> Result<Vec<AccessRelation>> {
    authorize(pool, caller_id, care_subject_id, PermissionLevel::Admin).await?;
    relations::list_relations_for_subject(pool, care_subject_id).await
}
