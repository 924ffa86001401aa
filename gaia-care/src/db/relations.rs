//! Access relation persistence
//!
//! At most one active relation exists per (caregiver, care subject) pair,
//! enforced by the partial unique index `idx_access_relations_active_pair`.

use gaia_common::db::models::{AccessRelation, PermissionLevel};
use gaia_common::{time, Error, Result};
use sqlx::{sqlite::SqliteRow, Executor, Row, Sqlite, SqlitePool};
use uuid::Uuid;

use super::{is_unique_violation, tag_col, ts_col, uuid_col};

/// Insert a relation
///
/// Losing the race for an active pair surfaces as `DuplicateRelation`.
pub async fn insert_relation<'e, E>(executor: E, relation: &AccessRelation) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO access_relations (
            id, caregiver_id, care_subject_id, relationship_type,
            permission_level, is_active, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(relation.id.to_string())
    .bind(relation.caregiver_id.to_string())
    .bind(relation.care_subject_id.to_string())
    .bind(relation.relationship_type.as_str())
    .bind(relation.permission_level.as_str())
    .bind(relation.is_active)
    .bind(time::to_db_timestamp(&relation.created_at))
    .execute(executor)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(e) if is_unique_violation(&e) => Err(Error::DuplicateRelation {
            caregiver_id: relation.caregiver_id,
            care_subject_id: relation.care_subject_id,
        }),
        Err(e) => Err(e.into()),
    }
}

/// Permission carried by the active relation between the pair, if any
pub async fn active_permission(
    pool: &SqlitePool,
    caregiver_id: Uuid,
    care_subject_id: Uuid,
) -> Result<Option<PermissionLevel>> {
    let row = sqlx::query(
        r#"
        SELECT permission_level
        FROM access_relations
        WHERE caregiver_id = ? AND care_subject_id = ? AND is_active = 1
        "#,
    )
    .bind(caregiver_id.to_string())
    .bind(care_subject_id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref()
        .map(|r| tag_col(r, "permission_level"))
        .transpose()
}

/// Ids of all subjects reachable through an active relation
pub async fn accessible_subject_ids(pool: &SqlitePool, caregiver_id: Uuid) -> Result<Vec<Uuid>> {
    let rows = sqlx::query(
        r#"
        SELECT care_subject_id
        FROM access_relations
        WHERE caregiver_id = ? AND is_active = 1
        ORDER BY care_subject_id ASC
        "#,
    )
    .bind(caregiver_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(|r| uuid_col(r, "care_subject_id")).collect()
}

/// Active relations attached to a subject, oldest first
pub async fn list_relations_for_subject(
    pool: &SqlitePool,
    care_subject_id: Uuid,
) -> Result<Vec<AccessRelation>> {
    let rows = sqlx::query(
        r#"
        SELECT id, caregiver_id, care_subject_id, relationship_type,
               permission_level, is_active, created_at
        FROM access_relations
        WHERE care_subject_id = ? AND is_active = 1
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(care_subject_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(relation_from_row).collect()
}

fn relation_from_row(row: &SqliteRow) -> Result<AccessRelation> {
    Ok(AccessRelation {
        id: uuid_col(row, "id")?,
        caregiver_id: uuid_col(row, "caregiver_id")?,
        care_subject_id: uuid_col(row, "care_subject_id")?,
        relationship_type: tag_col(row, "relationship_type")?,
        permission_level: tag_col(row, "permission_level")?,
        is_active: row.try_get("is_active")?,
        created_at: ts_col(row, "created_at")?,
    })
}
