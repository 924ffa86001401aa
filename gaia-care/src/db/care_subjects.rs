//! Care subject persistence (care-subject registry)
//!
//! List-valued profile fields are stored as JSON arrays. Subjects are never
//! deleted; deactivation is an update of `is_active`.

use chrono::{DateTime, NaiveDate, Utc};
use gaia_common::db::models::{CareSubject, CareSubjectPatch, CareSubjectProfile};
use gaia_common::{time, Error, Result};
use sqlx::{sqlite::SqliteRow, Executor, QueryBuilder, Row, Sqlite, SqlitePool};
use uuid::Uuid;

use super::{is_unique_violation, json_col, opt_tag_col, to_json_text, ts_col, uuid_col};

const SUBJECT_COLUMNS: &str = r#"
    s.id, s.first_name, s.last_name, s.date_of_birth, s.gender, s.phone_number,
    s.address, s.health_status, s.medical_history, s.conditions, s.medications,
    s.allergies, s.sensitivities, s.mobility_status, s.mobility_aids,
    s.vision_status, s.hearing_status, s.speech_status, s.emergency_contact,
    s.care_instructions, s.robot_id, s.is_active, s.created_at, s.updated_at
"#;

/// Insert a care subject
///
/// Generic over the executor so registration can run inside the same
/// transaction as the creator's admin relation.
pub async fn insert_care_subject<'e, E>(executor: E, subject: &CareSubject) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    let p = &subject.profile;
    let result = sqlx::query(
        r#"
        INSERT INTO care_subjects (
            id, first_name, last_name, date_of_birth, gender, phone_number,
            address, health_status, medical_history, conditions, medications,
            allergies, sensitivities, mobility_status, mobility_aids,
            vision_status, hearing_status, speech_status, emergency_contact,
            care_instructions, robot_id, is_active, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(subject.id.to_string())
    .bind(&p.first_name)
    .bind(&p.last_name)
    .bind(p.date_of_birth.map(|d| d.to_string()))
    .bind(p.gender.map(|g| g.as_str()))
    .bind(&p.phone_number)
    .bind(&p.address)
    .bind(&p.health_status)
    .bind(&p.medical_history)
    .bind(to_json_text(&p.conditions)?)
    .bind(to_json_text(&p.medications)?)
    .bind(to_json_text(&p.allergies)?)
    .bind(to_json_text(&p.sensitivities)?)
    .bind(p.mobility_status.map(|m| m.as_str()))
    .bind(to_json_text(&p.mobility_aids)?)
    .bind(p.vision_status.map(|v| v.as_str()))
    .bind(p.hearing_status.map(|h| h.as_str()))
    .bind(p.speech_status.map(|s| s.as_str()))
    .bind(&p.emergency_contact)
    .bind(&p.care_instructions)
    .bind(&p.robot_id)
    .bind(subject.is_active)
    .bind(time::to_db_timestamp(&subject.created_at))
    .bind(time::to_db_timestamp(&subject.updated_at))
    .execute(executor)
    .await;

    result.map(|_| ()).map_err(robot_conflict)
}

/// Load care subject by id
pub async fn get_care_subject(pool: &SqlitePool, id: Uuid) -> Result<Option<CareSubject>> {
    let sql = format!("SELECT {} FROM care_subjects s WHERE s.id = ?", SUBJECT_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(subject_from_row).transpose()
}

/// Load the subjects with the given ids, oldest first
///
/// Unknown ids are skipped.
pub async fn get_care_subjects_by_ids(pool: &SqlitePool, ids: &[Uuid]) -> Result<Vec<CareSubject>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT ");
    qb.push(SUBJECT_COLUMNS)
        .push(" FROM care_subjects s WHERE s.id IN (");
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(id.to_string());
    }
    separated.push_unseparated(") ORDER BY s.created_at ASC, s.id ASC");

    let rows = qb.build().fetch_all(pool).await?;
    rows.iter().map(subject_from_row).collect()
}

/// Apply a partial update
///
/// Only the fields present in the patch are written. Returns `false` when
/// no subject has this id.
pub async fn update_care_subject(
    pool: &SqlitePool,
    id: Uuid,
    patch: &CareSubjectPatch,
    updated_at: DateTime<Utc>,
) -> Result<bool> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE care_subjects SET updated_at = ");
    qb.push_bind(time::to_db_timestamp(&updated_at));

    if let Some(v) = &patch.first_name {
        push_set(&mut qb, "first_name", v.clone());
    }
    if let Some(v) = &patch.last_name {
        push_set(&mut qb, "last_name", v.clone());
    }
    if let Some(v) = patch.date_of_birth {
        push_set(&mut qb, "date_of_birth", v.map(|d| d.to_string()));
    }
    if let Some(v) = patch.gender {
        push_set(&mut qb, "gender", v.map(|g| g.as_str()));
    }
    if let Some(v) = &patch.phone_number {
        push_set(&mut qb, "phone_number", v.clone());
    }
    if let Some(v) = &patch.address {
        push_set(&mut qb, "address", v.clone());
    }
    if let Some(v) = &patch.health_status {
        push_set(&mut qb, "health_status", v.clone());
    }
    if let Some(v) = &patch.medical_history {
        push_set(&mut qb, "medical_history", v.clone());
    }
    if let Some(v) = &patch.conditions {
        push_set(&mut qb, "conditions", to_json_text(v)?);
    }
    if let Some(v) = &patch.medications {
        push_set(&mut qb, "medications", to_json_text(v)?);
    }
    if let Some(v) = &patch.allergies {
        push_set(&mut qb, "allergies", to_json_text(v)?);
    }
    if let Some(v) = &patch.sensitivities {
        push_set(&mut qb, "sensitivities", to_json_text(v)?);
    }
    if let Some(v) = patch.mobility_status {
        push_set(&mut qb, "mobility_status", v.map(|m| m.as_str()));
    }
    if let Some(v) = &patch.mobility_aids {
        push_set(&mut qb, "mobility_aids", to_json_text(v)?);
    }
    if let Some(v) = patch.vision_status {
        push_set(&mut qb, "vision_status", v.map(|s| s.as_str()));
    }
    if let Some(v) = patch.hearing_status {
        push_set(&mut qb, "hearing_status", v.map(|s| s.as_str()));
    }
    if let Some(v) = patch.speech_status {
        push_set(&mut qb, "speech_status", v.map(|s| s.as_str()));
    }
    if let Some(v) = &patch.emergency_contact {
        push_set(&mut qb, "emergency_contact", v.clone());
    }
    if let Some(v) = &patch.care_instructions {
        push_set(&mut qb, "care_instructions", v.clone());
    }
    if let Some(v) = &patch.robot_id {
        push_set(&mut qb, "robot_id", v.clone());
    }
    if let Some(v) = patch.is_active {
        push_set(&mut qb, "is_active", v);
    }

    qb.push(" WHERE id = ").push_bind(id.to_string());

    let result = qb.build().execute(pool).await.map_err(robot_conflict)?;
    Ok(result.rows_affected() == 1)
}

fn push_set<'a, T>(qb: &mut QueryBuilder<'a, Sqlite>, column: &str, value: T)
where
    T: 'a + sqlx::Encode<'a, Sqlite> + sqlx::Type<Sqlite> + Send,
{
    qb.push(", ").push(column).push(" = ").push_bind(value);
}

/// `robot_id` is the only unique profile column
fn robot_conflict(e: sqlx::Error) -> Error {
    if is_unique_violation(&e) {
        Error::InvalidInput("robot_id is already assigned to another care subject".to_string())
    } else {
        e.into()
    }
}

fn subject_from_row(row: &SqliteRow) -> Result<CareSubject> {
    let date_of_birth: Option<String> = row.try_get("date_of_birth")?;
    let date_of_birth = date_of_birth
        .map(|d| {
            d.parse::<NaiveDate>().map_err(|e| {
                Error::Internal(format!("Invalid date_of_birth '{}': {}", d, e))
            })
        })
        .transpose()?;

    Ok(CareSubject {
        id: uuid_col(row, "id")?,
        profile: CareSubjectProfile {
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            date_of_birth,
            gender: opt_tag_col(row, "gender")?,
            phone_number: row.try_get("phone_number")?,
            address: row.try_get("address")?,
            health_status: row.try_get("health_status")?,
            medical_history: row.try_get("medical_history")?,
            conditions: json_col(row, "conditions")?,
            medications: json_col(row, "medications")?,
            allergies: json_col(row, "allergies")?,
            sensitivities: json_col(row, "sensitivities")?,
            mobility_status: opt_tag_col(row, "mobility_status")?,
            mobility_aids: json_col(row, "mobility_aids")?,
            vision_status: opt_tag_col(row, "vision_status")?,
            hearing_status: opt_tag_col(row, "hearing_status")?,
            speech_status: opt_tag_col(row, "speech_status")?,
            emergency_contact: row.try_get("emergency_contact")?,
            care_instructions: row.try_get("care_instructions")?,
            robot_id: row.try_get("robot_id")?,
        },
        is_active: row.try_get("is_active")?,
        created_at: ts_col(row, "created_at")?,
        updated_at: ts_col(row, "updated_at")?,
    })
}
