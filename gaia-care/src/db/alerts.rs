//! Health alert persistence

use chrono::{DateTime, Utc};
use gaia_common::db::models::{AlertState, HealthAlert};
use gaia_common::{time, Result};
use sqlx::{sqlite::SqliteRow, Executor, Row, Sqlite, SqlitePool};
use uuid::Uuid;

use super::{opt_ts_col, opt_uuid_col, tag_col, ts_col, uuid_col};

/// Insert a new alert
pub async fn insert_alert<'e, E>(executor: E, alert: &HealthAlert) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO health_alerts (
            id, care_subject_id, alert_type, severity, title, description,
            state, resolved_by, resolved_at, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(alert.id.to_string())
    .bind(alert.care_subject_id.to_string())
    .bind(alert.alert_type.as_str())
    .bind(alert.severity.as_str())
    .bind(&alert.title)
    .bind(&alert.description)
    .bind(alert.state.as_str())
    .bind(alert.resolved_by.map(|id| id.to_string()))
    .bind(alert.resolved_at.as_ref().map(time::to_db_timestamp))
    .bind(time::to_db_timestamp(&alert.created_at))
    .execute(executor)
    .await?;

    Ok(())
}

/// Load alert by id
pub async fn get_alert(pool: &SqlitePool, id: Uuid) -> Result<Option<HealthAlert>> {
    let row = sqlx::query(
        r#"
        SELECT id, care_subject_id, alert_type, severity, title, description,
               state, resolved_by, resolved_at, created_at
        FROM health_alerts
        WHERE id = ?
        "#,
    )
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(alert_from_row).transpose()
}

/// Alerts of a subject, newest first, optionally restricted to one state
pub async fn list_alerts(
    pool: &SqlitePool,
    care_subject_id: Uuid,
    state: Option<AlertState>,
) -> Result<Vec<HealthAlert>> {
    let rows = sqlx::query(
        r#"
        SELECT id, care_subject_id, alert_type, severity, title, description,
               state, resolved_by, resolved_at, created_at
        FROM health_alerts
        WHERE care_subject_id = ? AND (? IS NULL OR state = ?)
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(care_subject_id.to_string())
    .bind(state.map(|s| s.as_str()))
    .bind(state.map(|s| s.as_str()))
    .fetch_all(pool)
    .await?;

    rows.iter().map(alert_from_row).collect()
}

/// Move an alert from Active to Resolved
///
/// The state test lives in the WHERE clause, so of several concurrent
/// callers exactly one sees a changed row. Returns `false` when the alert
/// was not Active.
pub async fn mark_resolved(
    pool: &SqlitePool,
    id: Uuid,
    resolved_by: Uuid,
    resolved_at: DateTime<Utc>,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE health_alerts
        SET state = 'resolved', resolved_by = ?, resolved_at = ?
        WHERE id = ? AND state = 'active'
        "#,
    )
    .bind(resolved_by.to_string())
    .bind(time::to_db_timestamp(&resolved_at))
    .bind(id.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Number of Active alerts for a subject
pub async fn count_active<'e, E>(executor: E, care_subject_id: Uuid) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM health_alerts WHERE care_subject_id = ? AND state = 'active'",
    )
    .bind(care_subject_id.to_string())
    .fetch_one(executor)
    .await?;

    Ok(count)
}

fn alert_from_row(row: &SqliteRow) -> Result<HealthAlert> {
    Ok(HealthAlert {
        id: uuid_col(row, "id")?,
        care_subject_id: uuid_col(row, "care_subject_id")?,
        alert_type: tag_col(row, "alert_type")?,
        severity: tag_col(row, "severity")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        state: tag_col(row, "state")?,
        resolved_by: opt_uuid_col(row, "resolved_by")?,
        resolved_at: opt_ts_col(row, "resolved_at")?,
        created_at: ts_col(row, "created_at")?,
    })
}
