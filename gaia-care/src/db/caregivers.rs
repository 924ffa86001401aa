//! Caregiver persistence (identity store)

use gaia_common::db::models::Caregiver;
use gaia_common::{time, Error, Result};
use sqlx::{sqlite::SqliteRow, SqlitePool};
use uuid::Uuid;

use super::{is_unique_violation, tag_col, ts_col, uuid_col};

/// Insert a new caregiver
///
/// A second account with the same email is rejected as invalid input.
pub async fn insert_caregiver(pool: &SqlitePool, caregiver: &Caregiver) -> Result<()> {
    let result = sqlx::query(
        r#"
        INSERT INTO caregivers (id, email, display_name, role, phone_number, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(caregiver.id.to_string())
    .bind(&caregiver.email)
    .bind(&caregiver.display_name)
    .bind(caregiver.role.as_str())
    .bind(&caregiver.phone_number)
    .bind(time::to_db_timestamp(&caregiver.created_at))
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(e) if is_unique_violation(&e) => Err(Error::InvalidInput(format!(
            "A caregiver with email '{}' is already registered",
            caregiver.email
        ))),
        Err(e) => Err(e.into()),
    }
}

/// Load caregiver by id
pub async fn get_caregiver(pool: &SqlitePool, id: Uuid) -> Result<Option<Caregiver>> {
    let row = sqlx::query(
        r#"
        SELECT id, email, display_name, role, phone_number, created_at
        FROM caregivers
        WHERE id = ?
        "#,
    )
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(caregiver_from_row).transpose()
}

fn caregiver_from_row(row: &SqliteRow) -> Result<Caregiver> {
    use sqlx::Row;

    Ok(Caregiver {
        id: uuid_col(row, "id")?,
        email: row.try_get("email")?,
        display_name: row.try_get("display_name")?,
        role: tag_col(row, "role")?,
        phone_number: row.try_get("phone_number")?,
        created_at: ts_col(row, "created_at")?,
    })
}
