//! Persistence for the care service
//!
//! One module per table. Functions here run SQL and decode rows; they do
//! not authorize. Authorization lives in `crate::services`.

pub mod alerts;
pub mod care_subjects;
pub mod caregivers;
pub mod interactions;
pub mod relations;

use chrono::{DateTime, Utc};
use gaia_common::{time, uuid_utils, Error, Result};
use serde::de::DeserializeOwned;
use sqlx::{sqlite::SqliteRow, Row};
use std::str::FromStr;
use uuid::Uuid;

/// Decode a UUID text column
pub(crate) fn uuid_col(row: &SqliteRow, column: &str) -> Result<Uuid> {
    let text: String = row.try_get(column)?;
    uuid_utils::parse_column(column, &text)
}

pub(crate) fn opt_uuid_col(row: &SqliteRow, column: &str) -> Result<Option<Uuid>> {
    let text: Option<String> = row.try_get(column)?;
    text.map(|t| uuid_utils::parse_column(column, &t)).transpose()
}

/// Decode a timestamp text column
pub(crate) fn ts_col(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>> {
    let text: String = row.try_get(column)?;
    time::parse_db_timestamp(&text)
}

pub(crate) fn opt_ts_col(row: &SqliteRow, column: &str) -> Result<Option<DateTime<Utc>>> {
    let text: Option<String> = row.try_get(column)?;
    text.map(|t| time::parse_db_timestamp(&t)).transpose()
}

/// Decode an enumerated text column
///
/// The schema CHECKs these columns, so an unknown tag means a corrupt row
/// rather than bad caller input.
pub(crate) fn tag_col<T>(row: &SqliteRow, column: &str) -> Result<T>
where
    T: FromStr<Err = Error>,
{
    let text: String = row.try_get(column)?;
    parse_tag(column, &text)
}

pub(crate) fn opt_tag_col<T>(row: &SqliteRow, column: &str) -> Result<Option<T>>
where
    T: FromStr<Err = Error>,
{
    let text: Option<String> = row.try_get(column)?;
    text.map(|t| parse_tag(column, &t)).transpose()
}

fn parse_tag<T>(column: &str, text: &str) -> Result<T>
where
    T: FromStr<Err = Error>,
{
    text.parse()
        .map_err(|e| Error::Internal(format!("Column '{}': {}", column, e)))
}

/// Decode a JSON text column
pub(crate) fn json_col<T: DeserializeOwned>(row: &SqliteRow, column: &str) -> Result<T> {
    let text: String = row.try_get(column)?;
    serde_json::from_str(&text)
        .map_err(|e| Error::Internal(format!("Invalid JSON in column '{}': {}", column, e)))
}

pub(crate) fn opt_json_col<T: DeserializeOwned>(
    row: &SqliteRow,
    column: &str,
) -> Result<Option<T>> {
    let text: Option<String> = row.try_get(column)?;
    text.map(|t| {
        serde_json::from_str(&t)
            .map_err(|e| Error::Internal(format!("Invalid JSON in column '{}': {}", column, e)))
    })
    .transpose()
}

/// Encode a value for a JSON text column
pub(crate) fn to_json_text<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| Error::Internal(format!("JSON encode failed: {}", e)))
}

/// True when the error is a UNIQUE constraint violation
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}
