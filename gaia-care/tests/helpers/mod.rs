//! Shared fixtures for gaia-care integration tests
#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use gaia_care::services::{identity, registry};
use gaia_common::db::models::{
    CareSubject, CareSubjectProfile, Caregiver, CaregiverRole, NewCaregiver,
};
use gaia_common::db::{init_database, init_memory_database};
use gaia_common::time;
use sqlx::SqlitePool;
use tempfile::TempDir;

/// Private in-memory database
pub async fn memory_pool() -> SqlitePool {
    init_memory_database().await.unwrap()
}

/// File-backed WAL database; keep the TempDir alive for the test's duration
pub async fn file_pool() -> (TempDir, SqlitePool) {
    let temp_dir = TempDir::new().unwrap();
    let pool = init_database(&temp_dir.path().join("gaia.db")).await.unwrap();
    (temp_dir, pool)
}

pub async fn caregiver(pool: &SqlitePool, name: &str) -> Caregiver {
    identity::register_caregiver(
        pool,
        NewCaregiver {
            email: format!("{}@example.org", name.to_lowercase()),
            display_name: name.to_string(),
            role: CaregiverRole::Family,
            phone_number: None,
        },
    )
    .await
    .unwrap()
}

/// Subject registered by `owner`, who becomes its admin
pub async fn subject(pool: &SqlitePool, owner: &Caregiver) -> CareSubject {
    registry::create_care_subject(
        pool,
        owner.id,
        CareSubjectProfile {
            first_name: "Rosa".to_string(),
            last_name: "Navarro".to_string(),
            ..Default::default()
        },
    )
    .await
    .unwrap()
}

/// Noon UTC, `days` calendar days before today
pub fn days_ago_at_noon(days: i64) -> DateTime<Utc> {
    let today = time::start_of_day(time::now().date_naive());
    today - Duration::days(days) + Duration::hours(12)
}
