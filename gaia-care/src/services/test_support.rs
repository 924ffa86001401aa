//! Fixtures shared by the service unit tests

use gaia_common::db::init_memory_database;
use gaia_common::db::models::{
    CareSubject, CareSubjectProfile, Caregiver, CaregiverRole, NewCaregiver,
};
use sqlx::SqlitePool;

use super::{identity, registry};

pub async fn pool() -> SqlitePool {
    init_memory_database().await.unwrap()
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

pub fn profile(first: &str, last: &str) -> CareSubjectProfile {
    CareSubjectProfile {
        first_name: first.to_string(),
        last_name: last.to_string(),
        ..Default::default()
    }
}

/// Subject owned (admin) by `owner`
pub async fn subject(pool: &SqlitePool, owner: &Caregiver) -> CareSubject {
    registry::create_care_subject(pool, owner.id, profile("Maria", "Lopez"))
        .await
        .unwrap()
}
