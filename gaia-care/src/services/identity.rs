//! Identity store: caregiver accounts
//!
//! Credentials are issued and checked by the gateway in front of this
//! service; only identity and role live here.

use gaia_common::db::models::{Caregiver, NewCaregiver};
use gaia_common::{time, uuid_utils, Error, Result};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::db::caregivers;

/// Register a caregiver account
pub async fn register_caregiver(pool: &SqlitePool, new: NewCaregiver) -> Result<Caregiver> {
    let email = new.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(Error::InvalidInput(format!("Invalid email address '{}'", new.email)));
    }

    let display_name = new.display_name.trim().to_string();
    if display_name.is_empty() {
        return Err(Error::InvalidInput("display_name must not be empty".to_string()));
    }

    let caregiver = Caregiver {
        id: uuid_utils::generate(),
        email,
        display_name,
        role: new.role,
        phone_number: new.phone_number,
        created_at: time::now(),
    };

    caregivers::insert_caregiver(pool, &caregiver).await?;
    info!(caregiver_id = %caregiver.id, role = %caregiver.role, "Registered caregiver");

    Ok(caregiver)
}

/// Load a caregiver, `NotFound` if the id is unknown
pub async fn get_caregiver(pool: &SqlitePool, id: Uuid) -> Result<Caregiver> {
    caregivers::get_caregiver(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Caregiver {}", id)))
}
