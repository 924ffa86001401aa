//! Care-subject registry
//!
//! Registering a subject also links its creator as `admin`, in one
//! transaction, so no subject is ever without an administrator.

use gaia_common::db::models::{
    AccessRelation, CareSubject, CareSubjectPatch, CareSubjectProfile, PermissionLevel,
    ProfileEntry, RelationshipType,
};
use gaia_common::{time, uuid_utils, Error, Result};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use super::access;
use crate::db::{care_subjects, relations};

/// Register a care subject owned by `caller_id`
pub async fn create_care_subject(
    pool: &SqlitePool,
    caller_id: Uuid,
    profile: CareSubjectProfile,
) -> Result<CareSubject> {
    validate_profile(&profile)?;

    let now = time::now();
    let subject = CareSubject {
        id: uuid_utils::generate(),
        profile,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    let relation = AccessRelation {
        id: uuid_utils::generate(),
        caregiver_id: caller_id,
        care_subject_id: subject.id,
        relationship_type: RelationshipType::Caregiver,
        permission_level: PermissionLevel::Admin,
        is_active: true,
        created_at: now,
    };

    let mut tx = pool.begin().await?;
    care_subjects::insert_care_subject(&mut *tx, &subject).await?;
    relations::insert_relation(&mut *tx, &relation).await?;
    tx.commit().await?;

    info!(care_subject_id = %subject.id, %caller_id, "Registered care subject");
    Ok(subject)
}

/// All subjects visible to the caller
///
/// Visibility comes from the access graph; subjects without an active
/// relation are omitted.
pub async fn list_care_subjects(pool: &SqlitePool, caller_id: Uuid) -> Result<Vec<CareSubject>> {
    let ids = access::list_accessible_subjects(pool, caller_id).await?;
    care_subjects::get_care_subjects_by_ids(pool, &ids).await
}

/// One subject; requires `view`
pub async fn get_care_subject(
    pool: &SqlitePool,
    caller_id: Uuid,
    care_subject_id: Uuid,
) -> Result<CareSubject> {
    access::authorize(pool, caller_id, care_subject_id, PermissionLevel::View).await?;
    care_subjects::get_care_subject(pool, care_subject_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Care subject {}", care_subject_id)))
}

/// Apply a partial profile update; requires `edit`
///
/// Setting `is_active` to false soft-deactivates the subject.
pub async fn update_care_subject(
    pool: &SqlitePool,
    caller_id: Uuid,
    care_subject_id: Uuid,
    patch: CareSubjectPatch,
) -> Result<CareSubject> {
    access::authorize(pool, caller_id, care_subject_id, PermissionLevel::Edit).await?;
    validate_patch(&patch)?;

    if !care_subjects::update_care_subject(pool, care_subject_id, &patch, time::now()).await? {
        return Err(Error::NotFound(format!("Care subject {}", care_subject_id)));
    }
    info!(%care_subject_id, %caller_id, "Updated care subject");

    care_subjects::get_care_subject(pool, care_subject_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Care subject {}", care_subject_id)))
}

fn validate_profile(profile: &CareSubjectProfile) -> Result<()> {
    require_name("first_name", &profile.first_name)?;
    require_name("last_name", &profile.last_name)?;
    validate_conditions(&profile.conditions)?;
    validate_medications(&profile.medications)?;
    validate_robot_id(profile.robot_id.as_deref())
}

fn validate_patch(patch: &CareSubjectPatch) -> Result<()> {
    if let Some(name) = &patch.first_name {
        require_name("first_name", name)?;
    }
    if let Some(name) = &patch.last_name {
        require_name("last_name", name)?;
    }
    if let Some(conditions) = &patch.conditions {
        validate_conditions(conditions)?;
    }
    if let Some(medications) = &patch.medications {
        validate_medications(medications)?;
    }
    if let Some(robot_id) = &patch.robot_id {
        validate_robot_id(robot_id.as_deref())?;
    }
    Ok(())
}

fn require_name(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(())
}

fn validate_conditions(conditions: &[ProfileEntry]) -> Result<()> {
    for condition in conditions {
        require_name("condition name", &condition.name)?;
    }
    Ok(())
}

/// Medications need a name, a dose and a schedule
fn validate_medications(medications: &[ProfileEntry]) -> Result<()> {
    for medication in medications {
        require_name("medication name", &medication.name)?;
        let has = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        if !has(&medication.dose) || !has(&medication.schedule) {
            return Err(Error::InvalidInput(format!(
                "Medication '{}' requires dose and schedule",
                medication.name
            )));
        }
    }
    Ok(())
}

fn validate_robot_id(robot_id: Option<&str>) -> Result<()> {
    match robot_id {
        Some(id) if id.trim().is_empty() => {
            Err(Error::InvalidInput("robot_id must not be blank".to_string()))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support;

    fn medication(name: &str, dose: Option<&str>, schedule: Option<&str>) -> ProfileEntry {
        ProfileEntry {
            name: name.to_string(),
            dose: dose.map(str::to_string),
            schedule: schedule.map(str::to_string),
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_creator_becomes_admin() {
        let pool = test_support::pool().await;
        let owner = test_support::caregiver(&pool, "Owner").await;
        let subject = test_support::subject(&pool, &owner).await;

        let level = access::authorize(&pool, owner.id, subject.id, PermissionLevel::Admin)
            .await
            .unwrap();
        assert_eq!(level, PermissionLevel::Admin);
        assert!(subject.is_active);
    }

    #[tokio::test]
    async fn test_full_profile_round_trips() {
        let pool = test_support::pool().await;
        let owner = test_support::caregiver(&pool, "Owner").await;

        let mut profile = test_support::profile("Elena", "Ruiz");
        profile.date_of_birth = chrono::NaiveDate::from_ymd_opt(1941, 5, 2);
        profile.medications = vec![medication("Metformin", Some("500mg"), Some("twice daily"))];
        profile.allergies = vec!["penicillin".to_string()];
        profile.speech_status = Some(gaia_common::db::models::SpeechStatus::NonVerbal);
        profile.robot_id = Some("robot-17".to_string());

        let created = create_care_subject(&pool, owner.id, profile).await.unwrap();
        let fetched = get_care_subject(&pool, owner.id, created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_medication_requires_dose_and_schedule() {
        let pool = test_support::pool().await;
        let owner = test_support::caregiver(&pool, "Owner").await;

        let mut profile = test_support::profile("Elena", "Ruiz");
        profile.medications = vec![medication("Aspirin", Some("100mg"), None)];

        let err = create_care_subject(&pool, owner.id, profile).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(list_care_subjects(&pool, owner.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_robot_id_rejected() {
        let pool = test_support::pool().await;
        let owner = test_support::caregiver(&pool, "Owner").await;

        let mut first = test_support::profile("Ana", "Gil");
        first.robot_id = Some("robot-1".to_string());
        create_care_subject(&pool, owner.id, first).await.unwrap();

        let mut second = test_support::profile("Luis", "Gil");
        second.robot_id = Some("robot-1".to_string());
        let err = create_care_subject(&pool, owner.id, second).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        // The failed registration left no orphan relation behind
        assert_eq!(list_care_subjects(&pool, owner.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unrelated_caregiver_cannot_update() {
        let pool = test_support::pool().await;
        let a = test_support::caregiver(&pool, "A").await;
        let b = test_support::caregiver(&pool, "B").await;
        let subject = test_support::subject(&pool, &a).await;

        let patch = CareSubjectPatch {
            health_status: Some(Some("stable".to_string())),
            ..Default::default()
        };
        let err = update_care_subject(&pool, b.id, subject.id, patch).await.unwrap_err();
        assert!(matches!(err, Error::Denied { .. }));
    }

    #[tokio::test]
    async fn test_authorization_precedes_validation() {
        let pool = test_support::pool().await;
        let a = test_support::caregiver(&pool, "A").await;
        let b = test_support::caregiver(&pool, "B").await;
        let subject = test_support::subject(&pool, &a).await;

        let patch = CareSubjectPatch {
            first_name: Some("   ".to_string()),
            ..Default::default()
        };
        let err = update_care_subject(&pool, b.id, subject.id, patch).await.unwrap_err();
        assert!(matches!(err, Error::Denied { .. }));
    }

    #[tokio::test]
    async fn test_patch_updates_only_given_fields() {
        let pool = test_support::pool().await;
        let owner = test_support::caregiver(&pool, "Owner").await;

        let mut profile = test_support::profile("Elena", "Ruiz");
        profile.address = Some("Calle Mayor 1".to_string());
        profile.phone_number = Some("555-0100".to_string());
        let subject = create_care_subject(&pool, owner.id, profile).await.unwrap();

        let patch: CareSubjectPatch =
            serde_json::from_str(r#"{"address": null, "is_active": false, "allergies": ["latex"]}"#)
                .unwrap();
        let updated = update_care_subject(&pool, owner.id, subject.id, patch)
            .await
            .unwrap();

        assert_eq!(updated.profile.address, None);
        assert_eq!(updated.profile.phone_number.as_deref(), Some("555-0100"));
        assert_eq!(updated.profile.allergies, vec!["latex".to_string()]);
        assert!(!updated.is_active);
        assert!(updated.updated_at >= subject.updated_at);
    }

    #[tokio::test]
    async fn test_deactivated_subject_still_listed() {
        let pool = test_support::pool().await;
        let owner = test_support::caregiver(&pool, "Owner").await;
        let subject = test_support::subject(&pool, &owner).await;

        let patch = CareSubjectPatch {
            is_active: Some(false),
            ..Default::default()
        };
        update_care_subject(&pool, owner.id, subject.id, patch).await.unwrap();

        let listed = list_care_subjects(&pool, owner.id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(!listed[0].is_active);
    }

    #[tokio::test]
    async fn test_listing_follows_active_relations() {
        let pool = test_support::pool().await;
        let owner = test_support::caregiver(&pool, "Owner").await;
        let nurse = test_support::caregiver(&pool, "Nurse").await;
        let first = create_care_subject(&pool, owner.id, test_support::profile("Ana", "Ruiz"))
            .await
            .unwrap();
        let second = create_care_subject(&pool, owner.id, test_support::profile("Luis", "Mora"))
            .await
            .unwrap();

        access::grant_relation(
            &pool,
            nurse.id,
            second.id,
            RelationshipType::MedicalProfessional,
            PermissionLevel::View,
        )
        .await
        .unwrap();
        // A lapsed relation grants nothing
        let lapsed = AccessRelation {
            id: uuid_utils::generate(),
            caregiver_id: nurse.id,
            care_subject_id: first.id,
            relationship_type: RelationshipType::MedicalProfessional,
            permission_level: PermissionLevel::Admin,
            is_active: false,
            created_at: time::now(),
        };
        relations::insert_relation(&pool, &lapsed).await.unwrap();

        let owned = list_care_subjects(&pool, owner.id).await.unwrap();
        assert_eq!(owned.len(), 2);
        assert!(owned.iter().any(|s| s.id == first.id));
        assert!(owned.iter().any(|s| s.id == second.id));

        let listed = list_care_subjects(&pool, nurse.id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, second.id);
    }
}
