//! Alert lifecycle manager
//!
//! Alerts move one way, Active to Resolved. Resolution is a conditional
//! update keyed on the Active state, so concurrent resolvers cannot both
//! win and the first resolver's identity is kept.

use gaia_common::db::models::{
    AlertLevel, AlertState, AlertType, HealthAlert, Interaction, NewHealthAlert, PermissionLevel,
    Severity,
};
use gaia_common::db::AlertThresholds;
use gaia_common::{time, uuid_utils, Error, Result};
use sqlx::SqlitePool;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::access;
use crate::db::alerts;

/// Raise an alert on a subject; requires `edit`
pub async fn create_alert(
    pool: &SqlitePool,
    caller_id: Uuid,
    care_subject_id: Uuid,
    new: NewHealthAlert,
) -> Result<HealthAlert> {
    access::authorize(pool, caller_id, care_subject_id, PermissionLevel::Edit).await?;

    let title = new.title.trim();
    let description = new.description.trim();
    if title.is_empty() || description.is_empty() {
        return Err(Error::InvalidInput(
            "Alert title and description must not be empty".to_string(),
        ));
    }

    let alert = HealthAlert {
        id: uuid_utils::generate(),
        care_subject_id,
        alert_type: new.alert_type,
        severity: new.severity,
        title: title.to_string(),
        description: description.to_string(),
        state: AlertState::Active,
        resolved_by: None,
        resolved_at: None,
        created_at: time::now(),
    };

    alerts::insert_alert(pool, &alert).await?;
    info!(
        alert_id = %alert.id,
        %care_subject_id,
        alert_type = %alert.alert_type,
        severity = %alert.severity,
        "Created health alert"
    );

    Ok(alert)
}

/// Alerts of a subject, newest first; requires `view`
///
/// `resolved = Some(false)` lists only Active alerts, `Some(true)` only
/// Resolved ones, `None` both.
pub async fn list_alerts(
    pool: &SqlitePool,
    caller_id: Uuid,
    care_subject_id: Uuid,
    resolved: Option<bool>,
) -> Result<Vec<HealthAlert>> {
    access::authorize(pool, caller_id, care_subject_id, PermissionLevel::View).await?;

    let state = resolved.map(|r| if r { AlertState::Resolved } else { AlertState::Active });
    alerts::list_alerts(pool, care_subject_id, state).await
}

/// Resolve an alert; requires `edit` on the alert's subject
///
/// Returns the resolved alert, `AlreadyResolved` if any resolver got there
/// first, or `NotFound` for an unknown id.
pub async fn resolve_alert(
    pool: &SqlitePool,
    caller_id: Uuid,
    alert_id: Uuid,
) -> Result<HealthAlert> {
    // The alert's subject decides the check, so the lookup comes first:
    // an unknown id is NotFound for every caller, authorized or not.
    let alert = alerts::get_alert(pool, alert_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Alert {}", alert_id)))?;

    access::authorize(pool, caller_id, alert.care_subject_id, PermissionLevel::Edit).await?;

    if !alerts::mark_resolved(pool, alert_id, caller_id, time::now()).await? {
        warn!(%alert_id, %caller_id, "Alert already resolved");
        return Err(Error::AlreadyResolved(alert_id));
    }
    info!(%alert_id, %caller_id, "Resolved health alert");

    alerts::get_alert(pool, alert_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Alert {}", alert_id)))
}

/// Alerts suggested by one interaction's signals
///
/// Pure; the caller decides whether to raise them.
pub fn evaluate_interaction(
    interaction: &Interaction,
    thresholds: &AlertThresholds,
) -> Vec<NewHealthAlert> {
    let mut drafts = Vec::new();

    if let Some(mood) = interaction.mood_score {
        if mood <= thresholds.mood {
            drafts.push(NewHealthAlert {
                alert_type: AlertType::Mood,
                severity: Severity::High,
                title: "Low mood reported".to_string(),
                description: format!(
                    "Mood score {}/10 recorded during a {} session",
                    mood, interaction.kind
                ),
            });
        }
    }

    if let Some(sentiment) = interaction.sentiment_score {
        if sentiment <= thresholds.sentiment {
            drafts.push(NewHealthAlert {
                alert_type: AlertType::Mood,
                severity: Severity::Medium,
                title: "Negative sentiment detected".to_string(),
                description: format!(
                    "Sentiment score {:.2} recorded during a {} session",
                    sentiment, interaction.kind
                ),
            });
        }
    }

    match interaction.alert_level {
        AlertLevel::Urgent => drafts.push(NewHealthAlert {
            alert_type: AlertType::Health,
            severity: Severity::Critical,
            title: "Urgent interaction flagged".to_string(),
            description: flagged_description(interaction, "urgent"),
        }),
        AlertLevel::Attention => drafts.push(NewHealthAlert {
            alert_type: AlertType::Health,
            severity: Severity::Medium,
            title: "Interaction needs attention".to_string(),
            description: flagged_description(interaction, "needing attention"),
        }),
        AlertLevel::Normal => {}
    }

    if let Some(cognitive) = interaction.cognitive_score {
        if cognitive < thresholds.cognitive {
            drafts.push(NewHealthAlert {
                alert_type: AlertType::Cognitive,
                severity: Severity::Medium,
                title: "Low cognitive score".to_string(),
                description: format!(
                    "Cognitive score {:.2} is below {:.2}",
                    cognitive, thresholds.cognitive
                ),
            });
        }
    }

    drafts
}

/// Evaluate a freshly recorded interaction and raise what it suggests
///
/// Best effort: the interaction is already stored, so a draft that cannot be
/// raised is logged and skipped. Returns the alerts actually raised.
pub async fn raise_for_interaction(
    pool: &SqlitePool,
    caller_id: Uuid,
    interaction: &Interaction,
    thresholds: &AlertThresholds,
) -> Vec<HealthAlert> {
    let mut raised = Vec::new();
    for draft in evaluate_interaction(interaction, thresholds) {
        let alert_type = draft.alert_type;
        match create_alert(pool, caller_id, interaction.care_subject_id, draft).await {
            Ok(alert) => raised.push(alert),
            Err(e) => error!(
                interaction_id = %interaction.id,
                %alert_type,
                "Failed to raise alert: {}",
                e
            ),
        }
    }
    raised
}

fn flagged_description(interaction: &Interaction, reason: &str) -> String {
    match interaction.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        Some(notes) => format!("A {} session was flagged as {}: {}", interaction.kind, reason, notes),
        None => format!("A {} session was flagged as {}", interaction.kind, reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{ledger, test_support};
    use gaia_common::db::models::{InteractionKind, NewInteraction, RelationshipType};

    fn interaction() -> Interaction {
        Interaction {
            id: Uuid::nil(),
            care_subject_id: Uuid::nil(),
            kind: InteractionKind::HealthCheck,
            transcript: None,
            audio_url: None,
            sentiment_score: None,
            sentiment_label: None,
            mood_score: None,
            cognitive_score: None,
            health_indicators: None,
            alert_level: AlertLevel::Normal,
            robot_response: None,
            notes: None,
            duration_seconds: 60,
            created_at: time::now(),
        }
    }

    fn new_alert(title: &str) -> NewHealthAlert {
        NewHealthAlert {
            alert_type: AlertType::Safety,
            severity: Severity::High,
            title: title.to_string(),
            description: "Fall detected in the kitchen".to_string(),
        }
    }

    #[test]
    fn test_quiet_interaction_raises_nothing() {
        let mut i = interaction();
        i.mood_score = Some(7);
        i.sentiment_score = Some(0.4);
        i.cognitive_score = Some(0.9);
        assert!(evaluate_interaction(&i, &AlertThresholds::default()).is_empty());
    }

    #[test]
    fn test_each_signal_maps_to_its_alert() {
        let thresholds = AlertThresholds::default();

        let mut i = interaction();
        i.mood_score = Some(3);
        let drafts = evaluate_interaction(&i, &thresholds);
        assert_eq!(drafts.len(), 1);
        assert_eq!((drafts[0].alert_type, drafts[0].severity), (AlertType::Mood, Severity::High));

        let mut i = interaction();
        i.sentiment_score = Some(-0.6);
        let drafts = evaluate_interaction(&i, &thresholds);
        assert_eq!((drafts[0].alert_type, drafts[0].severity), (AlertType::Mood, Severity::Medium));

        let mut i = interaction();
        i.alert_level = AlertLevel::Urgent;
        let drafts = evaluate_interaction(&i, &thresholds);
        assert_eq!(
            (drafts[0].alert_type, drafts[0].severity),
            (AlertType::Health, Severity::Critical)
        );

        let mut i = interaction();
        i.cognitive_score = Some(0.39);
        let drafts = evaluate_interaction(&i, &thresholds);
        assert_eq!(
            (drafts[0].alert_type, drafts[0].severity),
            (AlertType::Cognitive, Severity::Medium)
        );

        // Exactly at the cognitive threshold is not below it
        let mut i = interaction();
        i.cognitive_score = Some(0.4);
        assert!(evaluate_interaction(&i, &thresholds).is_empty());
    }

    #[tokio::test]
    async fn test_resolve_twice_is_already_resolved() {
        let pool = test_support::pool().await;
        let owner = test_support::caregiver(&pool, "Owner").await;
        let subject = test_support::subject(&pool, &owner).await;

        let alert = create_alert(&pool, owner.id, subject.id, new_alert("Fall"))
            .await
            .unwrap();
        assert_eq!(alert.state, AlertState::Active);

        let resolved = resolve_alert(&pool, owner.id, alert.id).await.unwrap();
        assert_eq!(resolved.state, AlertState::Resolved);
        assert_eq!(resolved.resolved_by, Some(owner.id));
        assert!(resolved.resolved_at.is_some());

        let err = resolve_alert(&pool, owner.id, alert.id).await.unwrap_err();
        assert!(matches!(err, Error::AlreadyResolved(id) if id == alert.id));

        let active = list_alerts(&pool, owner.id, subject.id, Some(false)).await.unwrap();
        assert!(active.is_empty());
        let history = list_alerts(&pool, owner.id, subject.id, Some(true)).await.unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn test_resolve_unknown_alert_not_found() {
        let pool = test_support::pool().await;
        let owner = test_support::caregiver(&pool, "Owner").await;

        let err = resolve_alert(&pool, owner.id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_stranger_resolve_unknown_vs_existing() {
        let pool = test_support::pool().await;
        let owner = test_support::caregiver(&pool, "Owner").await;
        let stranger = test_support::caregiver(&pool, "Stranger").await;
        let subject = test_support::subject(&pool, &owner).await;
        let alert = create_alert(&pool, owner.id, subject.id, new_alert("Fall"))
            .await
            .unwrap();

        let err = resolve_alert(&pool, stranger.id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        let err = resolve_alert(&pool, stranger.id, alert.id).await.unwrap_err();
        assert!(matches!(err, Error::Denied { .. }));

        let active = list_alerts(&pool, owner.id, subject.id, Some(false)).await.unwrap();
        assert_eq!(active.len(), 1);
    }

    #[tokio::test]
    async fn test_viewer_cannot_resolve() {
        let pool = test_support::pool().await;
        let owner = test_support::caregiver(&pool, "Owner").await;
        let viewer = test_support::caregiver(&pool, "Viewer").await;
        let subject = test_support::subject(&pool, &owner).await;
        access::grant_relation(
            &pool,
            viewer.id,
            subject.id,
            RelationshipType::Child,
            PermissionLevel::View,
        )
        .await
        .unwrap();

        let alert = create_alert(&pool, owner.id, subject.id, new_alert("Fall"))
            .await
            .unwrap();
        let err = resolve_alert(&pool, viewer.id, alert.id).await.unwrap_err();
        assert!(matches!(err, Error::Denied { .. }));

        // Viewer still sees it
        assert_eq!(list_alerts(&pool, viewer.id, subject.id, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_blank_title_rejected() {
        let pool = test_support::pool().await;
        let owner = test_support::caregiver(&pool, "Owner").await;
        let subject = test_support::subject(&pool, &owner).await;

        let err = create_alert(&pool, owner.id, subject.id, new_alert("  "))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_recorded_interaction_raises_alerts() {
        let pool = test_support::pool().await;
        let owner = test_support::caregiver(&pool, "Owner").await;
        let subject = test_support::subject(&pool, &owner).await;

        let mut new = NewInteraction::new(InteractionKind::Conversation, 120);
        new.mood_score = Some(2);
        new.alert_level = Some(AlertLevel::Attention);
        let recorded = ledger::record_interaction(&pool, owner.id, subject.id, new)
            .await
            .unwrap();

        let raised =
            raise_for_interaction(&pool, owner.id, &recorded, &AlertThresholds::default()).await;
        assert_eq!(raised.len(), 2);

        let listed = list_alerts(&pool, owner.id, subject.id, Some(false)).await.unwrap();
        assert_eq!(listed.len(), 2);
    }

    #[tokio::test]
    async fn test_raise_failure_is_skipped() {
        let pool = test_support::pool().await;
        let owner = test_support::caregiver(&pool, "Owner").await;
        let subject = test_support::subject(&pool, &owner).await;

        let mut new = NewInteraction::new(InteractionKind::Conversation, 60);
        new.mood_score = Some(1);
        let recorded = ledger::record_interaction(&pool, owner.id, subject.id, new)
            .await
            .unwrap();

        sqlx::query(
            "CREATE TRIGGER block_alerts BEFORE INSERT ON health_alerts \
             BEGIN SELECT RAISE(ABORT, 'alerts unavailable'); END",
        )
        .execute(&pool)
        .await
        .unwrap();

        let raised =
            raise_for_interaction(&pool, owner.id, &recorded, &AlertThresholds::default()).await;
        assert!(raised.is_empty());

        let listed = ledger::list_interactions(&pool, owner.id, subject.id, 10)
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
    }
}
