//! End-to-end scenarios across the service layer
//!
//! Covers authorization, the interaction ledger, aggregation and the
//! alert lifecycle against an in-memory database.

mod helpers;

use gaia_care::services::{access, aggregation, alerts, ledger, registry};
use gaia_common::db::models::{
    AlertState, AlertType, CareSubjectPatch, InteractionKind, NewHealthAlert, NewInteraction,
    PermissionLevel, RelationshipType, Severity,
};
use gaia_common::Error;

fn interaction_on(days_ago: i64, sentiment: f64) -> NewInteraction {
    let mut new = NewInteraction::new(InteractionKind::Conversation, 600);
    new.sentiment_score = Some(sentiment);
    new.recorded_at = Some(helpers::days_ago_at_noon(days_ago));
    new
}

#[tokio::test]
async fn test_unrelated_caregiver_is_denied_everywhere() {
    let pool = helpers::memory_pool().await;
    let a = helpers::caregiver(&pool, "A").await;
    let b = helpers::caregiver(&pool, "B").await;
    let s = helpers::subject(&pool, &a).await;

    let denied = |r: Result<_, Error>| matches!(r, Err(Error::Denied { .. }));

    assert!(denied(access::authorize(&pool, b.id, s.id, PermissionLevel::View).await.map(|_| ())));
    assert!(denied(registry::get_care_subject(&pool, b.id, s.id).await.map(|_| ())));
    assert!(denied(
        registry::update_care_subject(&pool, b.id, s.id, CareSubjectPatch::default())
            .await
            .map(|_| ())
    ));
    assert!(denied(ledger::list_interactions(&pool, b.id, s.id, 10).await.map(|_| ())));
    assert!(denied(aggregation::compute_stats(&pool, b.id, s.id).await.map(|_| ())));
    assert!(denied(aggregation::compute_sentiment_series(&pool, b.id, s.id, 7).await.map(|_| ())));
    assert!(denied(alerts::list_alerts(&pool, b.id, s.id, None).await.map(|_| ())));

    // Listing silently omits the subject instead of failing
    assert!(registry::list_care_subjects(&pool, b.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_stats_for_subject_without_interactions() {
    let pool = helpers::memory_pool().await;
    let owner = helpers::caregiver(&pool, "Owner").await;
    let s = helpers::subject(&pool, &owner).await;

    let stats = aggregation::compute_stats(&pool, owner.id, s.id).await.unwrap();
    assert_eq!(stats.total_interactions, 0);
    assert_eq!(stats.avg_mood_score, 0.0);
    assert_eq!(stats.avg_sentiment, 0.0);
    assert_eq!(stats.total_duration_seconds, 0);
    assert_eq!(stats.active_alerts_count, 0);
}

#[tokio::test]
async fn test_stats_average_only_interactions_carrying_the_signal() {
    let pool = helpers::memory_pool().await;
    let owner = helpers::caregiver(&pool, "Owner").await;
    let s = helpers::subject(&pool, &owner).await;

    let mut with_mood = NewInteraction::new(InteractionKind::HealthCheck, 100);
    with_mood.mood_score = Some(6);
    with_mood.sentiment_score = Some(0.5);
    let mut mood_only = NewInteraction::new(InteractionKind::Game, 200);
    mood_only.mood_score = Some(8);
    let bare = NewInteraction::new(InteractionKind::Reminder, 30);

    for new in [with_mood, mood_only, bare] {
        ledger::record_interaction(&pool, owner.id, s.id, new).await.unwrap();
    }

    let alert = alerts::create_alert(
        &pool,
        owner.id,
        s.id,
        NewHealthAlert {
            alert_type: AlertType::Safety,
            severity: Severity::Low,
            title: "Door left open".to_string(),
            description: "Front door open for 20 minutes".to_string(),
        },
    )
    .await
    .unwrap();

    let stats = aggregation::compute_stats(&pool, owner.id, s.id).await.unwrap();
    assert_eq!(stats.total_interactions, 3);
    assert_eq!(stats.avg_mood_score, 7.0);
    assert_eq!(stats.avg_sentiment, 0.5);
    assert_eq!(stats.total_duration_seconds, 330);
    assert_eq!(stats.active_alerts_count, 1);

    alerts::resolve_alert(&pool, owner.id, alert.id).await.unwrap();
    let stats = aggregation::compute_stats(&pool, owner.id, s.id).await.unwrap();
    assert_eq!(stats.active_alerts_count, 0);
}

#[tokio::test]
async fn test_sentiment_series_skips_empty_days() {
    let pool = helpers::memory_pool().await;
    let owner = helpers::caregiver(&pool, "Owner").await;
    let s = helpers::subject(&pool, &owner).await;

    // D3 recorded first to show output ordering does not follow insertion
    ledger::record_interaction(&pool, owner.id, s.id, interaction_on(3, -0.2)).await.unwrap();
    ledger::record_interaction(&pool, owner.id, s.id, interaction_on(5, 0.5)).await.unwrap();
    // Outside the window
    ledger::record_interaction(&pool, owner.id, s.id, interaction_on(20, 0.9)).await.unwrap();

    let series = aggregation::compute_sentiment_series(&pool, owner.id, s.id, 7)
        .await
        .unwrap();

    assert_eq!(series.len(), 2);
    assert_eq!(series[0].date, helpers::days_ago_at_noon(5).date_naive());
    assert_eq!(series[0].avg_sentiment, 0.5);
    assert_eq!(series[1].date, helpers::days_ago_at_noon(3).date_naive());
    assert_eq!(series[1].avg_sentiment, -0.2);
}

#[tokio::test]
async fn test_sentiment_window_bounds() {
    let pool = helpers::memory_pool().await;
    let owner = helpers::caregiver(&pool, "Owner").await;
    let s = helpers::subject(&pool, &owner).await;

    for days in [0, aggregation::MAX_WINDOW_DAYS + 1] {
        let err = aggregation::compute_sentiment_series(&pool, owner.id, s.id, days)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
    assert!(aggregation::compute_sentiment_series(&pool, owner.id, s.id, 1).await.is_ok());
}

#[tokio::test]
async fn test_alert_resolves_once_and_leaves_active_listing() {
    let pool = helpers::memory_pool().await;
    let owner = helpers::caregiver(&pool, "Owner").await;
    let nurse = helpers::caregiver(&pool, "Nurse").await;
    let s = helpers::subject(&pool, &owner).await;
    access::grant_access(
        &pool,
        owner.id,
        nurse.id,
        s.id,
        RelationshipType::MedicalProfessional,
        PermissionLevel::Edit,
    )
    .await
    .unwrap();

    let alert = alerts::create_alert(
        &pool,
        owner.id,
        s.id,
        NewHealthAlert {
            alert_type: AlertType::Health,
            severity: Severity::High,
            title: "Missed medication".to_string(),
            description: "Evening dose not confirmed".to_string(),
        },
    )
    .await
    .unwrap();

    let resolved = alerts::resolve_alert(&pool, nurse.id, alert.id).await.unwrap();
    assert_eq!(resolved.state, AlertState::Resolved);
    assert_eq!(resolved.resolved_by, Some(nurse.id));

    let err = alerts::resolve_alert(&pool, owner.id, alert.id).await.unwrap_err();
    assert!(matches!(err, Error::AlreadyResolved(_)));

    // First resolver is kept
    let history = alerts::list_alerts(&pool, owner.id, s.id, Some(true)).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].resolved_by, Some(nurse.id));
    assert_eq!(history[0].resolved_at, resolved.resolved_at);

    assert!(alerts::list_alerts(&pool, owner.id, s.id, Some(false)).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_alerts_listed_newest_first() {
    let pool = helpers::memory_pool().await;
    let owner = helpers::caregiver(&pool, "Owner").await;
    let s = helpers::subject(&pool, &owner).await;

    for title in ["first", "second", "third"] {
        alerts::create_alert(
            &pool,
            owner.id,
            s.id,
            NewHealthAlert {
                alert_type: AlertType::Mood,
                severity: Severity::Medium,
                title: title.to_string(),
                description: "check in".to_string(),
            },
        )
        .await
        .unwrap();
        // Keep created_at strictly increasing at microsecond precision
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }

    let listed = alerts::list_alerts(&pool, owner.id, s.id, None).await.unwrap();
    let titles: Vec<&str> = listed.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(titles, vec!["third", "second", "first"]);
}
