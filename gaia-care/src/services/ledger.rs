//! Interaction ledger
//!
//! Append-only log of recorded sessions. Input is validated in full before
//! anything is written; there is no update or delete operation.

use chrono::{DateTime, SubsecRound, Utc};
use futures::{Stream, TryStreamExt};
use gaia_common::db::models::{Interaction, NewInteraction, PermissionLevel, SentimentLabel};
use gaia_common::{time, uuid_utils, Error, Result};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use super::access;
use crate::db::interactions;

/// Upper bound on a single listing
pub const MAX_LIST_LIMIT: u32 = 500;

/// Record an interaction for a subject; requires `edit`
///
/// The returned record is durable. A sentiment label is derived from the
/// score when the device sent only the score.
pub async fn record_interaction(
    pool: &SqlitePool,
    caller_id: Uuid,
    care_subject_id: Uuid,
    new: NewInteraction,
) -> Result<Interaction> {
    access::authorize(pool, caller_id, care_subject_id, PermissionLevel::Edit).await?;

    let now = time::now();
    validate_interaction(&new, now)?;

    let sentiment_label = new
        .sentiment_label
        .or_else(|| new.sentiment_score.map(SentimentLabel::from_score));

    let interaction = Interaction {
        id: uuid_utils::generate(),
        care_subject_id,
        kind: new.kind,
        transcript: new.transcript,
        audio_url: new.audio_url,
        sentiment_score: new.sentiment_score,
        sentiment_label,
        mood_score: new.mood_score,
        cognitive_score: new.cognitive_score,
        health_indicators: new.health_indicators,
        alert_level: new.alert_level.unwrap_or_default(),
        robot_response: new.robot_response,
        notes: new.notes,
        duration_seconds: new.duration_seconds,
        created_at: new.recorded_at.map(|t| t.trunc_subsecs(6)).unwrap_or(now),
    };

    interactions::insert_interaction(pool, &interaction).await?;
    info!(
        interaction_id = %interaction.id,
        %care_subject_id,
        kind = %interaction.kind,
        "Recorded interaction"
    );

    Ok(interaction)
}

/// Newest-first interactions; requires `view`
///
/// `limit` is clamped to `[1, MAX_LIST_LIMIT]`. The stream is lazy; calling
/// again restarts it from the newest record.
pub async fn list_recent<'a>(
    pool: &'a SqlitePool,
    caller_id: Uuid,
    care_subject_id: Uuid,
    limit: u32,
) -> Result<impl Stream<Item = Result<Interaction>> + 'a> {
    access::authorize(pool, caller_id, care_subject_id, PermissionLevel::View).await?;
    Ok(interactions::stream_recent(pool, care_subject_id, clamp_limit(limit)))
}

/// Collected form of [`list_recent`]
pub async fn list_interactions(
    pool: &SqlitePool,
    caller_id: Uuid,
    care_subject_id: Uuid,
    limit: u32,
) -> Result<Vec<Interaction>> {
    list_recent(pool, caller_id, care_subject_id, limit)
        .await?
        .try_collect()
        .await
}

pub fn clamp_limit(limit: u32) -> u32 {
    limit.clamp(1, MAX_LIST_LIMIT)
}

/// Check every value constraint of a submitted interaction
pub fn validate_interaction(new: &NewInteraction, now: DateTime<Utc>) -> Result<()> {
    if new.duration_seconds < 0 {
        return Err(invalid(format!(
            "duration_seconds must be >= 0, got {}",
            new.duration_seconds
        )));
    }

    if let Some(score) = new.sentiment_score {
        if !score.is_finite() || !(-1.0..=1.0).contains(&score) {
            return Err(invalid(format!("sentiment_score must be in [-1, 1], got {}", score)));
        }
    }

    if let Some(mood) = new.mood_score {
        if !(1..=10).contains(&mood) {
            return Err(invalid(format!("mood_score must be in [1, 10], got {}", mood)));
        }
    }

    if let Some(score) = new.cognitive_score {
        if !score.is_finite() || !(0.0..=1.0).contains(&score) {
            return Err(invalid(format!("cognitive_score must be in [0, 1], got {}", score)));
        }
    }

    if let Some(indicators) = &new.health_indicators {
        if !indicators.is_object() {
            return Err(invalid("health_indicators must be a JSON object".to_string()));
        }
    }

    if let Some(recorded_at) = new.recorded_at {
        if recorded_at > now {
            return Err(invalid(format!("recorded_at {} is in the future", recorded_at)));
        }
    }

    Ok(())
}

fn invalid(message: String) -> Error {
    Error::InvalidInteraction(message)
}
