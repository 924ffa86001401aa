//! Interaction persistence (append-only ledger)
//!
//! The table has no update or delete path; triggers installed by the
//! migrations reject both at the storage level.

use async_stream::try_stream;
use chrono::{DateTime, Utc};
use futures::{Stream, TryStreamExt};
use gaia_common::db::models::Interaction;
use gaia_common::{time, Result};
use sqlx::{sqlite::SqliteRow, Executor, Row, Sqlite, SqlitePool};
use uuid::Uuid;

use super::{opt_json_col, opt_tag_col, tag_col, to_json_text, ts_col, uuid_col};

/// Interaction count and signal averages for one subject
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionTotals {
    pub count: i64,
    pub avg_mood_score: f64,
    pub avg_sentiment: f64,
    pub total_duration_seconds: i64,
}

/// The per-interaction signals a sentiment series is built from
#[derive(Debug, Clone, PartialEq)]
pub struct SignalRow {
    pub created_at: DateTime<Utc>,
    pub sentiment_score: Option<f64>,
    pub mood_score: Option<i64>,
}

/// Append an interaction
pub async fn insert_interaction(pool: &SqlitePool, interaction: &Interaction) -> Result<()> {
    let health_indicators = interaction
        .health_indicators
        .as_ref()
        .map(to_json_text)
        .transpose()?;

    sqlx::query(
        r#"
        INSERT INTO interactions (
            id, care_subject_id, kind, transcript, audio_url, sentiment_score,
            sentiment_label, mood_score, cognitive_score, health_indicators,
            alert_level, robot_response, notes, duration_seconds, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(interaction.id.to_string())
    .bind(interaction.care_subject_id.to_string())
    .bind(interaction.kind.as_str())
    .bind(&interaction.transcript)
    .bind(&interaction.audio_url)
    .bind(interaction.sentiment_score)
    .bind(interaction.sentiment_label.map(|l| l.as_str()))
    .bind(interaction.mood_score)
    .bind(interaction.cognitive_score)
    .bind(health_indicators)
    .bind(interaction.alert_level.as_str())
    .bind(&interaction.robot_response)
    .bind(&interaction.notes)
    .bind(interaction.duration_seconds)
    .bind(time::to_db_timestamp(&interaction.created_at))
    .execute(pool)
    .await?;

    Ok(())
}

/// Newest-first interactions for a subject, at most `limit` of them
///
/// Rows are decoded as they are pulled. Each call runs a fresh query, so
/// the sequence can be restarted by calling again.
pub fn stream_recent(
    pool: &SqlitePool,
    care_subject_id: Uuid,
    limit: u32,
) -> impl Stream<Item = Result<Interaction>> + '_ {
    try_stream! {
        let mut rows = sqlx::query(
            r#"
            SELECT id, care_subject_id, kind, transcript, audio_url, sentiment_score,
                   sentiment_label, mood_score, cognitive_score, health_indicators,
                   alert_level, robot_response, notes, duration_seconds, created_at
            FROM interactions
            WHERE care_subject_id = ?
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(care_subject_id.to_string())
        .bind(i64::from(limit))
        .fetch(pool);

        while let Some(row) = rows.try_next().await? {
            yield interaction_from_row(&row)?;
        }
    }
}

/// Count, signal averages and total duration in a single statement
///
/// Averages cover only the interactions that carry the signal; with no
/// such interactions they are zero.
pub async fn totals<'e, E>(executor: E, care_subject_id: Uuid) -> Result<InteractionTotals>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query(
        r#"
        SELECT
            COUNT(*) AS count,
            COALESCE(AVG(mood_score), 0.0) AS avg_mood_score,
            COALESCE(AVG(sentiment_score), 0.0) AS avg_sentiment,
            COALESCE(SUM(duration_seconds), 0) AS total_duration_seconds
        FROM interactions
        WHERE care_subject_id = ?
        "#,
    )
    .bind(care_subject_id.to_string())
    .fetch_one(executor)
    .await?;

    Ok(InteractionTotals {
        count: row.try_get("count")?,
        avg_mood_score: row.try_get("avg_mood_score")?,
        avg_sentiment: row.try_get("avg_sentiment")?,
        total_duration_seconds: row.try_get("total_duration_seconds")?,
    })
}

/// Signals of interactions created at or after `since`, oldest first
pub async fn signals_since(
    pool: &SqlitePool,
    care_subject_id: Uuid,
    since: DateTime<Utc>,
) -> Result<Vec<SignalRow>> {
    // Fixed-width timestamps compare correctly as text
    let rows = sqlx::query(
        r#"
        SELECT created_at, sentiment_score, mood_score
        FROM interactions
        WHERE care_subject_id = ? AND created_at >= ?
        ORDER BY created_at ASC
        "#,
    )
    .bind(care_subject_id.to_string())
    .bind(time::to_db_timestamp(&since))
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            Ok(SignalRow {
                created_at: ts_col(row, "created_at")?,
                sentiment_score: row.try_get("sentiment_score")?,
                mood_score: row.try_get("mood_score")?,
            })
        })
        .collect()
}

fn interaction_from_row(row: &SqliteRow) -> Result<Interaction> {
    Ok(Interaction {
        id: uuid_col(row, "id")?,
        care_subject_id: uuid_col(row, "care_subject_id")?,
        kind: tag_col(row, "kind")?,
        transcript: row.try_get("transcript")?,
        audio_url: row.try_get("audio_url")?,
        sentiment_score: row.try_get("sentiment_score")?,
        sentiment_label: opt_tag_col(row, "sentiment_label")?,
        mood_score: row.try_get("mood_score")?,
        cognitive_score: row.try_get("cognitive_score")?,
        health_indicators: opt_json_col(row, "health_indicators")?,
        alert_level: tag_col(row, "alert_level")?,
        robot_response: row.try_get("robot_response")?,
        notes: row.try_get("notes")?,
        duration_seconds: row.try_get("duration_seconds")?,
        created_at: ts_col(row, "created_at")?,
    })
}
