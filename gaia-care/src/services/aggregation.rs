//! Aggregation engine: per-subject statistics and sentiment series

use chrono::{DateTime, NaiveDate, Utc};
use gaia_common::db::models::{PermissionLevel, SeriesPoint, StatsSummary};
use gaia_common::{time, Error, Result};
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use uuid::Uuid;

use super::access;
use crate::db::{alerts, interactions};
use crate::db::interactions::SignalRow;

/// Widest sentiment window accepted, in days
pub const MAX_WINDOW_DAYS: u32 = 3650;

/// Statistics for one subject; requires `view`
///
/// Both queries run in one read transaction so the alert count and the
/// interaction figures describe the same snapshot.
pub async fn compute_stats(
    pool: &SqlitePool,
    caller_id: Uuid,
    care_subject_id: Uuid,
) -> Result<StatsSummary> {
    access::authorize(pool, caller_id, care_subject_id, PermissionLevel::View).await?;

    let mut tx = pool.begin().await?;
    let totals = interactions::totals(&mut *tx, care_subject_id).await?;
    let active_alerts_count = alerts::count_active(&mut *tx, care_subject_id).await?;
    tx.commit().await?;

    Ok(StatsSummary {
        total_interactions: totals.count,
        avg_mood_score: totals.avg_mood_score,
        avg_sentiment: totals.avg_sentiment,
        total_duration_seconds: totals.total_duration_seconds,
        active_alerts_count,
    })
}

/// Daily sentiment and mood averages over a trailing window; requires `view`
pub async fn compute_sentiment_series(
    pool: &SqlitePool,
    caller_id: Uuid,
    care_subject_id: Uuid,
    window_days: u32,
) -> Result<Vec<SeriesPoint>> {
    access::authorize(pool, caller_id, care_subject_id, PermissionLevel::View).await?;

    if !(1..=MAX_WINDOW_DAYS).contains(&window_days) {
        return Err(Error::InvalidInput(format!(
            "Window must be between 1 and {} days, got {}",
            MAX_WINDOW_DAYS, window_days
        )));
    }

    let since = time::window_start(time::now(), window_days);
    let rows = interactions::signals_since(pool, care_subject_id, since).await?;
    Ok(bucket_by_day(&rows))
}

#[derive(Default)]
struct DayBucket {
    sentiment_sum: f64,
    sentiment_count: u32,
    mood_sum: f64,
    mood_count: u32,
}

/// Group rows into UTC calendar days, ascending
///
/// A day appears only if it has at least one row. Within a day each average
/// covers the rows carrying that signal and is zero when none do.
pub fn bucket_by_day(rows: &[SignalRow]) -> Vec<SeriesPoint> {
    let mut days: BTreeMap<NaiveDate, DayBucket> = BTreeMap::new();

    for row in rows {
        let bucket = days.entry(utc_date(row.created_at)).or_default();
        if let Some(score) = row.sentiment_score {
            bucket.sentiment_sum += score;
            bucket.sentiment_count += 1;
        }
        if let Some(mood) = row.mood_score {
            bucket.mood_sum += mood as f64;
            bucket.mood_count += 1;
        }
    }

    days.into_iter()
        .map(|(date, b)| SeriesPoint {
            date,
            avg_sentiment: mean(b.sentiment_sum, b.sentiment_count),
            avg_mood: mean(b.mood_sum, b.mood_count),
        })
        .collect()
}

fn utc_date(ts: DateTime<Utc>) -> NaiveDate {
    ts.date_naive()
}

fn mean(sum: f64, count: u32) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum / f64::from(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(day: u32, hour: u32, sentiment: Option<f64>, mood: Option<i64>) -> SignalRow {
        SignalRow {
            created_at: Utc.with_ymd_and_hms(2026, 10, day, hour, 0, 0).unwrap(),
            sentiment_score: sentiment,
            mood_score: mood,
        }
    }

    #[test]
    fn test_empty_days_are_omitted() {
        let points = bucket_by_day(&[row(1, 9, Some(0.5), None), row(3, 9, Some(-0.2), None)]);

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date, NaiveDate::from_ymd_opt(2026, 10, 1).unwrap());
        assert_eq!(points[0].avg_sentiment, 0.5);
        assert_eq!(points[1].date, NaiveDate::from_ymd_opt(2026, 10, 3).unwrap());
        assert_eq!(points[1].avg_sentiment, -0.2);
    }

    #[test]
    fn test_same_day_rows_are_averaged() {
        let points = bucket_by_day(&[
            row(5, 8, Some(0.2), Some(4)),
            row(5, 20, Some(0.6), Some(8)),
            row(5, 23, None, None),
        ]);

        assert_eq!(points.len(), 1);
        assert!((points[0].avg_sentiment - 0.4).abs() < 1e-12);
        assert_eq!(points[0].avg_mood, 6.0);
    }

    #[test]
    fn test_day_without_signals_reports_zero() {
        let points = bucket_by_day(&[row(7, 12, None, None)]);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].avg_sentiment, 0.0);
        assert_eq!(points[0].avg_mood, 0.0);
    }

    #[test]
    fn test_output_is_ascending_regardless_of_input_order() {
        let points = bucket_by_day(&[row(9, 1, Some(0.1), None), row(2, 1, Some(0.2), None)]);
        assert!(points[0].date < points[1].date);
    }
}
