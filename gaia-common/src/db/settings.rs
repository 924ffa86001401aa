//! Settings database access
//!
//! Read/write settings from the settings table (key-value store).
//! All settings are global/system-wide.

use crate::{Error, Result};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;

/// Runtime tunables for the care service, loaded once at startup
#[derive(Debug, Clone, PartialEq)]
pub struct CareSettings {
    pub http_request_timeout_ms: u64,
    /// Page size used by interaction listings when no limit is given
    pub interactions_default_limit: u32,
    /// Trailing window used by the sentiment series when no window is given
    pub sentiment_default_window_days: u32,
    pub auto_alerts_enabled: bool,
    pub alert_thresholds: AlertThresholds,
}

/// Thresholds at or beyond which a recorded interaction raises an alert
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertThresholds {
    /// Mood scores at or below this raise a mood alert
    pub mood: i64,
    /// Sentiment scores at or below this raise a mood alert
    pub sentiment: f64,
    /// Cognitive scores strictly below this raise a cognitive alert
    pub cognitive: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            mood: 3,
            sentiment: -0.6,
            cognitive: 0.4,
        }
    }
}

impl Default for CareSettings {
    fn default() -> Self {
        Self {
            http_request_timeout_ms: 30_000,
            interactions_default_limit: 50,
            sentiment_default_window_days: 30,
            auto_alerts_enabled: true,
            alert_thresholds: AlertThresholds::default(),
        }
    }
}

impl CareSettings {
    /// Load all care settings, falling back to defaults for missing keys
    pub async fn load(db: &Pool<Sqlite>) -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            http_request_timeout_ms: get_setting(db, "http_request_timeout_ms")
                .await?
                .unwrap_or(defaults.http_request_timeout_ms),
            interactions_default_limit: get_setting(db, "interactions_default_limit")
                .await?
                .unwrap_or(defaults.interactions_default_limit),
            sentiment_default_window_days: get_setting(db, "sentiment_default_window_days")
                .await?
                .unwrap_or(defaults.sentiment_default_window_days),
            auto_alerts_enabled: get_setting(db, "auto_alerts_enabled")
                .await?
                .unwrap_or(defaults.auto_alerts_enabled),
            alert_thresholds: AlertThresholds {
                mood: get_setting(db, "alert_mood_threshold")
                    .await?
                    .unwrap_or(defaults.alert_thresholds.mood),
                sentiment: get_setting(db, "alert_sentiment_threshold")
                    .await?
                    .unwrap_or(defaults.alert_thresholds.sentiment),
                cognitive: get_setting(db, "alert_cognitive_threshold")
                    .await?
                    .unwrap_or(defaults.alert_thresholds.cognitive),
            },
        })
    }
}

/// Generic setting getter
///
/// Returns `None` when the key is absent or its value is NULL.
pub async fn get_setting<T: FromStr>(db: &Pool<Sqlite>, key: &str) -> Result<Option<T>> {
    let value: Option<Option<String>> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(db)
            .await?;

    match value.flatten() {
        Some(s) => match s.parse::<T>() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_) => Err(Error::Config(format!(
                "Failed to parse setting '{}' value: {}",
                key, s
            ))),
        },
        None => Ok(None),
    }
}

/// Generic setting setter
///
/// Inserts or updates setting in database.
pub async fn set_setting<T: ToString>(db: &Pool<Sqlite>, key: &str, value: T) -> Result<()> {
    let value_str = value.to_string();

    sqlx::query(
        r#"
        INSERT INTO settings (key, value, updated_at)
        VALUES (?, ?, CURRENT_TIMESTAMP)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
    )
    .bind(key)
    .bind(value_str)
    .execute(db)
    .await?;

    Ok(())
}
