//! Database initialization
//!
//! Creates the database on first run, applies the baseline schema
//! idempotently, runs versioned migrations and seeds default settings.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::{info, warn};

/// Name of the database file inside the root folder
pub const DATABASE_FILE_NAME: &str = "gaia.db";

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // WAL lets aggregation reads proceed while a write is in flight
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    init_schema(&pool).await?;

    Ok(pool)
}

/// Open a private in-memory database with the full schema
///
/// Holds a single connection that never expires; an in-memory SQLite
/// database lives only as long as its connection.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    init_schema(&pool).await?;

    Ok(pool)
}

/// Create tables, run migrations and seed settings (idempotent)
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    // Per-connection pragmas; the pool may open more connections later,
    // which is why every write path also relies on table constraints.
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(pool).await?;

    create_schema_version_table(pool).await?;
    create_settings_table(pool).await?;
    create_caregivers_table(pool).await?;
    create_care_subjects_table(pool).await?;
    create_access_relations_table(pool).await?;
    create_interactions_table(pool).await?;
    create_health_alerts_table(pool).await?;

    crate::db::migrations::run_migrations(pool).await?;

    init_default_settings(pool).await?;

    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the settings table
///
/// Stores service configuration key-value pairs.
pub async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the caregivers table (identity store)
pub async fn create_caregivers_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS caregivers (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            display_name TEXT NOT NULL,
            role TEXT NOT NULL CHECK (role IN ('family', 'medical', 'caregiver')),
            phone_number TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the care_subjects table (care-subject registry)
///
/// List-valued profile fields are stored as JSON arrays.
pub async fn create_care_subjects_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS care_subjects (
            id TEXT PRIMARY KEY,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            date_of_birth TEXT,
            gender TEXT CHECK (gender IS NULL OR gender IN ('male', 'female', 'other')),
            phone_number TEXT,
            address TEXT,
            health_status TEXT,
            medical_history TEXT,
            conditions TEXT NOT NULL DEFAULT '[]',
            medications TEXT NOT NULL DEFAULT '[]',
            allergies TEXT NOT NULL DEFAULT '[]',
            sensitivities TEXT NOT NULL DEFAULT '[]',
            mobility_status TEXT CHECK (mobility_status IS NULL OR mobility_status IN ('independent', 'limited', 'assisted', 'wheelchair')),
            mobility_aids TEXT NOT NULL DEFAULT '[]',
            vision_status TEXT CHECK (vision_status IS NULL OR vision_status IN ('normal', 'corrected', 'limited', 'blind')),
            hearing_status TEXT CHECK (hearing_status IS NULL OR hearing_status IN ('normal', 'corrected', 'limited', 'deaf')),
            speech_status TEXT CHECK (speech_status IS NULL OR speech_status IN ('normal', 'limited', 'non_verbal')),
            emergency_contact TEXT,
            care_instructions TEXT,
            robot_id TEXT UNIQUE,
            is_active INTEGER NOT NULL DEFAULT 1 CHECK (is_active IN (0, 1)),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the access_relations table (caregiver <-> care subject edges)
///
/// The partial unique index allows at most one active edge per pair.
pub async fn create_access_relations_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS access_relations (
            id TEXT PRIMARY KEY,
            caregiver_id TEXT NOT NULL REFERENCES caregivers(id),
            care_subject_id TEXT NOT NULL REFERENCES care_subjects(id),
            relationship_type TEXT NOT NULL CHECK (relationship_type IN ('child', 'medical_professional', 'caregiver', 'other')),
            permission_level TEXT NOT NULL CHECK (permission_level IN ('view', 'edit', 'admin')),
            is_active INTEGER NOT NULL DEFAULT 1 CHECK (is_active IN (0, 1)),
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_access_relations_active_pair
        ON access_relations(caregiver_id, care_subject_id)
        WHERE is_active = 1
        "#,
    )
    .execute(pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_access_relations_subject ON access_relations(care_subject_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the interactions table (append-only ledger)
pub async fn create_interactions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS interactions (
            id TEXT PRIMARY KEY,
            care_subject_id TEXT NOT NULL REFERENCES care_subjects(id),
            kind TEXT NOT NULL CHECK (kind IN ('conversation', 'health_check', 'reminder', 'game', 'voice_recording')),
            transcript TEXT,
            audio_url TEXT,
            sentiment_score REAL CHECK (sentiment_score IS NULL OR (sentiment_score >= -1.0 AND sentiment_score <= 1.0)),
            sentiment_label TEXT CHECK (sentiment_label IS NULL OR sentiment_label IN ('positive', 'neutral', 'negative')),
            mood_score INTEGER CHECK (mood_score IS NULL OR (mood_score >= 1 AND mood_score <= 10)),
            cognitive_score REAL CHECK (cognitive_score IS NULL OR (cognitive_score >= 0.0 AND cognitive_score <= 1.0)),
            health_indicators TEXT,
            alert_level TEXT NOT NULL DEFAULT 'normal' CHECK (alert_level IN ('normal', 'attention', 'urgent')),
            robot_response TEXT,
            notes TEXT,
            duration_seconds INTEGER NOT NULL CHECK (duration_seconds >= 0),
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_interactions_subject_created ON interactions(care_subject_id, created_at)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the health_alerts table
///
/// The row-level CHECK ties resolver identity and timestamp to the state.
pub async fn create_health_alerts_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS health_alerts (
            id TEXT PRIMARY KEY,
            care_subject_id TEXT NOT NULL REFERENCES care_subjects(id),
            alert_type TEXT NOT NULL CHECK (alert_type IN ('health', 'safety', 'mood', 'cognitive')),
            severity TEXT NOT NULL CHECK (severity IN ('low', 'medium', 'high', 'critical')),
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            state TEXT NOT NULL DEFAULT 'active' CHECK (state IN ('active', 'resolved')),
            resolved_by TEXT REFERENCES caregivers(id),
            resolved_at TEXT,
            created_at TEXT NOT NULL,
            CHECK (
                (state = 'active' AND resolved_by IS NULL AND resolved_at IS NULL)
                OR (state = 'resolved' AND resolved_by IS NOT NULL AND resolved_at IS NOT NULL)
            )
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_health_alerts_subject_state ON health_alerts(care_subject_id, state, created_at)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Initialize or update default settings
///
/// Ensures every required setting exists; NULL values are reset to defaults.
async fn init_default_settings(pool: &SqlitePool) -> Result<()> {
    // HTTP server settings
    ensure_setting(pool, "http_request_timeout_ms", "30000").await?;

    // Query defaults
    ensure_setting(pool, "interactions_default_limit", "50").await?;
    ensure_setting(pool, "sentiment_default_window_days", "30").await?;

    // Threshold alerts raised when an interaction is recorded
    ensure_setting(pool, "auto_alerts_enabled", "true").await?;
    ensure_setting(pool, "alert_mood_threshold", "3").await?;
    ensure_setting(pool, "alert_sentiment_threshold", "-0.6").await?;
    ensure_setting(pool, "alert_cognitive_threshold", "0.4").await?;

    info!("Default settings initialized");
    Ok(())
}

/// Ensure a setting exists with the specified default value
///
/// If the setting doesn't exist, it will be created with the default.
/// If the setting exists but has a NULL value, it will be reset to the default.
async fn ensure_setting(pool: &SqlitePool, key: &str, default_value: &str) -> Result<()> {
    // INSERT OR IGNORE tolerates two services initializing concurrently
    let inserted = sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
        .bind(key)
        .bind(default_value)
        .execute(pool)
        .await?
        .rows_affected();

    if inserted > 0 {
        info!("Initialized setting '{}' with default value: {}", key, default_value);
        return Ok(());
    }

    let reset = sqlx::query("UPDATE settings SET value = ? WHERE key = ? AND value IS NULL")
        .bind(default_value)
        .bind(key)
        .execute(pool)
        .await?
        .rows_affected();

    if reset > 0 {
        warn!("Setting '{}' was NULL, reset to default: {}", key, default_value);
    }

    Ok(())
}
