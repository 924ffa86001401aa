//! Database schema migrations
//!
//! Versioned, idempotent migrations applied after the baseline
//! `CREATE TABLE IF NOT EXISTS` pass, tracked in the `schema_version` table.
//!
//! # Migration Guidelines
//!
//! 1. **Never modify existing migrations** - databases in the field have already applied them
//! 2. **Always add new migrations** - one function per schema change
//! 3. **Keep them idempotent** - every step must be safe to run twice

use crate::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Current schema version
///
/// **IMPORTANT:** Increment this when adding new migrations
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Get current schema version from database
///
/// Returns 0 if schema_version table doesn't exist or has no rows
pub async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let table_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM sqlite_master
            WHERE type='table' AND name='schema_version'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        return Ok(0);
    }

    let version: Option<i32> =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    Ok(version.unwrap_or(0))
}

/// Set schema version in database
async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;

    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current_version = get_schema_version(pool).await?;

    if current_version == CURRENT_SCHEMA_VERSION {
        info!("Database schema is up to date (v{})", current_version);
        return Ok(());
    }

    if current_version > CURRENT_SCHEMA_VERSION {
        warn!(
            "Database schema version ({}) is newer than code version ({})",
            current_version, CURRENT_SCHEMA_VERSION
        );
        warn!("This may indicate a downgrade. Proceeding with caution.");
        return Ok(());
    }

    info!(
        "Running database migrations: v{} -> v{}",
        current_version, CURRENT_SCHEMA_VERSION
    );

    if current_version < 1 {
        migrate_v1(pool).await?;
        set_schema_version(pool, 1).await?;
        info!("✓ Migration v1 completed");
    }

    if current_version < 2 {
        migrate_v2(pool).await?;
        set_schema_version(pool, 2).await?;
        info!("✓ Migration v2 completed");
    }

    info!("All migrations completed successfully");
    Ok(())
}

/// Migration v1: storage-level guards for the interaction ledger
///
/// Interactions are append-only; these triggers reject UPDATE and DELETE
/// even from tools that bypass the service.
async fn migrate_v1(pool: &SqlitePool) -> Result<()> {
    info!("Running migration v1: append-only guards on interactions");

    sqlx::query(
        r#"
        CREATE TRIGGER IF NOT EXISTS trg_interactions_no_update
        BEFORE UPDATE ON interactions
        BEGIN
            SELECT RAISE(ABORT, 'interactions are append-only');
        END
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TRIGGER IF NOT EXISTS trg_interactions_no_delete
        BEFORE DELETE ON interactions
        BEGIN
            SELECT RAISE(ABORT, 'interactions are append-only');
        END
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Migration v2: alert lifecycle guards
///
/// Health alerts are never deleted, and a resolved alert may not be
/// reopened or have its resolver rewritten.
async fn migrate_v2(pool: &SqlitePool) -> Result<()> {
    info!("Running migration v2: lifecycle guards on health_alerts");

    sqlx::query(
        r#"
        CREATE TRIGGER IF NOT EXISTS trg_health_alerts_no_delete
        BEFORE DELETE ON health_alerts
        BEGIN
            SELECT RAISE(ABORT, 'health alerts are never deleted');
        END
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TRIGGER IF NOT EXISTS trg_health_alerts_resolved_is_terminal
        BEFORE UPDATE ON health_alerts
        WHEN OLD.state = 'resolved'
        BEGIN
            SELECT RAISE(ABORT, 'resolved alerts are terminal');
        END
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
