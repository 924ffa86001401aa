//! gaia-care library - care monitoring service
//!
//! Caregivers, care subjects, access relations, the interaction ledger,
//! aggregation and the alert lifecycle, exposed over HTTP.

use axum::Router;
use gaia_common::db::CareSettings;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

pub mod api;
pub mod db;
pub mod error;
pub mod services;

pub use error::{ApiError, ApiResult};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Tunables loaded from the settings table at startup
    pub settings: Arc<CareSettings>,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, settings: CareSettings) -> Self {
        Self {
            db,
            settings: Arc::new(settings),
        }
    }
}

/// Build application router
///
/// `/health` needs no caller identity; every `/api` route except caregiver
/// registration resolves one from the `X-Caregiver-Id` header.
pub fn build_router(state: AppState) -> Router {
    let timeout = Duration::from_millis(state.settings.http_request_timeout_ms);

    Router::new()
        .merge(api::health_routes())
        .merge(api::caregiver_routes())
        .merge(api::care_subject_routes())
        .merge(api::interaction_routes())
        .merge(api::stats_routes())
        .merge(api::alert_routes())
        .with_state(state)
        .layer(TimeoutLayer::new(timeout))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
