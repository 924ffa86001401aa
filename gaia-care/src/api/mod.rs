//! HTTP API handlers for gaia-care

pub mod alerts;
pub mod care_subjects;
pub mod caregivers;
pub mod extract;
pub mod health;
pub mod identity;
pub mod interactions;
pub mod stats;

pub use alerts::alert_routes;
pub use care_subjects::care_subject_routes;
pub use caregivers::caregiver_routes;
pub use extract::authorized;
pub use health::health_routes;
pub use identity::{CurrentCaregiver, CAREGIVER_HEADER};
pub use interactions::interaction_routes;
pub use stats::stats_routes;
