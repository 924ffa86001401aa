//! # GaIA Common Library
//!
//! Shared code for the GaIA care monitoring services:
//! - Domain models (caregivers, care subjects, access relations,
//!   interactions, health alerts)
//! - Error taxonomy
//! - Database initialization, migrations and settings
//! - Configuration loading
//! - Time and UUID helpers

pub mod config;
pub mod db;
pub mod error;
pub mod time;
pub mod uuid_utils;

pub use db::models::PermissionLevel;
pub use error::{Error, Result};
