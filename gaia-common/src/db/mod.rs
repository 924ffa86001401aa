//! Database schema, migrations, settings and shared models

pub mod init;
pub mod migrations;
pub mod models;
pub mod settings;

pub use init::{init_database, init_memory_database, DATABASE_FILE_NAME};
pub use settings::{AlertThresholds, CareSettings};
