//! UUID utilities

use crate::{Error, Result};
use uuid::Uuid;

/// Generate a new UUIDv4
pub fn generate() -> Uuid {
    Uuid::new_v4()
}

/// Parse a UUID read back from a database column
pub fn parse_column(column: &str, s: &str) -> Result<Uuid> {
    Uuid::parse_str(s)
        .map_err(|e| Error::Internal(format!("Invalid UUID in column '{}': {}", column, e)))
}
