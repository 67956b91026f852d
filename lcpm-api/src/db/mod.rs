//! Database queries for lcpm-api
//!
//! Guids are stored as TEXT; every module converts Uuid to String before
//! binding and parses on the way out.

pub mod categories;
pub mod hierarchy;
pub mod projects;
pub mod stages;
pub mod tasks;

use lcpm_common::{Error, Result};
use uuid::Uuid;

/// Parse a guid column value, naming the column on failure
pub(crate) fn parse_guid(value: &str, column: &str) -> Result<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| Error::Internal(format!("Invalid UUID in {}: {}", column, e)))
}

/// Parse an optional guid column value
pub(crate) fn parse_guid_opt(value: Option<String>, column: &str) -> Result<Option<Uuid>> {
    value.map(|s| parse_guid(&s, column)).transpose()
}

/// True if the error is a UNIQUE constraint rejection
pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map(|d| d.is_unique_violation())
        .unwrap_or(false)
}
