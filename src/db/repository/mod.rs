//! Repository layer — entity-scoped database operations.
//!
//! Functions take a `&Connection` and speak in domain types; row structs
//! and string/UUID/timestamp conversions stay inside this module.

mod audit_log;
mod patient;

pub use audit_log::*;
pub use patient::*;

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::db::DatabaseError;

/// Timestamp storage format ('YYYY-MM-DD HH:MM:SS', UTC).
const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub(crate) fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.format(TS_FORMAT).to_string()
}

pub(crate) fn parse_ts(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    NaiveDateTime::parse_from_str(s, TS_FORMAT)
        .map(|dt| dt.and_utc())
        .map_err(|e| DatabaseError::ConstraintViolation(format!("bad timestamp {s:?}: {e}")))
}
