//! Audit trail queries. Writes happen in the patient service alongside the
//! operations they record; this module only reads the trail back.

use rusqlite::Connection;
use uuid::Uuid;

use crate::db::repository;
use crate::models::audit_log::AuditLog;
use crate::patients::ServiceError;

/// Entries newest first, optionally scoped to one patient. An unknown
/// patient id yields an empty list, not an error: entries may legitimately
/// outlive their patient.
pub fn list_audit_logs(
    conn: &Connection,
    patient_id: Option<&Uuid>,
) -> Result<Vec<AuditLog>, ServiceError> {
    Ok(repository::list_audit_logs(conn, patient_id)?)
}
