use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::audit_log::AuditLog;
use crate::models::enums::AuditAction;

use super::{format_ts, parse_ts};

const AUDIT_COLUMNS: &str =
    "id, patient_id, action, field_name, old_value, new_value, performed_by, performed_at, notes";

/// Append one entry to the audit trail. Entries are never updated or
/// individually deleted by the application.
pub fn insert_audit_log(conn: &Connection, entry: &AuditLog) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO audit_logs (id, patient_id, action, field_name, old_value, new_value,
         performed_by, performed_at, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            entry.id.to_string(),
            entry.patient_id.to_string(),
            entry.action.as_str(),
            entry.field_name,
            entry.old_value,
            entry.new_value,
            entry.performed_by,
            format_ts(&entry.performed_at),
            entry.notes,
        ],
    )?;
    Ok(())
}

/// Entries for one patient, or for all patients when no id is given.
/// Newest first; id breaks ties within the same second.
pub fn list_audit_logs(
    conn: &Connection,
    patient_id: Option<&Uuid>,
) -> Result<Vec<AuditLog>, DatabaseError> {
    let mut entries = Vec::new();

    match patient_id {
        Some(id) => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {AUDIT_COLUMNS} FROM audit_logs WHERE patient_id = ?1
                 ORDER BY performed_at DESC, id DESC"
            ))?;
            let rows = stmt.query_map(params![id.to_string()], map_audit_row)?;
            for row in rows {
                entries.push(audit_from_row(row?)?);
            }
        }
        None => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {AUDIT_COLUMNS} FROM audit_logs ORDER BY performed_at DESC, id DESC"
            ))?;
            let rows = stmt.query_map([], map_audit_row)?;
            for row in rows {
                entries.push(audit_from_row(row?)?);
            }
        }
    }

    Ok(entries)
}

struct AuditRow {
    id: String,
    patient_id: String,
    action: String,
    field_name: Option<String>,
    old_value: Option<String>,
    new_value: Option<String>,
    performed_by: String,
    performed_at: String,
    notes: Option<String>,
}

fn map_audit_row(row: &rusqlite::Row<'_>) -> Result<AuditRow, rusqlite::Error> {
    Ok(AuditRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        action: row.get(2)?,
        field_name: row.get(3)?,
        old_value: row.get(4)?,
        new_value: row.get(5)?,
        performed_by: row.get(6)?,
        performed_at: row.get(7)?,
        notes: row.get(8)?,
    })
}

fn audit_from_row(row: AuditRow) -> Result<AuditLog, DatabaseError> {
    Ok(AuditLog {
        id: Uuid::parse_str(&row.id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        patient_id: Uuid::parse_str(&row.patient_id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        action: AuditAction::from_str(&row.action)?,
        field_name: row.field_name,
        old_value: row.old_value,
        new_value: row.new_value,
        performed_by: row.performed_by,
        performed_at: parse_ts(&row.performed_at)?,
        notes: row.notes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use chrono::{TimeZone, Utc};

    fn make_entry(patient_id: Uuid, action: AuditAction, performed_at_hour: u32) -> AuditLog {
        AuditLog {
            id: Uuid::new_v4(),
            patient_id,
            action,
            field_name: None,
            old_value: None,
            new_value: None,
            performed_by: "System".into(),
            performed_at: Utc
                .with_ymd_and_hms(2026, 5, 1, performed_at_hour, 0, 0)
                .unwrap(),
            notes: None,
        }
    }

    #[test]
    fn insert_and_list_newest_first() {
        let conn = open_memory_database().unwrap();
        let patient_id = Uuid::new_v4();

        insert_audit_log(&conn, &make_entry(patient_id, AuditAction::Create, 8)).unwrap();
        insert_audit_log(&conn, &make_entry(patient_id, AuditAction::Update, 12)).unwrap();
        insert_audit_log(&conn, &make_entry(patient_id, AuditAction::StatusChange, 10)).unwrap();

        let entries = list_audit_logs(&conn, Some(&patient_id)).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].action, AuditAction::Update);
        assert_eq!(entries[1].action, AuditAction::StatusChange);
        assert_eq!(entries[2].action, AuditAction::Create);
    }

    #[test]
    fn unfiltered_list_spans_patients() {
        let conn = open_memory_database().unwrap();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        insert_audit_log(&conn, &make_entry(a, AuditAction::Create, 8)).unwrap();
        insert_audit_log(&conn, &make_entry(b, AuditAction::Create, 9)).unwrap();

        let all = list_audit_logs(&conn, None).unwrap();
        assert_eq!(all.len(), 2);

        let only_a = list_audit_logs(&conn, Some(&a)).unwrap();
        assert_eq!(only_a.len(), 1);
        assert_eq!(only_a[0].patient_id, a);
    }

    #[test]
    fn field_level_values_round_trip() {
        let conn = open_memory_database().unwrap();
        let patient_id = Uuid::new_v4();
        let entry = AuditLog {
            field_name: Some("status".into()),
            old_value: Some("Inquiry".into()),
            new_value: Some("Active".into()),
            notes: Some("Status changed from Inquiry to Active".into()),
            ..make_entry(patient_id, AuditAction::StatusChange, 8)
        };
        insert_audit_log(&conn, &entry).unwrap();

        let loaded = list_audit_logs(&conn, Some(&patient_id)).unwrap();
        assert_eq!(loaded[0], entry);
    }
}
