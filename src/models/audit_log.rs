use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::AuditAction;

/// One immutable entry in the audit trail: a field-level change or a
/// lifecycle event (create/delete) on a patient. Never updated, never
/// individually deleted by the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub action: AuditAction,
    pub field_name: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub performed_by: String,
    pub performed_at: DateTime<Utc>,
    pub notes: Option<String>,
}
