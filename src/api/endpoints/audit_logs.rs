//! Audit trail endpoint.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::audit;
use crate::models::AuditLog;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditQuery {
    pub patient_id: Option<String>,
}

/// GET /api/audit-logs — newest first, optionally scoped by `patientId`.
pub async fn list(
    State(ctx): State<ApiContext>,
    Query(query): Query<AuditQuery>,
) -> Result<Json<Vec<AuditLog>>, ApiError> {
    let patient_id = query
        .patient_id
        .as_deref()
        .map(|raw| {
            Uuid::parse_str(raw)
                .map_err(|_| ApiError::BadRequest(format!("Invalid patientId: {raw}")))
        })
        .transpose()?;

    let conn = ctx.lock()?;
    Ok(Json(audit::list_audit_logs(&conn, patient_id.as_ref())?))
}
