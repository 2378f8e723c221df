//! Patient service — orchestrates repository calls, applies sparse update
//! patches, and emits field-level audit entries.
//!
//! Audit writes are best-effort: a failure after a successful primary write
//! is logged and never fails the operation. The trail is therefore not
//! guaranteed complete; the primary write is never held hostage to it.

use std::str::FromStr;

use chrono::{NaiveDate, SubsecRound, Utc};
use rusqlite::Connection;
use thiserror::Error;
use uuid::Uuid;

use crate::db::repository;
use crate::db::DatabaseError;
use crate::models::audit_log::AuditLog;
use crate::models::enums::{AuditAction, PatientStatus};
use crate::models::filters::{PageRequest, PatientFilter, PatientSort};
use crate::models::patient::{Address, Patient, PatientDraft, PatientPatch};

/// Actor recorded on every audit entry. There is no authentication; the
/// system acts as a single fixed principal.
pub const PERFORMED_BY: &str = "System";

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Patient not found: {0}")]
    NotFound(Uuid),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

pub fn list_patients(
    conn: &Connection,
    filter: &PatientFilter,
    sort: &PatientSort,
    page: &PageRequest,
) -> Result<(Vec<Patient>, u64), ServiceError> {
    Ok(repository::list_patients(conn, filter, sort, page)?)
}

pub fn get_patient(conn: &Connection, id: &Uuid) -> Result<Patient, ServiceError> {
    repository::get_patient(conn, id)?.ok_or(ServiceError::NotFound(*id))
}

/// Create a patient from a validated draft. The server assigns the id and
/// both timestamps (equal at creation), then records a CREATE audit entry.
pub fn create_patient(conn: &Connection, draft: &PatientDraft) -> Result<Patient, ServiceError> {
    let now = Utc::now().trunc_subsecs(0);
    let patient = Patient {
        id: Uuid::new_v4(),
        first_name: draft.first_name.trim().to_string(),
        middle_name: clean_opt(draft.middle_name.as_deref()),
        last_name: draft.last_name.trim().to_string(),
        date_of_birth: parse_date(&draft.date_of_birth)?,
        status: PatientStatus::from_str(&draft.status)?,
        email: clean_opt(draft.email.as_deref()),
        phone: clean_opt(draft.phone.as_deref()),
        address: Address {
            street: draft.address.street.trim().to_string(),
            city: draft.address.city.trim().to_string(),
            state: draft.address.state.trim().to_string(),
            zip_code: draft.address.zip_code.trim().to_string(),
            country: clean_opt(draft.address.country.as_deref()).unwrap_or_else(|| "USA".into()),
            latitude: draft.address.latitude,
            longitude: draft.address.longitude,
        },
        created_at: now,
        updated_at: now,
    };

    repository::insert_patient(conn, &patient)?;

    record_audit(
        conn,
        AuditLog {
            id: Uuid::new_v4(),
            patient_id: patient.id,
            action: AuditAction::Create,
            field_name: None,
            old_value: None,
            new_value: None,
            performed_by: PERFORMED_BY.into(),
            performed_at: now,
            notes: Some(format!(
                "Patient record created for {} {}",
                patient.first_name, patient.last_name
            )),
        },
    );

    Ok(patient)
}

/// Apply a sparse patch: load the aggregate, merge the supplied fields,
/// persist the whole row, then record one audit entry per field whose value
/// actually changed (STATUS_CHANGE for status, UPDATE otherwise).
pub fn update_patient(
    conn: &Connection,
    id: &Uuid,
    patch: &PatientPatch,
) -> Result<Patient, ServiceError> {
    let current = repository::get_patient(conn, id)?.ok_or(ServiceError::NotFound(*id))?;

    let mut merged = apply_patch(&current, patch)?;
    merged.updated_at = Utc::now().trunc_subsecs(0);

    if !repository::update_patient(conn, &merged)? {
        return Err(ServiceError::NotFound(*id));
    }

    for change in diff_patch(&current, &merged, patch) {
        let action = if change.field == "status" {
            AuditAction::StatusChange
        } else {
            AuditAction::Update
        };
        record_audit(
            conn,
            AuditLog {
                id: Uuid::new_v4(),
                patient_id: *id,
                action,
                field_name: Some(change.field.to_string()),
                old_value: change.old_value,
                new_value: change.new_value,
                performed_by: PERFORMED_BY.into(),
                performed_at: merged.updated_at,
                notes: None,
            },
        );
    }

    Ok(merged)
}

/// Delete a patient. The DELETE audit entry is written first and survives
/// the explicit cascade, which removes only the patient's field-level
/// entries.
pub fn delete_patient(conn: &Connection, id: &Uuid) -> Result<(), ServiceError> {
    let patient = repository::get_patient(conn, id)?.ok_or(ServiceError::NotFound(*id))?;

    record_audit(
        conn,
        AuditLog {
            id: Uuid::new_v4(),
            patient_id: *id,
            action: AuditAction::Delete,
            field_name: None,
            old_value: None,
            new_value: None,
            performed_by: PERFORMED_BY.into(),
            performed_at: Utc::now().trunc_subsecs(0),
            notes: Some(format!(
                "Patient record deleted for {} {}",
                patient.first_name, patient.last_name
            )),
        },
    );

    if !repository::delete_patient(conn, id)? {
        return Err(ServiceError::NotFound(*id));
    }
    Ok(())
}

/// One field-level difference produced by an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field: &'static str,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

/// Merge a sparse patch over the current aggregate. Only supplied fields
/// change; address sub-fields merge individually. Empty strings clear
/// optional fields.
pub fn apply_patch(current: &Patient, patch: &PatientPatch) -> Result<Patient, ServiceError> {
    let mut merged = current.clone();

    if let Some(v) = &patch.first_name {
        merged.first_name = v.trim().to_string();
    }
    if let Some(v) = &patch.middle_name {
        merged.middle_name = clean_opt(Some(v.as_str()));
    }
    if let Some(v) = &patch.last_name {
        merged.last_name = v.trim().to_string();
    }
    if let Some(v) = &patch.date_of_birth {
        merged.date_of_birth = parse_date(v)?;
    }
    if let Some(v) = &patch.status {
        merged.status = PatientStatus::from_str(v)?;
    }
    if let Some(v) = &patch.email {
        merged.email = clean_opt(Some(v.as_str()));
    }
    if let Some(v) = &patch.phone {
        merged.phone = clean_opt(Some(v.as_str()));
    }
    if let Some(address) = &patch.address {
        if let Some(v) = &address.street {
            merged.address.street = v.trim().to_string();
        }
        if let Some(v) = &address.city {
            merged.address.city = v.trim().to_string();
        }
        if let Some(v) = &address.state {
            merged.address.state = v.trim().to_string();
        }
        if let Some(v) = &address.zip_code {
            merged.address.zip_code = v.trim().to_string();
        }
        if let Some(v) = &address.country {
            merged.address.country = v.trim().to_string();
        }
        if let Some(v) = address.latitude {
            merged.address.latitude = Some(v);
        }
        if let Some(v) = address.longitude {
            merged.address.longitude = Some(v);
        }
    }

    Ok(merged)
}

/// Shallow, payload-driven diff: inspects only fields the patch supplied,
/// comparing the merged value against the snapshot and skipping equals.
/// Values are stringified for storage. Independent of persistence so it
/// tests separately.
pub fn diff_patch(current: &Patient, merged: &Patient, patch: &PatientPatch) -> Vec<FieldChange> {
    let mut changes = Vec::new();

    let mut push = |field: &'static str, old: Option<String>, new: Option<String>| {
        if old != new {
            changes.push(FieldChange {
                field,
                old_value: old,
                new_value: new,
            });
        }
    };

    if patch.first_name.is_some() {
        push(
            "firstName",
            Some(current.first_name.clone()),
            Some(merged.first_name.clone()),
        );
    }
    if patch.middle_name.is_some() {
        push(
            "middleName",
            current.middle_name.clone(),
            merged.middle_name.clone(),
        );
    }
    if patch.last_name.is_some() {
        push(
            "lastName",
            Some(current.last_name.clone()),
            Some(merged.last_name.clone()),
        );
    }
    if patch.date_of_birth.is_some() {
        push(
            "dateOfBirth",
            Some(current.date_of_birth.to_string()),
            Some(merged.date_of_birth.to_string()),
        );
    }
    if patch.status.is_some() {
        push(
            "status",
            Some(current.status.as_str().to_string()),
            Some(merged.status.as_str().to_string()),
        );
    }
    if patch.email.is_some() {
        push("email", current.email.clone(), merged.email.clone());
    }
    if patch.phone.is_some() {
        push("phone", current.phone.clone(), merged.phone.clone());
    }

    if let Some(address) = &patch.address {
        if address.street.is_some() {
            push(
                "addressStreet",
                Some(current.address.street.clone()),
                Some(merged.address.street.clone()),
            );
        }
        if address.city.is_some() {
            push(
                "addressCity",
                Some(current.address.city.clone()),
                Some(merged.address.city.clone()),
            );
        }
        if address.state.is_some() {
            push(
                "addressState",
                Some(current.address.state.clone()),
                Some(merged.address.state.clone()),
            );
        }
        if address.zip_code.is_some() {
            push(
                "addressZipCode",
                Some(current.address.zip_code.clone()),
                Some(merged.address.zip_code.clone()),
            );
        }
        if address.country.is_some() {
            push(
                "addressCountry",
                Some(current.address.country.clone()),
                Some(merged.address.country.clone()),
            );
        }
        if address.latitude.is_some() {
            push(
                "addressLatitude",
                current.address.latitude.map(|v| v.to_string()),
                merged.address.latitude.map(|v| v.to_string()),
            );
        }
        if address.longitude.is_some() {
            push(
                "addressLongitude",
                current.address.longitude.map(|v| v.to_string()),
                merged.address.longitude.map(|v| v.to_string()),
            );
        }
    }

    changes
}

/// Best-effort audit write: log and move on when it fails.
fn record_audit(conn: &Connection, entry: AuditLog) {
    if let Err(e) = repository::insert_audit_log(conn, &entry) {
        tracing::warn!(
            patient_id = %entry.patient_id,
            action = entry.action.as_str(),
            "audit log write failed: {e}"
        );
    }
}

fn clean_opt(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn parse_date(value: &str) -> Result<NaiveDate, ServiceError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| {
        ServiceError::Database(DatabaseError::ConstraintViolation(format!(
            "invalid date: {e}"
        )))
    })
}
