use std::str::FromStr;

use chrono::{Days, NaiveDate};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::PatientStatus;
use crate::models::filters::{PageRequest, PatientFilter, PatientSort};
use crate::models::patient::{Address, Patient};

use super::{format_ts, parse_ts};

const PATIENT_COLUMNS: &str = "id, first_name, middle_name, last_name, date_of_birth, status, \
     email, phone, address_street, address_city, address_state, address_zip_code, \
     address_country, address_latitude, address_longitude, created_at, updated_at";

pub fn insert_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patients (id, first_name, middle_name, last_name, date_of_birth, status,
         email, phone, address_street, address_city, address_state, address_zip_code,
         address_country, address_latitude, address_longitude, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        params![
            patient.id.to_string(),
            patient.first_name,
            patient.middle_name,
            patient.last_name,
            patient.date_of_birth.to_string(),
            patient.status.as_str(),
            patient.email,
            patient.phone,
            patient.address.street,
            patient.address.city,
            patient.address.state,
            patient.address.zip_code,
            patient.address.country,
            patient.address.latitude,
            patient.address.longitude,
            format_ts(&patient.created_at),
            format_ts(&patient.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_patient(conn: &Connection, id: &Uuid) -> Result<Option<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?1"
    ))?;

    let result = stmt.query_row(params![id.to_string()], map_patient_row);

    match result {
        Ok(row) => Ok(Some(patient_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Persist the whole (already merged) aggregate. Returns false when no row
/// with this id exists.
pub fn update_patient(conn: &Connection, patient: &Patient) -> Result<bool, DatabaseError> {
    let affected = conn.execute(
        "UPDATE patients SET first_name = ?2, middle_name = ?3, last_name = ?4,
         date_of_birth = ?5, status = ?6, email = ?7, phone = ?8,
         address_street = ?9, address_city = ?10, address_state = ?11,
         address_zip_code = ?12, address_country = ?13, address_latitude = ?14,
         address_longitude = ?15, updated_at = ?16
         WHERE id = ?1",
        params![
            patient.id.to_string(),
            patient.first_name,
            patient.middle_name,
            patient.last_name,
            patient.date_of_birth.to_string(),
            patient.status.as_str(),
            patient.email,
            patient.phone,
            patient.address.street,
            patient.address.city,
            patient.address.state,
            patient.address.zip_code,
            patient.address.country,
            patient.address.latitude,
            patient.address.longitude,
            format_ts(&patient.updated_at),
        ],
    )?;
    Ok(affected > 0)
}

/// Delete a patient and cascade its audit trail explicitly, sparing
/// DELETE-action rows so the deletion itself stays on record. Returns false
/// when no row with this id exists.
pub fn delete_patient(conn: &Connection, id: &Uuid) -> Result<bool, DatabaseError> {
    conn.execute(
        "DELETE FROM audit_logs WHERE patient_id = ?1 AND action != 'DELETE'",
        params![id.to_string()],
    )?;
    let affected = conn.execute("DELETE FROM patients WHERE id = ?1", params![id.to_string()])?;
    Ok(affected > 0)
}

/// Filtered, sorted, paginated listing plus the total match count.
///
/// Both queries consume the same predicate list; the count ignores
/// pagination. ORDER BY text comes from `PatientSort` (a fixed allow-list),
/// all filter values are bound parameters.
pub fn list_patients(
    conn: &Connection,
    filter: &PatientFilter,
    sort: &PatientSort,
    page: &PageRequest,
) -> Result<(Vec<Patient>, u64), DatabaseError> {
    let (where_sql, where_params) = build_where(filter);

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM patients{where_sql}"),
        params_from_iter(where_params.iter()),
        |row| row.get(0),
    )?;

    let mut stmt = conn.prepare(&format!(
        "SELECT {PATIENT_COLUMNS} FROM patients{where_sql} ORDER BY {} LIMIT ? OFFSET ?",
        sort.order_by()
    ))?;

    let mut data_params = where_params;
    data_params.push(Value::from(page.limit()));
    data_params.push(Value::from(page.offset()));

    let rows = stmt.query_map(params_from_iter(data_params.iter()), map_patient_row)?;

    let mut patients = Vec::new();
    for row in rows {
        patients.push(patient_from_row(row?)?);
    }
    Ok((patients, total as u64))
}

/// Assemble the WHERE clause from the present filter predicates, ANDed.
fn build_where(filter: &PatientFilter) -> (String, Vec<Value>) {
    let mut clauses: Vec<String> = Vec::new();
    let mut params: Vec<Value> = Vec::new();

    if let Some(search) = filter.search.as_deref().map(str::trim) {
        if !search.is_empty() {
            let escaped = escape_like(search);
            let pattern = format!("%{}%", escaped.to_lowercase());
            clauses.push(
                "(LOWER(first_name) LIKE ? ESCAPE '\\' \
                 OR LOWER(COALESCE(middle_name, '')) LIKE ? ESCAPE '\\' \
                 OR LOWER(last_name) LIKE ? ESCAPE '\\' \
                 OR LOWER(COALESCE(email, '')) LIKE ? ESCAPE '\\' \
                 OR COALESCE(phone, '') LIKE ? ESCAPE '\\')"
                    .into(),
            );
            for _ in 0..4 {
                params.push(Value::from(pattern.clone()));
            }
            params.push(Value::from(format!("%{escaped}%")));
        }
    }

    if let Some(status) = &filter.status {
        clauses.push("status = ?".into());
        params.push(Value::from(status.as_str().to_string()));
    }

    if let Some(from) = &filter.date_from {
        clauses.push("created_at >= ?".into());
        params.push(Value::from(from.to_string()));
    }

    if let Some(to) = &filter.date_to {
        // Inclusive end: everything before the following midnight.
        clauses.push("created_at < ?".into());
        let next = to.checked_add_days(Days::new(1)).unwrap_or(*to);
        params.push(Value::from(next.to_string()));
    }

    if clauses.is_empty() {
        (String::new(), params)
    } else {
        (format!(" WHERE {}", clauses.join(" AND ")), params)
    }
}

/// Neutralize LIKE metacharacters so the search term matches literally.
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

struct PatientRow {
    id: String,
    first_name: String,
    middle_name: Option<String>,
    last_name: String,
    date_of_birth: String,
    status: String,
    email: Option<String>,
    phone: Option<String>,
    address_street: String,
    address_city: String,
    address_state: String,
    address_zip_code: String,
    address_country: String,
    address_latitude: Option<f64>,
    address_longitude: Option<f64>,
    created_at: String,
    updated_at: String,
}

fn map_patient_row(row: &rusqlite::Row<'_>) -> Result<PatientRow, rusqlite::Error> {
    Ok(PatientRow {
        id: row.get(0)?,
        first_name: row.get(1)?,
        middle_name: row.get(2)?,
        last_name: row.get(3)?,
        date_of_birth: row.get(4)?,
        status: row.get(5)?,
        email: row.get(6)?,
        phone: row.get(7)?,
        address_street: row.get(8)?,
        address_city: row.get(9)?,
        address_state: row.get(10)?,
        address_zip_code: row.get(11)?,
        address_country: row.get(12)?,
        address_latitude: row.get(13)?,
        address_longitude: row.get(14)?,
        created_at: row.get(15)?,
        updated_at: row.get(16)?,
    })
}

fn patient_from_row(row: PatientRow) -> Result<Patient, DatabaseError> {
    Ok(Patient {
        id: Uuid::parse_str(&row.id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        first_name: row.first_name,
        middle_name: row.middle_name,
        last_name: row.last_name,
        date_of_birth: NaiveDate::parse_from_str(&row.date_of_birth, "%Y-%m-%d").map_err(|e| {
            DatabaseError::ConstraintViolation(format!("bad date {:?}: {e}", row.date_of_birth))
        })?,
        status: PatientStatus::from_str(&row.status)?,
        email: row.email,
        phone: row.phone,
        address: Address {
            street: row.address_street,
            city: row.address_city,
            state: row.address_state,
            zip_code: row.address_zip_code,
            country: row.address_country,
            latitude: row.address_latitude,
            longitude: row.address_longitude,
        },
        created_at: parse_ts(&row.created_at)?,
        updated_at: parse_ts(&row.updated_at)?,
    })
}
