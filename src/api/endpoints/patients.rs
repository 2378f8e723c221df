//! Patient CRUD endpoints.

use std::str::FromStr;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::models::{
    PageRequest, Patient, PatientDraft, PatientFilter, PatientPatch, PatientSort, PatientStatus,
    SortDirection, SortField,
};
use crate::patients;
use crate::validation;

/// Query string for the listing. Everything arrives as strings so a bad
/// value yields a 400 naming the parameter instead of a blanket
/// deserialization failure.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    pub sort_field: Option<String>,
    pub sort_direction: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    pub patients: Vec<Patient>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    pub total_count: u64,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

/// GET /api/patients
pub async fn list(
    State(ctx): State<ApiContext>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, ApiError> {
    let filter = PatientFilter {
        search: query.search.filter(|s| !s.trim().is_empty()),
        status: query
            .status
            .as_deref()
            .map(|s| {
                PatientStatus::from_str(s)
                    .map_err(|_| ApiError::BadRequest(format!("Unknown status: {s}")))
            })
            .transpose()?,
        date_from: parse_date_param(query.date_from.as_deref(), "dateFrom")?,
        date_to: parse_date_param(query.date_to.as_deref(), "dateTo")?,
    };

    let sort = PatientSort {
        field: query
            .sort_field
            .as_deref()
            .map(|s| {
                SortField::from_str(s)
                    .map_err(|_| ApiError::BadRequest(format!("Unknown sortField: {s}")))
            })
            .transpose()?
            .unwrap_or_default(),
        direction: query
            .sort_direction
            .as_deref()
            .map(|s| {
                SortDirection::from_str(s)
                    .map_err(|_| ApiError::BadRequest(format!("Unknown sortDirection: {s}")))
            })
            .transpose()?
            .unwrap_or_default(),
    };

    let page = PageRequest::new(
        parse_u32_param(query.page.as_deref(), "page")?,
        parse_u32_param(query.page_size.as_deref(), "pageSize")?,
    );

    let conn = ctx.lock()?;
    let (patients, total_count) = patients::list_patients(&conn, &filter, &sort, &page)?;

    Ok(Json(ListResponse {
        patients,
        pagination: Pagination {
            page: page.page,
            page_size: page.page_size,
            total_count,
        },
    }))
}

/// POST /api/patients
pub async fn create(
    State(ctx): State<ApiContext>,
    payload: Result<Json<PatientDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Patient>), ApiError> {
    let Json(draft) = payload.map_err(reject_body)?;
    let errors = validation::validate_draft(&draft);
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let conn = ctx.lock()?;
    let patient = patients::create_patient(&conn, &draft)?;
    Ok((StatusCode::CREATED, Json(patient)))
}

/// GET /api/patients/:id
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<Patient>, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.lock()?;
    Ok(Json(patients::get_patient(&conn, &id)?))
}

/// PATCH /api/patients/:id
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    payload: Result<Json<PatientPatch>, JsonRejection>,
) -> Result<Json<Patient>, ApiError> {
    let id = parse_id(&id)?;
    let Json(patch) = payload.map_err(reject_body)?;
    if patch.is_empty() {
        return Err(ApiError::BadRequest("No fields to update".into()));
    }
    let errors = validation::validate_patch(&patch);
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let conn = ctx.lock()?;
    Ok(Json(patients::update_patient(&conn, &id, &patch)?))
}

/// DELETE /api/patients/:id
pub async fn remove(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.lock()?;
    patients::delete_patient(&conn, &id)?;
    Ok(Json(DeleteResponse { success: true }))
}

/// A missing or mistyped body field is a client error like any other and
/// gets the structured 400 body, not axum's plain-text 422.
fn reject_body(rejection: JsonRejection) -> ApiError {
    ApiError::BadRequest(rejection.body_text())
}

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("Invalid patient id: {raw}")))
}

fn parse_u32_param(raw: Option<&str>, name: &str) -> Result<Option<u32>, ApiError> {
    raw.map(|s| {
        s.parse::<u32>()
            .map_err(|_| ApiError::BadRequest(format!("Invalid {name}: {s}")))
    })
    .transpose()
}

fn parse_date_param(raw: Option<&str>, name: &str) -> Result<Option<NaiveDate>, ApiError> {
    raw.map(|s| {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|_| ApiError::BadRequest(format!("Invalid {name}: {s}")))
    })
    .transpose()
}
