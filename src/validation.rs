//! Request-body validation for patient payloads.
//!
//! Checks the field contract (required fields, lengths, formats) and
//! returns every violation at once so a client can surface them together.
//! Empty strings in optional fields are treated as absent and skip format
//! checks; the service normalizes them away before persisting.

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;

use crate::models::enums::PatientStatus;
use crate::models::patient::{AddressPatch, PatientDraft, PatientPatch};

static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date regex"));
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex"));
static ZIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{5}(-\d{4})?$").expect("zip regex"));

const NAME_MAX: usize = 255;
const STREET_MAX: usize = 255;
const CITY_STATE_COUNTRY_MAX: usize = 100;

/// One violated rule, addressed by the wire (camelCase) field name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub fn validate_draft(draft: &PatientDraft) -> Vec<FieldError> {
    let mut errors = Vec::new();

    required_name(&mut errors, "firstName", &draft.first_name);
    optional_name(&mut errors, "middleName", draft.middle_name.as_deref());
    required_name(&mut errors, "lastName", &draft.last_name);
    check_date_of_birth(&mut errors, &draft.date_of_birth);
    check_status(&mut errors, &draft.status);
    check_email(&mut errors, draft.email.as_deref());

    required_bounded(&mut errors, "addressStreet", &draft.address.street, STREET_MAX);
    required_bounded(
        &mut errors,
        "addressCity",
        &draft.address.city,
        CITY_STATE_COUNTRY_MAX,
    );
    required_bounded(
        &mut errors,
        "addressState",
        &draft.address.state,
        CITY_STATE_COUNTRY_MAX,
    );
    check_zip(&mut errors, &draft.address.zip_code);
    if let Some(country) = non_empty(draft.address.country.as_deref()) {
        if country.len() > CITY_STATE_COUNTRY_MAX {
            errors.push(FieldError::new(
                "addressCountry",
                format!("must be at most {CITY_STATE_COUNTRY_MAX} characters"),
            ));
        }
    }
    check_coordinates(
        &mut errors,
        draft.address.latitude,
        draft.address.longitude,
    );

    errors
}

pub fn validate_patch(patch: &PatientPatch) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if let Some(v) = &patch.first_name {
        required_name(&mut errors, "firstName", v);
    }
    if let Some(v) = &patch.middle_name {
        optional_name(&mut errors, "middleName", Some(v));
    }
    if let Some(v) = &patch.last_name {
        required_name(&mut errors, "lastName", v);
    }
    if let Some(v) = &patch.date_of_birth {
        check_date_of_birth(&mut errors, v);
    }
    if let Some(v) = &patch.status {
        check_status(&mut errors, v);
    }
    if patch.email.is_some() {
        check_email(&mut errors, patch.email.as_deref());
    }
    if let Some(address) = &patch.address {
        validate_address_patch(&mut errors, address);
    }

    errors
}

fn validate_address_patch(errors: &mut Vec<FieldError>, address: &AddressPatch) {
    if let Some(v) = &address.street {
        required_bounded(errors, "addressStreet", v, STREET_MAX);
    }
    if let Some(v) = &address.city {
        required_bounded(errors, "addressCity", v, CITY_STATE_COUNTRY_MAX);
    }
    if let Some(v) = &address.state {
        required_bounded(errors, "addressState", v, CITY_STATE_COUNTRY_MAX);
    }
    if let Some(v) = &address.zip_code {
        check_zip(errors, v);
    }
    if let Some(v) = &address.country {
        required_bounded(errors, "addressCountry", v, CITY_STATE_COUNTRY_MAX);
    }
    check_coordinates(errors, address.latitude, address.longitude);
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn required_name(errors: &mut Vec<FieldError>, field: &str, value: &str) {
    required_bounded(errors, field, value, NAME_MAX);
}

fn optional_name(errors: &mut Vec<FieldError>, field: &str, value: Option<&str>) {
    if let Some(v) = non_empty(value) {
        if v.len() > NAME_MAX {
            errors.push(FieldError::new(
                field,
                format!("must be at most {NAME_MAX} characters"),
            ));
        }
    }
}

fn required_bounded(errors: &mut Vec<FieldError>, field: &str, value: &str, max: usize) {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.push(FieldError::new(field, "is required"));
    } else if trimmed.len() > max {
        errors.push(FieldError::new(
            field,
            format!("must be at most {max} characters"),
        ));
    }
}

fn check_date_of_birth(errors: &mut Vec<FieldError>, value: &str) {
    if !DATE_RE.is_match(value) || NaiveDate::parse_from_str(value, "%Y-%m-%d").is_err() {
        errors.push(FieldError::new(
            "dateOfBirth",
            "must be a valid date in YYYY-MM-DD format",
        ));
    }
}

fn check_status(errors: &mut Vec<FieldError>, value: &str) {
    if PatientStatus::from_str(value).is_err() {
        errors.push(FieldError::new(
            "status",
            "must be one of Inquiry, Onboarding, Active, Churned",
        ));
    }
}

fn check_email(errors: &mut Vec<FieldError>, value: Option<&str>) {
    if let Some(email) = non_empty(value) {
        if !EMAIL_RE.is_match(email) {
            errors.push(FieldError::new("email", "must be a valid email address"));
        }
    }
}

fn check_zip(errors: &mut Vec<FieldError>, value: &str) {
    if !ZIP_RE.is_match(value.trim()) {
        errors.push(FieldError::new(
            "addressZipCode",
            "must match NNNNN or NNNNN-NNNN",
        ));
    }
}

fn check_coordinates(errors: &mut Vec<FieldError>, latitude: Option<f64>, longitude: Option<f64>) {
    if let Some(lat) = latitude {
        if !(-90.0..=90.0).contains(&lat) {
            errors.push(FieldError::new(
                "addressLatitude",
                "must be between -90 and 90",
            ));
        }
    }
    if let Some(lon) = longitude {
        if !(-180.0..=180.0).contains(&lon) {
            errors.push(FieldError::new(
                "addressLongitude",
                "must be between -180 and 180",
            ));
        }
    }
}
