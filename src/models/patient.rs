use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::PatientStatus;

/// Postal address embedded in a patient record. A patient has exactly one;
/// it has no lifecycle of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

/// A patient record as stored and served.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: Uuid,
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub status: PatientStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub address: Address,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Address sub-object of a creation payload. `country` defaults to USA,
/// matching the schema default.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressDraft {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Full creation payload. Dates and status arrive as strings and are
/// checked by `validation` before conversion, so malformed input produces
/// a field-level 400 rather than a deserialization failure.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientDraft {
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub date_of_birth: String,
    pub status: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: AddressDraft,
}

/// Sparse update payload: only supplied fields change. Address sub-fields
/// merge individually over the current address.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientPatch {
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub status: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<AddressPatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressPatch {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl PatientPatch {
    /// True when the payload carries nothing to change.
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.middle_name.is_none()
            && self.last_name.is_none()
            && self.date_of_birth.is_none()
            && self.status.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self
                .address
                .as_ref()
                .map(|a| {
                    a.street.is_none()
                        && a.city.is_none()
                        && a.state.is_none()
                        && a.zip_code.is_none()
                        && a.country.is_none()
                        && a.latitude.is_none()
                        && a.longitude.is_none()
                })
                .unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patient_serializes_camel_case() {
        let patient = Patient {
            id: Uuid::new_v4(),
            first_name: "Ada".into(),
            middle_name: None,
            last_name: "Lovelace".into(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 12, 10).unwrap(),
            status: PatientStatus::Active,
            email: Some("ada@example.com".into()),
            phone: None,
            address: Address {
                street: "1 Analytical Way".into(),
                city: "London".into(),
                state: "LN".into(),
                zip_code: "12345".into(),
                country: "USA".into(),
                latitude: None,
                longitude: None,
            },
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&patient).unwrap();
        assert_eq!(json["firstName"], "Ada");
        assert_eq!(json["dateOfBirth"], "1990-12-10");
        assert_eq!(json["status"], "Active");
        assert_eq!(json["address"]["zipCode"], "12345");
        assert!(json.get("middleName").is_none());
    }

    #[test]
    fn empty_patch_detected() {
        assert!(PatientPatch::default().is_empty());
        assert!(PatientPatch {
            address: Some(AddressPatch::default()),
            ..Default::default()
        }
        .is_empty());
        assert!(!PatientPatch {
            phone: Some("555-0100".into()),
            ..Default::default()
        }
        .is_empty());
    }
}
