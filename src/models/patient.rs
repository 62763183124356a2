use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{require_text, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: i64,
    pub full_name: String,
    pub phone: String,
    pub address: String,
    pub visit_date: NaiveDate,
    pub right_eye_power: String,
    pub left_eye_power: String,
    pub notes: String,
    pub registered_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Registration form payload. The store assigns `id` and `created_at`;
/// `registered_by` comes from the authenticated user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPatient {
    pub full_name: String,
    pub phone: String,
    pub address: String,
    pub visit_date: NaiveDate,
    #[serde(default)]
    pub right_eye_power: String,
    #[serde(default)]
    pub left_eye_power: String,
    #[serde(default)]
    pub notes: String,
}

impl NewPatient {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("full_name", &self.full_name)?;
        require_text("phone", &self.phone)?;
        require_text("address", &self.address)?;
        Ok(())
    }
}

/// Partial update: absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientUpdate {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub visit_date: Option<NaiveDate>,
    pub right_eye_power: Option<String>,
    pub left_eye_power: Option<String>,
    pub notes: Option<String>,
}

impl PatientUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.full_name {
            require_text("full_name", name)?;
        }
        if let Some(phone) = &self.phone {
            require_text("phone", phone)?;
        }
        if let Some(address) = &self.address {
            require_text("address", address)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl Patient {
    /// Overwrite the fields present in `update`.
    pub fn apply(&mut self, update: PatientUpdate) {
        if let Some(v) = update.full_name {
            self.full_name = v;
        }
        if let Some(v) = update.phone {
            self.phone = v;
        }
        if let Some(v) = update.address {
            self.address = v;
        }
        if let Some(v) = update.visit_date {
            self.visit_date = v;
        }
        if let Some(v) = update.right_eye_power {
            self.right_eye_power = v;
        }
        if let Some(v) = update.left_eye_power {
            self.left_eye_power = v;
        }
        if let Some(v) = update.notes {
            self.notes = v;
        }
    }

    /// Records-page filter: name (case-insensitive) or phone substring.
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim();
        if term.is_empty() {
            return true;
        }
        self.full_name.to_lowercase().contains(&term.to_lowercase()) || self.phone.contains(term)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Patient {
        Patient {
            id: 1,
            full_name: "Asha Verma".into(),
            phone: "9876543210".into(),
            address: "12 Lake Road".into(),
            visit_date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            right_eye_power: "-1.25".into(),
            left_eye_power: "-1.00".into(),
            notes: String::new(),
            registered_by: Some(1),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn new_patient_requires_name_phone_address() {
        let payload: NewPatient = serde_json::from_str(
            r#"{"full_name":"  ","phone":"1","address":"x","visit_date":"2025-01-02"}"#,
        )
        .unwrap();
        assert_eq!(payload.validate().unwrap_err().field, "full_name");

        let payload: NewPatient = serde_json::from_str(
            r#"{"full_name":"A","phone":"1","address":"","visit_date":"2025-01-02"}"#,
        )
        .unwrap();
        assert_eq!(payload.validate().unwrap_err().field, "address");
    }

    #[test]
    fn optional_clinical_fields_default_to_empty() {
        let payload: NewPatient = serde_json::from_str(
            r#"{"full_name":"A","phone":"1","address":"x","visit_date":"2025-01-02"}"#,
        )
        .unwrap();
        assert!(payload.validate().is_ok());
        assert_eq!(payload.right_eye_power, "");
        assert_eq!(payload.notes, "");
    }

    #[test]
    fn invalid_visit_date_fails_to_parse() {
        let result: Result<NewPatient, _> = serde_json::from_str(
            r#"{"full_name":"A","phone":"1","address":"x","visit_date":"14/03/2025"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn apply_only_touches_present_fields() {
        let mut patient = sample();
        patient.apply(PatientUpdate {
            notes: Some("Prefers anti-glare".into()),
            ..Default::default()
        });
        assert_eq!(patient.notes, "Prefers anti-glare");
        assert_eq!(patient.full_name, "Asha Verma");
        assert_eq!(patient.right_eye_power, "-1.25");
    }

    #[test]
    fn update_rejects_blank_required_field() {
        let update = PatientUpdate {
            phone: Some(" ".into()),
            ..Default::default()
        };
        assert_eq!(update.validate().unwrap_err().field, "phone");
        assert!(PatientUpdate::default().is_empty());
    }

    #[test]
    fn search_matches_name_case_insensitively_or_phone() {
        let patient = sample();
        assert!(patient.matches_search("asha"));
        assert!(patient.matches_search("VERMA"));
        assert!(patient.matches_search("98765"));
        assert!(patient.matches_search(""));
        assert!(!patient.matches_search("kumar"));
    }
}
