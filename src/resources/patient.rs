use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::validation::{self, Validate, ValidationErrors};
use super::{cell, Resource, ResourceKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub clinic_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientDraft {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinic_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Validate for PatientDraft {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validation::required(&mut errors, "firstName", &self.first_name);
        validation::required(&mut errors, "lastName", &self.last_name);
        validation::phone(&mut errors, "phone", &self.phone);
        validation::email_opt(&mut errors, "email", self.email.as_deref());
        if let Some(dob) = self.date_of_birth {
            if dob > chrono::Utc::now().date_naive() {
                errors.add("dateOfBirth", "cannot be in the future");
            }
        }
        errors.into_result()
    }
}

impl Resource for Patient {
    type Draft = PatientDraft;
    const KIND: ResourceKind = ResourceKind::Patients;

    fn id(&self) -> &str {
        &self.id
    }

    fn headers() -> &'static [&'static str] {
        &["ID", "Name", "Phone", "Email", "Born"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.full_name(),
            self.phone.clone(),
            cell(self.email.as_deref()),
            self.date_of_birth
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string()),
        ]
    }
}
