use serde::{Deserialize, Serialize};

use super::validation::{self, Validate, ValidationErrors};
use super::{cell, Resource, ResourceKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clinic {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicDraft {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl Validate for ClinicDraft {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validation::required(&mut errors, "name", &self.name);
        if let Some(phone) = self.phone.as_deref().filter(|p| !p.trim().is_empty()) {
            validation::phone(&mut errors, "phone", phone);
        }
        validation::email_opt(&mut errors, "email", self.email.as_deref());
        errors.into_result()
    }
}

impl Resource for Clinic {
    type Draft = ClinicDraft;
    const KIND: ResourceKind = ResourceKind::Clinics;
    // A clinic list is never narrowed to the selected clinic
    const CLINIC_SCOPED: bool = false;

    fn id(&self) -> &str {
        &self.id
    }

    fn headers() -> &'static [&'static str] {
        &["ID", "Name", "Address", "Phone", "Active"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            cell(self.address.as_deref()),
            cell(self.phone.as_deref()),
            if self.active { "yes" } else { "no" }.to_string(),
        ]
    }
}
