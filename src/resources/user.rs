use serde::{Deserialize, Serialize};
use std::fmt;

use super::validation::{self, Validate, ValidationErrors};
use super::{cell, Resource, ResourceKind};
use crate::auth::Role;

/// Staff account as managed from the users screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub clinic_id: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDraft {
    pub username: String,
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinic_id: Option<String>,
    /// Required by the server on create, optional on update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl fmt::Debug for UserDraft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserDraft")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("clinic_id", &self.clinic_id)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("active", &self.active)
            .finish()
    }
}

/// Roles that belong to exactly one clinic
fn is_clinic_staff(role: Role) -> bool {
    matches!(
        role,
        Role::ClinicManager | Role::Secretary | Role::Doctor | Role::Optician
    )
}

impl Validate for UserDraft {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validation::required(&mut errors, "username", &self.username);
        validation::email(&mut errors, "email", &self.email);
        if is_clinic_staff(self.role) {
            validation::required_opt(&mut errors, "clinicId", self.clinic_id.as_deref());
        }
        if let Some(password) = &self.password {
            if password.chars().count() < 8 {
                errors.add("password", "must be at least 8 characters");
            }
        }
        errors.into_result()
    }
}

impl Resource for UserAccount {
    type Draft = UserDraft;
    const KIND: ResourceKind = ResourceKind::Users;

    fn id(&self) -> &str {
        &self.id
    }

    fn headers() -> &'static [&'static str] {
        &["ID", "Username", "Email", "Role", "Clinic", "Active"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.username.clone(),
            self.email.clone(),
            self.role.to_string(),
            cell(self.clinic_id.as_deref()),
            if self.active { "yes" } else { "no" }.to_string(),
        ]
    }
}
