//! Authentication models

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::navigation;
use crate::resources::{validation, Validate, ValidationErrors};

/// User roles for authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Administrator - every area and resource
    Admin,
    /// Runs a single clinic: staff, stock, sales
    ClinicManager,
    /// Front desk - patients and appointments
    Secretary,
    Doctor,
    Optician,
    /// Registered account without a staff area
    User,
    /// Operator across all clinics, with its own login surface
    SuperAdmin,
}

impl Role {
    pub const ALL: [Role; 7] = [
        Role::Admin,
        Role::ClinicManager,
        Role::Secretary,
        Role::Doctor,
        Role::Optician,
        Role::User,
        Role::SuperAdmin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::ClinicManager => "CLINIC_MANAGER",
            Role::Secretary => "SECRETARY",
            Role::Doctor => "DOCTOR",
            Role::Optician => "OPTICIAN",
            Role::User => "USER",
            Role::SuperAdmin => "SUPER_ADMIN",
        }
    }

    /// Landing route after login and on visits to `/`
    pub fn home_route(&self) -> &'static str {
        match self {
            Role::Admin => "/admin",
            Role::ClinicManager => "/clinic-manager",
            Role::Secretary => "/secretary",
            Role::Doctor => "/doctor",
            Role::Optician => "/optician",
            Role::SuperAdmin => "/super-admin",
            Role::User => navigation::ROOT,
        }
    }

    pub fn is_elevated(&self) -> bool {
        *self == Role::SuperAdmin
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == normalized)
            .ok_or_else(|| format!("unknown role '{}'", s))
    }
}

/// Profile returned by the auth endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub clinic_id: Option<String>,
}

/// The client-held record of the authenticated user and credential
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user: UserProfile,
    pub token: String,
    /// Logged in through the super-admin surface
    pub elevated: bool,
    /// Clinic the session is scoped to; starts at the user's own clinic
    pub clinic_id: Option<String>,
}

impl Session {
    pub fn new(user: UserProfile, token: String, elevated: bool) -> Self {
        let clinic_id = user.clinic_id.clone();
        Self {
            user,
            token,
            elevated,
            clinic_id,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user.id
    }

    pub fn username(&self) -> &str {
        &self.user.username
    }

    pub fn role(&self) -> Role {
        self.user.role
    }
}

/// Login credentials
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: SecretString::from(password.into()),
        }
    }

    pub(crate) fn to_request(&self) -> LoginRequest<'_> {
        LoginRequest {
            email: self.email.trim(),
            password: self.password.expose_secret(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Validate for Credentials {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validation::email(&mut errors, "email", &self.email);
        if self.password.expose_secret().is_empty() {
            errors.add("password", "is required");
        }
        errors.into_result()
    }
}

/// Self-service account creation behind `/register`
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: SecretString,
}

impl Registration {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: SecretString::from(password.into()),
        }
    }

    pub(crate) fn to_request(&self) -> RegisterRequest<'_> {
        RegisterRequest {
            username: self.username.trim(),
            email: self.email.trim(),
            password: self.password.expose_secret(),
        }
    }
}

impl Validate for Registration {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validation::required(&mut errors, "username", &self.username);
        validation::email(&mut errors, "email", &self.email);
        if self.password.expose_secret().chars().count() < 8 {
            errors.add("password", "must be at least 8 characters");
        }
        errors.into_result()
    }
}

#[derive(Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Serialize)]
pub(crate) struct RegisterRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// Login response with token
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
}
