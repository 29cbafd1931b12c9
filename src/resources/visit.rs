use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::validation::{self, Validate, ValidationErrors};
use super::{cell, Resource, ResourceKind};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VisitStatus {
    #[default]
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl fmt::Display for VisitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            VisitStatus::Scheduled => "scheduled",
            VisitStatus::InProgress => "in progress",
            VisitStatus::Completed => "completed",
            VisitStatus::Cancelled => "cancelled",
            VisitStatus::NoShow => "no show",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    pub id: String,
    pub patient_id: String,
    /// Display name joined by the server
    #[serde(default)]
    pub patient_name: Option<String>,
    #[serde(default)]
    pub doctor_id: Option<String>,
    #[serde(default)]
    pub clinic_id: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub reason: String,
    #[serde(default)]
    pub status: VisitStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitDraft {
    pub patient_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinic_id: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub reason: String,
    #[serde(default)]
    pub status: VisitStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Validate for VisitDraft {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validation::required(&mut errors, "patientId", &self.patient_id);
        validation::required(&mut errors, "reason", &self.reason);
        if self.status == VisitStatus::Scheduled && self.scheduled_at < Utc::now() - chrono::Duration::days(1) {
            errors.add("scheduledAt", "a scheduled visit cannot be in the past");
        }
        errors.into_result()
    }
}

impl Resource for Visit {
    type Draft = VisitDraft;
    const KIND: ResourceKind = ResourceKind::Visits;

    fn id(&self) -> &str {
        &self.id
    }

    fn headers() -> &'static [&'static str] {
        &["ID", "Patient", "When", "Reason", "Status"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            cell(self.patient_name.as_deref().or(Some(self.patient_id.as_str()))),
            self.scheduled_at.format("%Y-%m-%d %H:%M").to_string(),
            self.reason.clone(),
            self.status.to_string(),
        ]
    }
}
