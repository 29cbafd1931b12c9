use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::validation::{self, Validate, ValidationErrors};
use super::{cell, Resource, ResourceKind};

/// Refraction of one eye
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EyeMeasurement {
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub sphere: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub cylinder: Option<Decimal>,
    #[serde(default)]
    pub axis: Option<u16>,
    /// e.g. "10/10" or "20/40"
    #[serde(default)]
    pub visual_acuity: Option<String>,
}

impl EyeMeasurement {
    fn validate_into(&self, errors: &mut ValidationErrors, eye: &str) {
        if let Some(sphere) = self.sphere {
            validation::in_range(
                errors,
                &format!("{}.sphere", eye),
                sphere,
                Decimal::from(-30),
                Decimal::from(30),
            );
        }
        if let Some(cylinder) = self.cylinder {
            validation::in_range(
                errors,
                &format!("{}.cylinder", eye),
                cylinder,
                Decimal::from(-10),
                Decimal::from(10),
            );
        }
        match (self.cylinder, self.axis) {
            (_, Some(axis)) if axis > 180 => {
                errors.add(format!("{}.axis", eye), "must be between 0 and 180");
            }
            (Some(cyl), None) if !cyl.is_zero() => {
                errors.add(format!("{}.axis", eye), "is required with a cylinder");
            }
            _ => {}
        }
    }

    /// Short prescription notation, e.g. `-1.25 (-0.50 x 90)`
    pub fn notation(&self) -> String {
        let sphere = self
            .sphere
            .map(|s| format!("{:+.2}", s))
            .unwrap_or_else(|| "plano".to_string());
        match (self.cylinder, self.axis) {
            (Some(cyl), Some(axis)) if !cyl.is_zero() => {
                format!("{} ({:+.2} x {})", sphere, cyl, axis)
            }
            _ => sphere,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Examination {
    pub id: String,
    pub patient_id: String,
    #[serde(default)]
    pub visit_id: Option<String>,
    #[serde(default)]
    pub examiner_id: Option<String>,
    #[serde(default)]
    pub examined_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub right_eye: EyeMeasurement,
    #[serde(default)]
    pub left_eye: EyeMeasurement,
    #[serde(default)]
    pub diagnosis: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExaminationDraft {
    pub patient_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visit_id: Option<String>,
    #[serde(default)]
    pub right_eye: EyeMeasurement,
    #[serde(default)]
    pub left_eye: EyeMeasurement,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Validate for ExaminationDraft {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validation::required(&mut errors, "patientId", &self.patient_id);
        self.right_eye.validate_into(&mut errors, "rightEye");
        self.left_eye.validate_into(&mut errors, "leftEye");
        errors.into_result()
    }
}

impl Resource for Examination {
    type Draft = ExaminationDraft;
    const KIND: ResourceKind = ResourceKind::Examinations;

    fn id(&self) -> &str {
        &self.id
    }

    fn headers() -> &'static [&'static str] {
        &["ID", "Patient", "Date", "OD", "OS", "Diagnosis"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.patient_id.clone(),
            self.examined_at
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string()),
            self.right_eye.notation(),
            self.left_eye.notation(),
            cell(self.diagnosis.as_deref()),
        ]
    }
}
