//! Field-level form validation
//!
//! Drafts are checked locally before any request is built; a failing draft never
//! reaches the server.

use regex::Regex;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$")
        .expect("Invalid regex pattern - this is a bug in the codebase")
});

static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+?[0-9() -]{6,20}$")
        .expect("Invalid regex pattern - this is a bug in the codebase")
});

/// Errors keyed by field name, one message per field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<String, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error; the first message for a field is kept
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .fields
            .iter()
            .map(|(field, message)| format!("{} {}", field, message))
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

impl std::error::Error for ValidationErrors {}

/// Something a form can check before submitting
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

pub fn required(errors: &mut ValidationErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.add(field, "is required");
    }
}

pub fn required_opt(errors: &mut ValidationErrors, field: &str, value: Option<&str>) {
    required(errors, field, value.unwrap_or_default());
}

pub fn email(errors: &mut ValidationErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.add(field, "is required");
    } else if !EMAIL_RE.is_match(value.trim()) {
        errors.add(field, "is not a valid email address");
    }
}

/// Optional email: only checked when present
pub fn email_opt(errors: &mut ValidationErrors, field: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
        email(errors, field, value);
    }
}

pub fn phone(errors: &mut ValidationErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.add(field, "is required");
    } else if !PHONE_RE.is_match(value.trim())
        || value.chars().filter(char::is_ascii_digit).count() < 6
    {
        errors.add(field, "is not a valid phone number");
    }
}

pub fn non_negative(errors: &mut ValidationErrors, field: &str, value: Decimal) {
    if value.is_sign_negative() && !value.is_zero() {
        errors.add(field, "must not be negative");
    }
}

pub fn in_range(errors: &mut ValidationErrors, field: &str, value: Decimal, min: Decimal, max: Decimal) {
    if value < min || value > max {
        errors.add(field, format!("must be between {} and {}", min, max));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_message_wins() {
        let mut errors = ValidationErrors::new();
        errors.add("email", "is required");
        errors.add("email", "is not a valid email address");
        assert_eq!(errors.get("email"), Some("is required"));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_display_lists_fields_in_order() {
        let mut errors = ValidationErrors::new();
        errors.add("phone", "is required");
        errors.add("email", "is required");
        assert_eq!(errors.to_string(), "email is required; phone is required");
    }

    #[test]
    fn test_email_rules() {
        let mut errors = ValidationErrors::new();
        email(&mut errors, "a", "someone@clinic.test");
        email_opt(&mut errors, "b", None);
        email_opt(&mut errors, "c", Some(""));
        assert!(errors.is_empty());

        email(&mut errors, "d", "someone@clinic");
        assert_eq!(errors.get("d"), Some("is not a valid email address"));
    }

    #[test]
    fn test_phone_rules() {
        let mut errors = ValidationErrors::new();
        phone(&mut errors, "ok1", "+212 600-123456");
        phone(&mut errors, "ok2", "(555) 123 4567");
        assert!(errors.is_empty());

        phone(&mut errors, "bad", "call me");
        assert!(errors.get("bad").is_some());
    }

    #[test]
    fn test_numeric_rules() {
        let mut errors = ValidationErrors::new();
        non_negative(&mut errors, "price", Decimal::ZERO);
        in_range(&mut errors, "axis", Decimal::from(90), Decimal::ZERO, Decimal::from(180));
        assert!(errors.is_empty());

        non_negative(&mut errors, "price", Decimal::new(-1, 2));
        in_range(&mut errors, "axis", Decimal::from(181), Decimal::ZERO, Decimal::from(180));
        assert_eq!(errors.len(), 2);
    }
}
