use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::validation::{self, Validate, ValidationErrors};
use super::{cell, Resource, ResourceKind};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    Insurance,
    Transfer,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Insurance => "insurance",
            PaymentMethod::Transfer => "transfer",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    pub product_id: String,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
}

impl SaleItem {
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,
    #[serde(default)]
    pub patient_id: Option<String>,
    #[serde(default)]
    pub clinic_id: Option<String>,
    #[serde(default)]
    pub items: Vec<SaleItem>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub sold_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinic_id: Option<String>,
    pub items: Vec<SaleItem>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

impl SaleDraft {
    pub fn total(&self) -> Decimal {
        self.items.iter().map(SaleItem::subtotal).sum()
    }
}

impl Validate for SaleDraft {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.items.is_empty() {
            errors.add("items", "at least one item is required");
        }
        for (i, item) in self.items.iter().enumerate() {
            validation::required(&mut errors, &format!("items[{}].productId", i), &item.product_id);
            if item.quantity == 0 {
                errors.add(format!("items[{}].quantity", i), "must be at least 1");
            }
            validation::non_negative(&mut errors, &format!("items[{}].unitPrice", i), item.unit_price);
        }
        errors.into_result()
    }
}

impl Resource for Sale {
    type Draft = SaleDraft;
    const KIND: ResourceKind = ResourceKind::Sales;

    fn id(&self) -> &str {
        &self.id
    }

    fn headers() -> &'static [&'static str] {
        &["ID", "Patient", "Items", "Total", "Payment", "Date"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            cell(self.patient_id.as_deref()),
            self.items.len().to_string(),
            format!("{:.2}", self.total),
            self.payment_method.to_string(),
            self.sold_at
                .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string()),
        ]
    }
}
