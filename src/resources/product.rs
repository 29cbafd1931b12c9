use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::validation::{self, Validate, ValidationErrors};
use super::{cell, Resource, ResourceKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub sku: Option<String>,
    /// frames, lenses, contact lenses, accessories...
    #[serde(default)]
    pub category: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub clinic_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub stock: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinic_id: Option<String>,
}

impl Validate for ProductDraft {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validation::required(&mut errors, "name", &self.name);
        validation::non_negative(&mut errors, "price", self.price);
        if let Some(sku) = &self.sku {
            if sku.chars().any(char::is_whitespace) {
                errors.add("sku", "must not contain spaces");
            }
        }
        errors.into_result()
    }
}

impl Resource for Product {
    type Draft = ProductDraft;
    const KIND: ResourceKind = ResourceKind::Products;

    fn id(&self) -> &str {
        &self.id
    }

    fn headers() -> &'static [&'static str] {
        &["ID", "Name", "SKU", "Category", "Price", "Stock"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            cell(self.sku.as_deref()),
            cell(self.category.as_deref()),
            format!("{:.2}", self.price),
            self.stock.to_string(),
        ]
    }
}
