use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{InvoiceStatus, ItemCategory};
use super::ValidationError;

/// One billable line. Owned by exactly one invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceItem {
    #[serde(default)]
    pub id: String,
    pub description: String,
    pub category: ItemCategory,
    pub quantity: u32,
    pub price: f64,
}

impl InvoiceItem {
    pub fn line_total(&self) -> f64 {
        f64::from(self.quantity) * self.price
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.quantity == 0 {
            return Err(ValidationError::new("quantity", "must be at least 1"));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(ValidationError::new("price", "must be a non-negative amount"));
        }
        Ok(())
    }
}

/// Stored invoice. `subtotal` and `total` are computed once at creation
/// and kept at full precision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,
    pub patient_id: i64,
    pub date: NaiveDate,
    pub items: Vec<InvoiceItem>,
    pub discount: f64,
    pub tax: f64,
    pub subtotal: f64,
    pub total: f64,
    pub status: InvoiceStatus,
    pub created_at: DateTime<Utc>,
}

/// Create-invoice payload. Client-side subtotal/total, if sent, are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInvoice {
    pub patient_id: i64,
    pub date: NaiveDate,
    pub items: Vec<InvoiceItem>,
    #[serde(default)]
    pub discount: f64,
    #[serde(default)]
    pub tax: f64,
    #[serde(default = "default_invoice_status")]
    pub status: InvoiceStatus,
}

fn default_invoice_status() -> InvoiceStatus {
    InvoiceStatus::Pending
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: u32, price: f64) -> InvoiceItem {
        InvoiceItem {
            id: String::new(),
            description: "Frame".into(),
            category: ItemCategory::Frames,
            quantity,
            price,
        }
    }

    #[test]
    fn line_total_multiplies_quantity_and_price() {
        assert_eq!(item(3, 12.5).line_total(), 37.5);
    }

    #[test]
    fn zero_quantity_rejected() {
        assert_eq!(item(0, 10.0).validate().unwrap_err().field, "quantity");
    }

    #[test]
    fn negative_or_nan_price_rejected() {
        assert_eq!(item(1, -0.01).validate().unwrap_err().field, "price");
        assert_eq!(item(1, f64::NAN).validate().unwrap_err().field, "price");
        assert!(item(1, 0.0).validate().is_ok());
    }

    #[test]
    fn new_invoice_defaults() {
        let payload: NewInvoice = serde_json::from_str(
            r#"{"patient_id":4,"date":"2025-06-01","items":[
                {"description":"Eye test","category":"checkup","quantity":1,"price":300}
            ],"subtotal":1,"total":1}"#,
        )
        .unwrap();
        assert_eq!(payload.status, InvoiceStatus::Pending);
        assert_eq!(payload.discount, 0.0);
        assert_eq!(payload.tax, 0.0);
        assert_eq!(payload.items[0].id, "");
    }

    #[test]
    fn negative_quantity_fails_to_parse() {
        let result: Result<InvoiceItem, _> = serde_json::from_str(
            r#"{"description":"x","category":"other","quantity":-1,"price":1}"#,
        );
        assert!(result.is_err());
    }
}
