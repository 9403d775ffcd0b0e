//! Supplier models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Manufacturer or forwarder
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SupplierType {
    #[default]
    Manufacturer,
    Forwarder,
}

impl std::fmt::Display for SupplierType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SupplierType::Manufacturer => write!(f, "Manufacturer"),
            SupplierType::Forwarder => write!(f, "Forwarder"),
        }
    }
}

/// How a supplier is paid
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[default]
    TelegraphicTransfer,
    Other,
}

/// A supplier as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub tin: Option<String>,
    #[serde(default)]
    pub supplier_type: SupplierType,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub contact_person: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(flatten)]
    pub banking: BankingDetails,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Method-specific payment fields
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct BankingDetails {
    /// Telegraphic transfer
    #[serde(default)]
    pub bank_name: Option<String>,
    #[serde(default)]
    pub bank_account_name: Option<String>,
    #[serde(default)]
    pub bank_account_number: Option<String>,
    #[serde(default)]
    pub swift_code: Option<String>,
    #[serde(default)]
    pub bank_address: Option<String>,
    /// Any other payment method
    #[serde(default)]
    pub payment_details: Option<String>,
}

/// Supplier terms captured when a quotation is created.
///
/// Later edits to the supplier never change an existing quotation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SupplierSnapshot {
    pub supplier_id: Uuid,
    pub name: String,
    pub supplier_type: SupplierType,
    #[serde(default)]
    pub contact_person: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    pub payment_method: PaymentMethod,
    #[serde(flatten)]
    pub banking: BankingDetails,
}

impl From<&Supplier> for SupplierSnapshot {
    fn from(supplier: &Supplier) -> Self {
        let address = [&supplier.address, &supplier.city, &supplier.country]
            .iter()
            .filter_map(|part| part.as_deref())
            .filter(|part| !part.trim().is_empty())
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            supplier_id: supplier.id,
            name: supplier.name.clone(),
            supplier_type: supplier.supplier_type,
            contact_person: supplier.contact_person.clone(),
            email: supplier.email.clone(),
            phone: supplier.phone.clone(),
            address: (!address.is_empty()).then_some(address),
            payment_method: supplier.payment_method,
            banking: supplier.banking.clone(),
        }
    }
}

/// Input for creating or editing a supplier
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_banking_details", skip_on_field_errors = false))]
pub struct SupplierInput {
    #[validate(length(min = 1, message = "Supplier name is required"))]
    pub name: String,
    pub tin: Option<String>,
    pub supplier_type: SupplierType,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub contact_person: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub payment_method: PaymentMethod,
    #[serde(flatten)]
    pub banking: BankingDetails,
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

/// Telegraphic transfers need full bank coordinates
fn validate_banking_details(input: &SupplierInput) -> Result<(), ValidationError> {
    if input.payment_method != PaymentMethod::TelegraphicTransfer {
        return Ok(());
    }

    let banking = &input.banking;
    if is_blank(&banking.bank_name)
        || is_blank(&banking.bank_account_name)
        || is_blank(&banking.bank_account_number)
        || is_blank(&banking.swift_code)
    {
        let mut error = ValidationError::new("telegraphic_transfer_details");
        error.message = Some(
            "Bank name, account name, account number and SWIFT code are required for telegraphic transfer"
                .into(),
        );
        return Err(error);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tt_input() -> SupplierInput {
        SupplierInput {
            name: "Shenzhen Parts Co".into(),
            supplier_type: SupplierType::Manufacturer,
            email: Some("sales@parts.example.com".into()),
            payment_method: PaymentMethod::TelegraphicTransfer,
            banking: BankingDetails {
                bank_name: Some("Bank of Example".into()),
                bank_account_name: Some("Shenzhen Parts Co".into()),
                bank_account_number: Some("001-234".into()),
                swift_code: Some("EXAMCNSH".into()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_tt_supplier() {
        assert!(tt_input().validate().is_ok());
    }

    #[test]
    fn test_tt_requires_bank_fields() {
        let mut input = tt_input();
        input.banking.swift_code = None;
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_other_method_skips_bank_fields() {
        let input = SupplierInput {
            name: "Local Forwarder".into(),
            supplier_type: SupplierType::Forwarder,
            payment_method: PaymentMethod::Other,
            ..Default::default()
        };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_name_and_email_checked() {
        let mut input = tt_input();
        input.name = String::new();
        input.email = Some("not-an-email".into());
        let errors = input.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("email"));
    }

    #[test]
    fn test_snapshot_joins_address() {
        let supplier = Supplier {
            id: Uuid::new_v4(),
            name: "Acme".into(),
            tin: None,
            supplier_type: SupplierType::Forwarder,
            address: Some("1 Harbour Rd".into()),
            city: Some("Hong Kong".into()),
            country: None,
            contact_person: Some("Li".into()),
            email: None,
            phone: None,
            payment_method: PaymentMethod::Other,
            banking: BankingDetails::default(),
            created_at: None,
        };

        let snapshot = SupplierSnapshot::from(&supplier);
        assert_eq!(snapshot.supplier_id, supplier.id);
        assert_eq!(snapshot.address.as_deref(), Some("1 Harbour Rd, Hong Kong"));
        assert_eq!(snapshot.supplier_type, SupplierType::Forwarder);
    }
}
