//! Declarative marketplace adapter configuration.
//!
//! Each marketplace export is described by column names and a handful of
//! monetary rules; a single engine in `ordersheet-ingest` executes them. The
//! shipped definitions live in `config/platforms.yaml`.

use std::collections::HashSet;
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Selector used on the command line, e.g. `"coupang"`.
    pub code: String,
    /// Human-readable marketplace name.
    pub label: String,
    /// Suffix of every key built for this platform and the value of the
    /// platform column.
    pub tag: String,
    #[serde(default)]
    pub workbook: WorkbookLayout,
    pub customer: CustomerColumns,
    pub order: OrderColumns,
    pub delivery: DeliveryColumns,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkbookLayout {
    /// Number of rows above the header row.
    #[serde(default)]
    pub header_row: u32,
    /// Sheet to read; the first sheet when absent.
    #[serde(default)]
    pub sheet: Option<String>,
    /// The marketplace ships password-protected exports that must be
    /// decrypted before upload.
    #[serde(default)]
    pub encrypted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerColumns {
    pub phone: String,
    #[serde(default)]
    pub external_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub secondary_phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderColumns {
    pub order_id: String,
    pub product_id: String,
    pub option_name: String,
    pub ordered_at: String,
    pub paid_at: String,
    pub sale: SaleRule,
    pub discount: DiscountRule,
    pub fee: FeeRule,
    pub settlement: SettlementRule,
    pub shipping_fee: String,
    pub quantity: String,
    #[serde(default)]
    pub gift: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryColumns {
    pub address: String,
    pub postal_code: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub pickup: Option<String>,
    pub recipient_phone: String,
    #[serde(default)]
    pub recipient_secondary_phone: Option<String>,
    pub recipient_name: String,
}

/// How the gross sale amount of an order line is obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SaleRule {
    /// Taken verbatim from one column.
    Column { column: String },
    /// `(sum of unit price columns) * quantity column`.
    UnitPrice {
        columns: Vec<String>,
        quantity: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiscountRule {
    /// Sum of the named discount columns.
    Columns { columns: Vec<String> },
    /// Discount registered for the product in the option reference table.
    Reference,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeeRule {
    Zero,
    /// Sum of the named fee columns.
    Columns { columns: Vec<String> },
    /// Fixed share of the sale amount, rounded half-up to whole units.
    Rate {
        #[serde(with = "rust_decimal::serde::str")]
        rate: Decimal,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SettlementRule {
    /// Pre-computed by the marketplace.
    Column { column: String },
    /// `sale - discount - fee`.
    Computed,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlatformsFile {
    pub platforms: Vec<PlatformConfig>,
}

impl PlatformsFile {
    /// Looks a platform up by code or tag, ignoring ASCII case.
    #[must_use]
    pub fn find(&self, code: &str) -> Option<&PlatformConfig> {
        self.platforms
            .iter()
            .find(|p| p.code.eq_ignore_ascii_case(code) || p.tag == code)
    }
}

/// Load and validate the platform definitions from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_platforms(path: &Path) -> Result<PlatformsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::PlatformsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_platforms(&content)
}

/// Parse and validate platform definitions from YAML text.
///
/// # Errors
///
/// Returns `ConfigError` if the text cannot be parsed or fails validation.
pub fn parse_platforms(yaml: &str) -> Result<PlatformsFile, ConfigError> {
    let file: PlatformsFile = serde_yaml::from_str(yaml)?;
    validate_platforms(&file)?;
    Ok(file)
}

fn validate_platforms(file: &PlatformsFile) -> Result<(), ConfigError> {
    if file.platforms.is_empty() {
        return Err(ConfigError::Validation(
            "at least one platform must be defined".to_string(),
        ));
    }

    let mut seen_codes = HashSet::new();
    let mut seen_tags = HashSet::new();

    for p in &file.platforms {
        for (field, value) in [("code", &p.code), ("label", &p.label), ("tag", &p.tag)] {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "platform {field} must be non-empty"
                )));
            }
        }

        if !seen_codes.insert(p.code.to_ascii_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate platform code: '{}'",
                p.code
            )));
        }
        if !seen_tags.insert(p.tag.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate platform tag: '{}' (from platform '{}')",
                p.tag, p.code
            )));
        }

        validate_columns(p)?;
    }

    Ok(())
}

fn validate_columns(p: &PlatformConfig) -> Result<(), ConfigError> {
    let o = &p.order;
    let d = &p.delivery;
    let c = &p.customer;

    let mut required: Vec<(&str, &str)> = vec![
        ("customer.phone", &c.phone),
        ("customer.name", &c.name),
        ("order.order_id", &o.order_id),
        ("order.product_id", &o.product_id),
        ("order.option_name", &o.option_name),
        ("order.ordered_at", &o.ordered_at),
        ("order.paid_at", &o.paid_at),
        ("order.shipping_fee", &o.shipping_fee),
        ("order.quantity", &o.quantity),
        ("delivery.address", &d.address),
        ("delivery.postal_code", &d.postal_code),
        ("delivery.recipient_phone", &d.recipient_phone),
        ("delivery.recipient_name", &d.recipient_name),
    ];

    match &o.sale {
        SaleRule::Column { column } => required.push(("order.sale.column", column)),
        SaleRule::UnitPrice { columns, quantity } => {
            if columns.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "platform '{}': order.sale.columns must list at least one column",
                    p.code
                )));
            }
            required.push(("order.sale.quantity", quantity));
            required.extend(columns.iter().map(|c| ("order.sale.columns", c.as_str())));
        }
    }

    if let DiscountRule::Columns { columns } = &o.discount {
        required.extend(columns.iter().map(|c| ("order.discount.columns", c.as_str())));
    }

    match &o.fee {
        FeeRule::Zero => {}
        FeeRule::Columns { columns } => {
            if columns.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "platform '{}': order.fee.columns must list at least one column",
                    p.code
                )));
            }
            required.extend(columns.iter().map(|c| ("order.fee.columns", c.as_str())));
        }
        FeeRule::Rate { rate } => {
            if rate.is_sign_negative() || *rate >= Decimal::ONE {
                return Err(ConfigError::Validation(format!(
                    "platform '{}': fee rate {rate} must be in [0, 1)",
                    p.code
                )));
            }
        }
    }

    if let SettlementRule::Column { column } = &o.settlement {
        required.push(("order.settlement.column", column));
    }

    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "platform '{}': {field} must be non-empty",
                p.code
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "platform_test.rs"]
mod tests;
