//! Canonical record types appended to (or read from) the master tables.
//!
//! Each record knows its table header (`COLUMNS`) and projects itself into a
//! row of strings in that order via `to_row`.

use serde::{Deserialize, Serialize};

use crate::columns as col;
use crate::table::{Sheet, SheetError, Table};

pub const OPTION_SKU_COLUMNS: &[&str] = &[col::OPTION_KEY, col::SKU_KEY, col::SKU_QUANTITY];
pub const SKU_COLUMNS: &[&str] = &[col::SKU_KEY, col::SKU_NAME];

/// Builds the platform-scoped key shared by customers and orders:
/// `{id}_{tag}`.
#[must_use]
pub fn scoped_key(id: &str, tag: &str) -> String {
    format!("{id}_{tag}")
}

/// Key of the delivery row for one platform order: `배송_{order id}_{tag}`.
#[must_use]
pub fn delivery_key(order_id: &str, tag: &str) -> String {
    format!("배송_{order_id}_{tag}")
}

// ---------------------------------------------------------------------------
// Customer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// `{phone}_{platform tag}`; unique per (phone, platform).
    pub key: String,
    /// Platform-native buyer id, empty when the export has none.
    pub external_id: String,
    pub name: String,
    pub phone: String,
    pub secondary_phone: String,
    pub platform: String,
    pub recorded_at: String,
}

impl Customer {
    pub const COLUMNS: &'static [&'static str] = &[
        col::CUSTOMER_KEY,
        col::CUSTOMER_ID,
        col::CUSTOMER_NAME,
        col::CUSTOMER_PHONE,
        col::CUSTOMER_TEL,
        col::PLATFORM,
        col::RECORDED_AT,
    ];

    #[must_use]
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.key.clone(),
            self.external_id.clone(),
            self.name.clone(),
            self.phone.clone(),
            self.secondary_phone.clone(),
            self.platform.clone(),
            self.recorded_at.clone(),
        ]
    }

    /// Parses the customer table.
    ///
    /// # Errors
    ///
    /// Returns [`SheetError::MissingColumn`] if the key, phone, or platform
    /// column is absent from a non-empty table.
    pub fn from_sheet(sheet: &Sheet) -> Result<Vec<Customer>, SheetError> {
        sheet.require_columns(
            Table::Customer,
            &[col::CUSTOMER_KEY, col::CUSTOMER_PHONE, col::PLATFORM],
        )?;
        Ok(sheet
            .row_views()
            .map(|r| Customer {
                key: r.get(col::CUSTOMER_KEY).to_string(),
                external_id: r.get(col::CUSTOMER_ID).to_string(),
                name: r.get(col::CUSTOMER_NAME).to_string(),
                phone: r.get(col::CUSTOMER_PHONE).to_string(),
                secondary_phone: r.get(col::CUSTOMER_TEL).to_string(),
                platform: r.get(col::PLATFORM).to_string(),
                recorded_at: r.get(col::RECORDED_AT).to_string(),
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Option (read-only reference)
// ---------------------------------------------------------------------------

/// A product option from the reference table.
///
/// `discount` is kept as the raw cell text; the ingest side converts it with
/// the batch's numeric mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionRecord {
    pub key: String,
    pub product_id: String,
    pub option_name: String,
    pub discount: String,
}

impl OptionRecord {
    pub const COLUMNS: &'static [&'static str] = &[
        col::OPTION_KEY,
        col::PRODUCT_ID,
        col::OPTION_NAME,
        col::OPTION_DISCOUNT,
    ];

    /// Parses the option table.
    ///
    /// # Errors
    ///
    /// Returns [`SheetError::MissingColumn`] if the key, product id, or option
    /// name column is absent from a non-empty table.
    pub fn from_sheet(sheet: &Sheet) -> Result<Vec<OptionRecord>, SheetError> {
        sheet.require_columns(
            Table::Option,
            &[col::OPTION_KEY, col::PRODUCT_ID, col::OPTION_NAME],
        )?;
        Ok(sheet
            .row_views()
            .map(|r| OptionRecord {
                key: r.get(col::OPTION_KEY).to_string(),
                product_id: r.get(col::PRODUCT_ID).to_string(),
                option_name: r.get(col::OPTION_NAME).to_string(),
                discount: r.get(col::OPTION_DISCOUNT).to_string(),
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Order
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// `{platform order id}_{tag}`.
    pub key: String,
    /// Resolved option key; empty when the option is not in the reference table.
    pub option_key: String,
    /// Resolved customer key; empty when the buyer is unknown.
    pub customer_key: String,
    pub order_id: String,
    pub ordered_at: String,
    pub paid_at: String,
    pub sale_amount: i64,
    pub discount: i64,
    pub platform_fee: i64,
    /// Net amount owed to the seller. Either copied from the export or
    /// `sale_amount - discount - platform_fee`.
    pub settlement: i64,
    pub shipping_fee: i64,
    pub quantity: i64,
    pub gift: String,
    pub status: String,
    pub platform: String,
    pub recorded_at: String,
}

impl Order {
    pub const COLUMNS: &'static [&'static str] = &[
        col::ORDER_KEY,
        col::OPTION_KEY,
        col::CUSTOMER_KEY,
        col::ORDER_ID,
        col::ORDERED_AT,
        col::PAID_AT,
        col::SALE_AMOUNT,
        col::DISCOUNT_AMOUNT,
        col::PLATFORM_FEE,
        col::SETTLEMENT_AMOUNT,
        col::SHIPPING_FEE,
        col::QUANTITY,
        col::GIFT,
        col::TOTAL_WEIGHT,
        col::ORDER_STATUS,
        col::PLATFORM,
        col::RECORDED_AT,
    ];

    #[must_use]
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.key.clone(),
            self.option_key.clone(),
            self.customer_key.clone(),
            self.order_id.clone(),
            self.ordered_at.clone(),
            self.paid_at.clone(),
            self.sale_amount.to_string(),
            self.discount.to_string(),
            self.platform_fee.to_string(),
            self.settlement.to_string(),
            self.shipping_fee.to_string(),
            self.quantity.to_string(),
            self.gift.clone(),
            // Weight is filled in by the warehouse, never by ingestion.
            String::new(),
            self.status.clone(),
            self.platform.clone(),
            self.recorded_at.clone(),
        ]
    }
}

// ---------------------------------------------------------------------------
// Delivery
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    /// `배송_{platform order id}_{tag}`.
    pub key: String,
    /// Same composition as [`Order::key`].
    pub order_key: String,
    pub address: String,
    pub postal_code: String,
    pub note: String,
    /// `%Y-%m-%d`, from the dispatch cutoff policy.
    pub dispatch_date: String,
    pub pickup: String,
    pub recipient_phone: String,
    pub recipient_secondary_phone: String,
    pub recipient_name: String,
    pub recorded_at: String,
}

impl Delivery {
    /// Every ingested delivery is the first shipment of its order.
    pub const FIRST_ROUND: &'static str = "1";

    pub const COLUMNS: &'static [&'static str] = &[
        col::DELIVERY_KEY,
        col::ORDER_KEY,
        col::ADDRESS,
        col::POSTAL_CODE,
        col::NOTE,
        col::DISPATCH_DATE,
        col::DELIVERY_ROUND,
        col::PICKUP,
        col::PICKUP_DATE,
        col::RECIPIENT_PHONE,
        col::RECIPIENT_TEL,
        col::RECIPIENT_NAME,
        col::PREPAID,
        col::PREPAID_AMOUNT,
        col::COURIER_FEE,
        col::RECORDED_AT,
    ];

    #[must_use]
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.key.clone(),
            self.order_key.clone(),
            self.address.clone(),
            self.postal_code.clone(),
            self.note.clone(),
            self.dispatch_date.clone(),
            Self::FIRST_ROUND.to_string(),
            self.pickup.clone(),
            String::new(),
            self.recipient_phone.clone(),
            self.recipient_secondary_phone.clone(),
            self.recipient_name.clone(),
            String::new(),
            String::new(),
            String::new(),
            self.recorded_at.clone(),
        ]
    }
}

// ---------------------------------------------------------------------------
// Shipping manifest
// ---------------------------------------------------------------------------

/// One denormalized shipping manifest line: everything the warehouse needs to
/// pack a single address. Multi-valued fields are newline-joined.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestRow {
    pub delivery_keys: String,
    pub order_keys: String,
    pub customer_key: String,
    pub recipient_name: String,
    pub customer_name: String,
    pub address: String,
    pub recipient_phone: String,
    pub recipient_secondary_phone: String,
    pub customer_phone: String,
    pub prepaid: String,
    pub note: String,
    pub order_ids: String,
    pub platform: String,
    pub dispatch_date: String,
    pub round: String,
    pub sku_names: String,
    pub sku_quantities: String,
}

impl ManifestRow {
    pub const COLUMNS: &'static [&'static str] = &[
        col::DELIVERY_KEY,
        col::ORDER_KEY,
        col::CUSTOMER_KEY,
        col::RECIPIENT_NAME,
        col::CUSTOMER_NAME,
        col::ADDRESS,
        col::RECIPIENT_PHONE,
        col::RECIPIENT_TEL,
        col::CUSTOMER_PHONE,
        col::PREPAID,
        col::NOTE,
        col::ORDER_ID,
        col::PLATFORM,
        col::DISPATCH_DATE,
        col::MANIFEST_ROUND,
        col::SKU_NAME,
        col::SKU_QUANTITY,
    ];

    #[must_use]
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.delivery_keys.clone(),
            self.order_keys.clone(),
            self.customer_key.clone(),
            self.recipient_name.clone(),
            self.customer_name.clone(),
            self.address.clone(),
            self.recipient_phone.clone(),
            self.recipient_secondary_phone.clone(),
            self.customer_phone.clone(),
            self.prepaid.clone(),
            self.note.clone(),
            self.order_ids.clone(),
            self.platform.clone(),
            self.dispatch_date.clone(),
            self.round.clone(),
            self.sku_names.clone(),
            self.sku_quantities.clone(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer_sheet() -> Sheet {
        Sheet::for_table(Table::Customer).with_rows(vec![vec![
            "010-1_11st".into(),
            "buyer1".into(),
            "김철수".into(),
            "010-1".into(),
            String::new(),
            "11st".into(),
            "2026-01-01 09:00:00".into(),
        ]])
    }

    #[test]
    fn scoped_keys() {
        assert_eq!(scoped_key("A1", "쿠팡"), "A1_쿠팡");
        assert_eq!(delivery_key("A1", "쿠팡"), "배송_A1_쿠팡");
    }

    #[test]
    fn customer_round_trips_through_its_table() {
        let parsed = Customer::from_sheet(&customer_sheet()).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].phone, "010-1");
        assert_eq!(parsed[0].platform, "11st");
        assert_eq!(parsed[0].to_row(), customer_sheet().rows[0]);
    }

    #[test]
    fn customer_sheet_without_phone_column_is_rejected() {
        let sheet = Sheet::new(vec![col::CUSTOMER_KEY.into(), col::PLATFORM.into()])
            .with_rows(vec![vec!["k".into(), "11st".into()]]);
        let err = Customer::from_sheet(&sheet).unwrap_err();
        assert!(err.to_string().contains(col::CUSTOMER_PHONE));
    }

    #[test]
    fn option_discount_column_is_optional() {
        let sheet = Sheet::new(vec![
            col::OPTION_KEY.into(),
            col::PRODUCT_ID.into(),
            col::OPTION_NAME.into(),
        ])
        .with_rows(vec![vec!["opt-1".into(), "P1".into(), "red".into()]]);
        let options = OptionRecord::from_sheet(&sheet).unwrap();
        assert_eq!(options[0].discount, "");
    }

    #[test]
    fn row_widths_match_headers() {
        let order = Order {
            key: "A1_11st".into(),
            option_key: String::new(),
            customer_key: String::new(),
            order_id: "A1".into(),
            ordered_at: String::new(),
            paid_at: String::new(),
            sale_amount: 10_000,
            discount: 500,
            platform_fee: 0,
            settlement: 9_500,
            shipping_fee: 0,
            quantity: 1,
            gift: String::new(),
            status: String::new(),
            platform: "11st".into(),
            recorded_at: String::new(),
        };
        assert_eq!(order.to_row().len(), Order::COLUMNS.len());

        let delivery = Delivery {
            key: "배송_A1_11st".into(),
            order_key: "A1_11st".into(),
            address: String::new(),
            postal_code: String::new(),
            note: String::new(),
            dispatch_date: String::new(),
            pickup: String::new(),
            recipient_phone: String::new(),
            recipient_secondary_phone: String::new(),
            recipient_name: String::new(),
            recorded_at: String::new(),
        };
        let row = delivery.to_row();
        assert_eq!(row.len(), Delivery::COLUMNS.len());
        assert_eq!(row[6], "1");

        let courier_fee = Delivery::COLUMNS
            .iter()
            .position(|c| *c == col::COURIER_FEE)
            .unwrap();
        assert_eq!(Delivery::COLUMNS[courier_fee + 1], col::RECORDED_AT);
        assert_eq!(row[courier_fee], "");

        assert_eq!(
            ManifestRow::default().to_row().len(),
            ManifestRow::COLUMNS.len()
        );
    }
}
