//! Shipping manifest: the latest batch of deliveries, joined to orders,
//! customers and SKUs, and folded into one line per delivery address.

use std::collections::{BTreeMap, HashMap, HashSet};

use ordersheet_core::columns as col;
use ordersheet_core::{Delivery, ManifestRow, Sheet, SheetError, Table};
use ordersheet_db::{AppendOutcome, TableStore};
use ordersheet_ingest::{is_hangul_syllable, parse_amount};

/// Everything the manifest view reads.
#[derive(Debug, Clone, Default)]
pub struct ManifestInputs {
    pub deliveries: Sheet,
    pub orders: Sheet,
    pub customers: Sheet,
    pub option_skus: Sheet,
    pub skus: Sheet,
}

impl ManifestInputs {
    /// Reads the five input tables from `store`.
    ///
    /// # Errors
    ///
    /// Returns the first store error encountered.
    pub async fn read<S>(store: &S) -> anyhow::Result<Self>
    where
        S: TableStore + ?Sized,
    {
        Ok(Self {
            deliveries: store.read_table(Table::Delivery).await?,
            orders: store.read_table(Table::Order).await?,
            customers: store.read_table(Table::Customer).await?,
            option_skus: store.read_table(Table::OptionSku).await?,
            skus: store.read_table(Table::Sku).await?,
        })
    }
}

/// One delivery joined to its order, customer and SKU lines, before grouping.
struct Line<'a> {
    delivery_key: &'a str,
    order_key: &'a str,
    order_id: &'a str,
    customer_key: &'a str,
    customer_name: &'a str,
    customer_phone: &'a str,
    recipient_name: &'a str,
    recipient_phone: &'a str,
    recipient_secondary_phone: &'a str,
    prepaid: &'a str,
    note: &'a str,
    platform: &'a str,
    dispatch_date: &'a str,
    round: &'a str,
    skus: Vec<(&'a str, i64)>,
}

#[derive(Default)]
struct AddressGroup {
    address: String,
    delivery_keys: Vec<String>,
    order_keys: Vec<String>,
    order_ids: Vec<String>,
    customer_key: Option<String>,
    customer_name: Option<String>,
    customer_phone: Option<String>,
    recipient_name: String,
    recipient_phone: String,
    recipient_secondary_phone: String,
    prepaid: String,
    note: String,
    platform: String,
    dispatch_date: String,
    round: String,
    skus: BTreeMap<String, i64>,
}

impl AddressGroup {
    fn absorb(&mut self, line: &Line<'_>) -> anyhow::Result<()> {
        push_unique(&mut self.delivery_keys, line.delivery_key);
        push_unique(&mut self.order_keys, line.order_key);
        push_unique(&mut self.order_ids, line.order_id);

        self.customer_key
            .get_or_insert_with(|| line.customer_key.to_string());
        self.customer_name
            .get_or_insert_with(|| line.customer_name.to_string());
        self.customer_phone
            .get_or_insert_with(|| line.customer_phone.to_string());

        keep_max(&mut self.recipient_name, line.recipient_name);
        keep_max(&mut self.recipient_phone, line.recipient_phone);
        keep_max(
            &mut self.recipient_secondary_phone,
            line.recipient_secondary_phone,
        );
        keep_max(&mut self.prepaid, line.prepaid);
        keep_max(&mut self.note, line.note);
        keep_max(&mut self.platform, line.platform);
        keep_max(&mut self.dispatch_date, line.dispatch_date);
        keep_max(&mut self.round, line.round);

        let address = &self.address;
        for &(name, qty) in &line.skus {
            let total = self.skus.entry(name.to_string()).or_insert(0);
            *total = total.checked_add(qty).ok_or_else(|| {
                anyhow::anyhow!("SKU '{name}' quantity overflows for address '{address}'")
            })?;
        }
        Ok(())
    }

    fn into_row(self) -> ManifestRow {
        // SKU names descending.
        let (names, quantities): (Vec<String>, Vec<String>) = self
            .skus
            .into_iter()
            .rev()
            .map(|(name, qty)| (name, qty.to_string()))
            .unzip();

        ManifestRow {
            delivery_keys: self.delivery_keys.join("\n"),
            order_keys: self.order_keys.join("\n"),
            customer_key: self.customer_key.unwrap_or_default(),
            recipient_name: self.recipient_name,
            customer_name: self.customer_name.unwrap_or_default(),
            address: self.address,
            recipient_phone: self.recipient_phone,
            recipient_secondary_phone: self.recipient_secondary_phone,
            customer_phone: self.customer_phone.unwrap_or_default(),
            prepaid: self.prepaid,
            note: self.note,
            order_ids: self.order_ids.join("\n"),
            platform: self.platform,
            dispatch_date: self.dispatch_date,
            round: self.round,
            sku_names: names.join("\n"),
            sku_quantities: quantities.join("\n"),
        }
    }
}

fn push_unique(values: &mut Vec<String>, value: &str) {
    if !value.is_empty() && !values.iter().any(|v| v == value) {
        values.push(value.to_string());
    }
}

fn keep_max(current: &mut String, candidate: &str) {
    if candidate > current.as_str() {
        *current = candidate.to_string();
    }
}

/// Rows of `sheet` stamped with its most recent recorded-at value.
fn latest_slice(sheet: &Sheet) -> Vec<ordersheet_core::RowView<'_>> {
    let Some(latest) = sheet
        .row_views()
        .map(|r| r.get(col::RECORDED_AT))
        .max()
    else {
        return Vec::new();
    };
    sheet
        .row_views()
        .filter(|r| r.get(col::RECORDED_AT) == latest)
        .collect()
}

/// First character of each SKU name after dropping everything except ASCII
/// letters, digits, Hangul syllables and whitespace.
///
/// Names that clean to nothing contribute no character. Case is preserved.
#[must_use]
pub fn sort_code(sku_names: &str) -> String {
    sku_names
        .split('\n')
        .filter_map(|name| {
            let cleaned: String = name
                .chars()
                .filter(|c| c.is_ascii_alphanumeric() || is_hangul_syllable(*c) || c.is_whitespace())
                .collect();
            if cleaned.trim().is_empty() {
                None
            } else {
                cleaned.chars().next()
            }
        })
        .collect()
}

/// Builds the manifest from the latest delivery and order batch.
///
/// Deliveries without a matching order are kept with empty order fields, and
/// addresses without any SKU link are kept with empty SKU columns. Order
/// quantities that are blank or unparseable count as zero.
///
/// # Errors
///
/// Returns [`SheetError::MissingColumn`] if a non-empty input table lacks a
/// column the join needs, or an error naming the SKU when a quantity leaves
/// the `i64` range.
pub fn build_manifest(inputs: &ManifestInputs) -> anyhow::Result<Vec<ManifestRow>> {
    inputs.deliveries.require_columns(
        Table::Delivery,
        &[
            col::DELIVERY_KEY,
            col::ORDER_KEY,
            col::ADDRESS,
            col::RECORDED_AT,
        ],
    )?;
    inputs
        .orders
        .require_columns(Table::Order, &[col::ORDER_KEY, col::RECORDED_AT])?;
    inputs
        .customers
        .require_columns(Table::Customer, &[col::CUSTOMER_KEY])?;
    inputs
        .option_skus
        .require_columns(Table::OptionSku, &[col::OPTION_KEY, col::SKU_KEY])?;
    inputs.skus.require_columns(Table::Sku, &[col::SKU_KEY])?;

    let orders = latest_slice(&inputs.orders);
    let mut orders_by_key: HashMap<&str, Vec<_>> = HashMap::new();
    for order in orders {
        orders_by_key
            .entry(order.get(col::ORDER_KEY))
            .or_default()
            .push(order);
    }

    let mut customers = HashMap::new();
    for c in inputs.customers.row_views() {
        customers
            .entry(c.get(col::CUSTOMER_KEY))
            .or_insert((c.get(col::CUSTOMER_NAME), c.get(col::CUSTOMER_PHONE)));
    }

    let mut sku_names = HashMap::new();
    for sku in inputs.skus.row_views() {
        sku_names
            .entry(sku.get(col::SKU_KEY))
            .or_insert(sku.get(col::SKU_NAME));
    }

    let mut links: HashMap<&str, Vec<(&str, i64)>> = HashMap::new();
    for link in inputs.option_skus.row_views() {
        let Some(name) = sku_names.get(link.get(col::SKU_KEY)) else {
            continue;
        };
        let per_unit = parse_amount(link.get(col::SKU_QUANTITY)).unwrap_or(0);
        links
            .entry(link.get(col::OPTION_KEY))
            .or_default()
            .push((*name, per_unit));
    }

    let mut groups: Vec<AddressGroup> = Vec::new();
    let mut by_address: HashMap<String, usize> = HashMap::new();

    for delivery in latest_slice(&inputs.deliveries) {
        let order_key = delivery.get(col::ORDER_KEY);
        let matches = orders_by_key.get(order_key);
        let order_rows: Vec<Option<_>> = match matches {
            Some(rows) => rows.iter().copied().map(Some).collect(),
            None => vec![None],
        };

        for order in order_rows {
            let field = |name: &str| order.map_or("", |o| o.get(name));
            let quantity = parse_amount(field(col::QUANTITY)).unwrap_or(0);
            let customer_key = field(col::CUSTOMER_KEY);
            let (customer_name, customer_phone) =
                customers.get(customer_key).copied().unwrap_or(("", ""));

            let skus = links
                .get(field(col::OPTION_KEY))
                .map_or(&[][..], Vec::as_slice)
                .iter()
                .map(|&(name, per_unit)| {
                    per_unit
                        .checked_mul(quantity)
                        .map(|qty| (name, qty))
                        .ok_or_else(|| {
                            anyhow::anyhow!("SKU '{name}' quantity overflows for '{order_key}'")
                        })
                })
                .collect::<anyhow::Result<Vec<_>>>()?;

            let round = match delivery.get(col::DELIVERY_ROUND) {
                "" => Delivery::FIRST_ROUND,
                round => round,
            };

            let line = Line {
                delivery_key: delivery.get(col::DELIVERY_KEY),
                order_key,
                order_id: field(col::ORDER_ID),
                customer_key,
                customer_name,
                customer_phone,
                recipient_name: delivery.get(col::RECIPIENT_NAME),
                recipient_phone: delivery.get(col::RECIPIENT_PHONE),
                recipient_secondary_phone: delivery.get(col::RECIPIENT_TEL),
                prepaid: delivery.get(col::PREPAID),
                note: delivery.get(col::NOTE),
                platform: field(col::PLATFORM),
                dispatch_date: delivery.get(col::DISPATCH_DATE),
                round,
                skus,
            };

            let address = delivery.get(col::ADDRESS);
            let idx = *by_address.entry(address.to_string()).or_insert_with(|| {
                groups.push(AddressGroup {
                    address: address.to_string(),
                    ..AddressGroup::default()
                });
                groups.len() - 1
            });
            groups[idx].absorb(&line)?;
        }
    }

    let mut rows: Vec<ManifestRow> = groups.into_iter().map(AddressGroup::into_row).collect();
    rows.sort_by_cached_key(|r| (sort_code(&r.sku_names), r.address.clone()));
    Ok(rows)
}

/// Builds the manifest from `store` and appends the lines not yet recorded.
///
/// A line counts as recorded when its newline-joined delivery keys already
/// appear in the manifest table.
///
/// # Errors
///
/// Returns an error if a table cannot be read, lacks a needed column, or the
/// append fails.
pub async fn run_manifest<S>(store: &S) -> anyhow::Result<AppendOutcome>
where
    S: TableStore + ?Sized,
{
    let inputs = ManifestInputs::read(store).await?;
    let rows = build_manifest(&inputs)?;

    let existing = store.read_table(Table::Manifest).await?;
    let known: HashSet<&str> = existing
        .column_values(col::DELIVERY_KEY)
        .into_iter()
        .collect();
    let fresh: Vec<Vec<String>> = rows
        .iter()
        .filter(|r| !known.contains(r.delivery_keys.as_str()))
        .map(ManifestRow::to_row)
        .collect();

    tracing::info!(
        table = %Table::Manifest,
        built = rows.len(),
        rows = fresh.len(),
        "manifest built"
    );
    Ok(store.append_rows(Table::Manifest, &fresh).await?)
}

#[cfg(test)]
#[path = "manifest_test.rs"]
mod tests;
