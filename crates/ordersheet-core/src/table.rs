//! Named master tables and the headered row sets read from them.

use thiserror::Error;

use crate::records::{
    Customer, Delivery, ManifestRow, OptionRecord, Order, OPTION_SKU_COLUMNS, SKU_COLUMNS,
};

/// The master tables the pipeline reads from or appends to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Customer,
    Order,
    Delivery,
    /// Read-only product option reference.
    Option,
    /// Read-only option → SKU link table, consumed by the manifest view.
    OptionSku,
    /// Read-only SKU reference, consumed by the manifest view.
    Sku,
    /// Reporting sink written by the manifest view.
    Manifest,
}

impl Table {
    pub const ALL: [Table; 7] = [
        Table::Customer,
        Table::Order,
        Table::Delivery,
        Table::Option,
        Table::OptionSku,
        Table::Sku,
        Table::Manifest,
    ];

    /// Sheet name as it appears in the store.
    #[must_use]
    pub fn sheet_name(self) -> &'static str {
        match self {
            Table::Customer => "고객",
            Table::Order => "주문",
            Table::Delivery => "배송",
            Table::Option => "옵션",
            Table::OptionSku => "옵션 스큐 연결",
            Table::Sku => "스큐",
            Table::Manifest => "출고",
        }
    }

    /// Header row written when the table is first created.
    #[must_use]
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Table::Customer => Customer::COLUMNS,
            Table::Order => Order::COLUMNS,
            Table::Delivery => Delivery::COLUMNS,
            Table::Option => OptionRecord::COLUMNS,
            Table::OptionSku => OPTION_SKU_COLUMNS,
            Table::Sku => SKU_COLUMNS,
            Table::Manifest => ManifestRow::COLUMNS,
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.sheet_name())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SheetError {
    #[error("table '{table}' is missing required column '{column}'")]
    MissingColumn { table: Table, column: String },
}

/// A table's header plus its data rows, in store order.
///
/// Rows may be shorter than the header; missing trailing cells read as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sheet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    #[must_use]
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Empty sheet carrying the canonical header of `table`.
    #[must_use]
    pub fn for_table(table: Table) -> Self {
        Self::new(table.columns().iter().map(|c| (*c).to_string()).collect())
    }

    #[must_use]
    pub fn with_rows(mut self, rows: Vec<Vec<String>>) -> Self {
        self.rows = rows;
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.trim() == name)
    }

    /// Checks that every column in `required` is present in the header.
    ///
    /// A sheet without data rows passes regardless of its header, so a freshly
    /// created table reads as empty instead of failing.
    ///
    /// # Errors
    ///
    /// Returns [`SheetError::MissingColumn`] naming the first absent column.
    pub fn require_columns(&self, table: Table, required: &[&str]) -> Result<(), SheetError> {
        if self.rows.is_empty() {
            return Ok(());
        }
        for column in required {
            if self.column_index(column).is_none() {
                return Err(SheetError::MissingColumn {
                    table,
                    column: (*column).to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn row_views(&self) -> impl Iterator<Item = RowView<'_>> {
        self.rows.iter().map(move |row| RowView { sheet: self, row })
    }

    /// All values of one column, trimmed. Absent columns yield nothing.
    #[must_use]
    pub fn column_values(&self, name: &str) -> Vec<&str> {
        match self.column_index(name) {
            Some(idx) => self
                .rows
                .iter()
                .map(|row| row.get(idx).map_or("", |s| s.trim()))
                .collect(),
            None => Vec::new(),
        }
    }
}

/// One row of a [`Sheet`], addressed by header name.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    sheet: &'a Sheet,
    row: &'a [String],
}

impl<'a> RowView<'a> {
    /// Trimmed cell value for `column`; empty when the column or cell is absent.
    #[must_use]
    pub fn get(&self, column: &str) -> &'a str {
        self.sheet
            .column_index(column)
            .and_then(|idx| self.row.get(idx))
            .map_or("", |s| s.trim())
    }
}
