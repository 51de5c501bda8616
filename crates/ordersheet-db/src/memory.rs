//! In-process [`TableStore`] used by tests and dry runs.

use std::collections::HashMap;

use async_trait::async_trait;
use ordersheet_core::{Sheet, Table};
use tokio::sync::RwLock;

use crate::store::{check_widths, AppendOutcome, TableStore};
use crate::StoreError;

#[derive(Debug, Default)]
pub struct MemoryStore {
    sheets: RwLock<HashMap<Table, Sheet>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds `table` with `sheet`, replacing whatever was there.
    #[must_use]
    pub fn with_sheet(mut self, table: Table, sheet: Sheet) -> Self {
        self.sheets.get_mut().insert(table, sheet);
        self
    }

    /// Copies `tables` out of another store.
    ///
    /// # Errors
    ///
    /// Returns the first read error of `source`.
    pub async fn preload<S>(source: &S, tables: &[Table]) -> Result<Self, StoreError>
    where
        S: TableStore + ?Sized,
    {
        let mut sheets = HashMap::with_capacity(tables.len());
        for &table in tables {
            sheets.insert(table, source.read_table(table).await?);
        }
        Ok(Self {
            sheets: RwLock::new(sheets),
        })
    }
}

#[async_trait]
impl TableStore for MemoryStore {
    async fn read_table(&self, table: Table) -> Result<Sheet, StoreError> {
        Ok(self
            .sheets
            .read()
            .await
            .get(&table)
            .cloned()
            .unwrap_or_else(|| Sheet::for_table(table)))
    }

    async fn append_rows(
        &self,
        table: Table,
        rows: &[Vec<String>],
    ) -> Result<AppendOutcome, StoreError> {
        if rows.is_empty() {
            return Ok(AppendOutcome::NothingToDo);
        }

        let mut sheets = self.sheets.write().await;
        let sheet = sheets
            .entry(table)
            .or_insert_with(|| Sheet::for_table(table));
        check_widths(table, sheet.columns.len(), rows)?;

        let first_row = sheet.rows.len() + 1;
        sheet.rows.extend(rows.iter().cloned());
        Ok(AppendOutcome::Appended {
            first_row,
            rows: rows.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sku_row(key: &str) -> Vec<String> {
        vec![key.to_string(), format!("name {key}")]
    }

    #[tokio::test]
    async fn unseeded_table_reads_as_canonical_header() {
        let store = MemoryStore::new();
        let sheet = store.read_table(Table::Customer).await.unwrap();
        assert!(sheet.is_empty());
        assert_eq!(sheet.columns.len(), Table::Customer.columns().len());
    }

    #[tokio::test]
    async fn append_after_existing_rows_keeps_them_unchanged() {
        let existing: Vec<_> = (1..=5).map(|i| sku_row(&format!("s{i}"))).collect();
        let store = MemoryStore::new().with_sheet(
            Table::Sku,
            Sheet::for_table(Table::Sku).with_rows(existing.clone()),
        );

        let new_rows: Vec<_> = (6..=8).map(|i| sku_row(&format!("s{i}"))).collect();
        let outcome = store.append_rows(Table::Sku, &new_rows).await.unwrap();
        assert_eq!(
            outcome,
            AppendOutcome::Appended {
                first_row: 6,
                rows: 3
            }
        );

        let sheet = store.read_table(Table::Sku).await.unwrap();
        assert_eq!(sheet.len(), 8);
        assert_eq!(&sheet.rows[..5], existing.as_slice());
        assert_eq!(&sheet.rows[5..], new_rows.as_slice());
    }

    #[tokio::test]
    async fn empty_append_is_nothing_to_do() {
        let store = MemoryStore::new();
        let outcome = store.append_rows(Table::Sku, &[]).await.unwrap();
        assert_eq!(outcome, AppendOutcome::NothingToDo);
        assert_eq!(outcome.rows(), 0);
    }

    #[tokio::test]
    async fn mismatched_row_width_is_rejected_without_partial_write() {
        let store = MemoryStore::new();
        let rows = vec![sku_row("a"), vec!["only-key".to_string()]];
        let err = store.append_rows(Table::Sku, &rows).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::RowWidth {
                row: 2,
                expected: 2,
                got: 1,
                ..
            }
        ));
        assert!(store.read_table(Table::Sku).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn preload_copies_source_tables() {
        let source = MemoryStore::new().with_sheet(
            Table::Sku,
            Sheet::for_table(Table::Sku).with_rows(vec![sku_row("a")]),
        );
        let copy = MemoryStore::preload(&source, &[Table::Sku, Table::Order])
            .await
            .unwrap();
        copy.append_rows(Table::Sku, &[sku_row("b")]).await.unwrap();

        assert_eq!(copy.read_table(Table::Sku).await.unwrap().len(), 2);
        assert_eq!(source.read_table(Table::Sku).await.unwrap().len(), 1);
    }
}
