//! The tabular store contract shared by every backend.

use async_trait::async_trait;
use ordersheet_core::{Sheet, Table};

use crate::StoreError;

/// Result of an append call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The row set was empty; the store was not touched.
    NothingToDo,
    /// `rows` rows were written starting at 1-based data row `first_row`.
    Appended { first_row: usize, rows: usize },
}

impl AppendOutcome {
    #[must_use]
    pub fn rows(self) -> usize {
        match self {
            AppendOutcome::NothingToDo => 0,
            AppendOutcome::Appended { rows, .. } => rows,
        }
    }
}

/// A set of named, headered, append-only tables.
///
/// Implementations never rewrite or reorder existing rows: `append_rows`
/// writes immediately after the last existing row of the target table.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Reads the header and every data row of `table`, in store order.
    ///
    /// A table that has never been written reads as its canonical header
    /// with no rows.
    async fn read_table(&self, table: Table) -> Result<Sheet, StoreError>;

    /// Appends `rows` after the last existing row of `table`.
    ///
    /// An empty `rows` slice returns [`AppendOutcome::NothingToDo`] without
    /// touching the store.
    async fn append_rows(
        &self,
        table: Table,
        rows: &[Vec<String>],
    ) -> Result<AppendOutcome, StoreError>;
}

/// Rejects rows whose width differs from the header.
pub(crate) fn check_widths(
    table: Table,
    header_len: usize,
    rows: &[Vec<String>],
) -> Result<(), StoreError> {
    match rows.iter().position(|r| r.len() != header_len) {
        Some(idx) => Err(StoreError::RowWidth {
            table,
            row: idx + 1,
            expected: header_len,
            got: rows[idx].len(),
        }),
        None => Ok(()),
    }
}
