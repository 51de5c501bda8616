//! Field normalization for raw export rows.
//!
//! Every export cell arrives as text. This module trims it, drops rows that
//! carry no identifier, and converts monetary and count columns into whole
//! amounts under the configured [`NumericMode`].

use std::str::FromStr;

use ordersheet_core::NumericMode;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::IngestError;

/// One data row of an export, with its 1-based line in the source sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub line: usize,
    pub cells: Vec<String>,
}

/// Header plus data rows of one uploaded export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawBatch {
    pub columns: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawBatch {
    /// Builds a batch whose header sits on line 1 and data starts on line 2.
    #[must_use]
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(idx, cells)| RawRow {
                line: idx + 2,
                cells,
            })
            .collect();
        Self { columns, rows }
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

    /// # Errors
    ///
    /// Returns [`IngestError::MissingColumn`] naming the first absent column.
    pub fn require_columns<'a, I>(&self, names: I) -> Result<(), IngestError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        for name in names {
            if self.column_index(name).is_none() {
                return Err(IngestError::MissingColumn {
                    column: name.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn records(&self) -> impl Iterator<Item = RawRecord<'_>> {
        self.rows.iter().map(move |row| RawRecord { batch: self, row })
    }
}

/// A row of a [`RawBatch`] addressed by header name.
#[derive(Debug, Clone, Copy)]
pub struct RawRecord<'a> {
    batch: &'a RawBatch,
    row: &'a RawRow,
}

impl<'a> RawRecord<'a> {
    #[must_use]
    pub fn line(&self) -> usize {
        self.row.line
    }

    /// Trimmed cell text; empty when the column or cell is absent.
    #[must_use]
    pub fn get(&self, column: &str) -> &'a str {
        self.batch
            .column_index(column)
            .and_then(|idx| self.row.cells.get(idx))
            .map_or("", |s| s.trim())
    }

    /// Like [`RawRecord::get`] for an optional column mapping.
    #[must_use]
    pub fn get_opt(&self, column: Option<&str>) -> &'a str {
        column.map_or("", |c| self.get(c))
    }

    /// Cell converted with [`to_amount`].
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Conversion`] in strict mode when the cell is
    /// not a number.
    pub fn amount(&self, column: &str, mode: NumericMode) -> Result<i64, IngestError> {
        to_amount(self.get(column), mode, column, self.row.line)
    }

    /// Sum of several amount columns.
    ///
    /// # Errors
    ///
    /// Same as [`RawRecord::amount`], plus [`IngestError::AmountOverflow`]
    /// when the sum leaves the `i64` range.
    pub fn amount_sum<S: AsRef<str>>(
        &self,
        columns: &[S],
        mode: NumericMode,
    ) -> Result<i64, IngestError> {
        columns.iter().try_fold(0i64, |total, c| {
            let column = c.as_ref();
            total
                .checked_add(self.amount(column, mode)?)
                .ok_or_else(|| self.overflow(column))
        })
    }

    /// Error for a value derived from this row that leaves the `i64` range.
    #[must_use]
    pub fn overflow(&self, field: &str) -> IngestError {
        IngestError::AmountOverflow {
            field: field.to_string(),
            row: self.row.line,
        }
    }
}

/// Trims every cell and drops rows whose `id_column` is blank.
///
/// Exports pad their tail with summary or empty lines; those carry no order
/// identifier and are discarded here.
///
/// # Errors
///
/// Returns [`IngestError::MissingColumn`] if `id_column` is not in the header.
pub fn normalize_batch(raw: RawBatch, id_column: &str) -> Result<RawBatch, IngestError> {
    let id_idx = raw
        .column_index(id_column)
        .ok_or_else(|| IngestError::MissingColumn {
            column: id_column.to_string(),
        })?;

    let before = raw.rows.len();
    let columns = raw.columns.iter().map(|c| c.trim().to_string()).collect();
    let rows: Vec<RawRow> = raw
        .rows
        .into_iter()
        .map(|row| RawRow {
            line: row.line,
            cells: row.cells.iter().map(|c| c.trim().to_string()).collect(),
        })
        .filter(|row| row.cells.get(id_idx).is_some_and(|id| !id.is_empty()))
        .collect();

    let dropped = before - rows.len();
    if dropped > 0 {
        tracing::debug!(id_column, dropped, "dropped rows without identifier");
    }

    Ok(RawBatch { columns, rows })
}

/// Parses a monetary or count cell into a whole number.
///
/// Thousands separators and whitespace are ignored and an empty cell is 0.
/// Decimal text is accepted; a non-zero fraction rounds half away from zero.
#[must_use]
pub fn parse_amount(raw: &str) -> Option<i64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return Some(0);
    }
    if let Ok(whole) = cleaned.parse::<i64>() {
        return Some(whole);
    }

    let decimal = Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()?;
    decimal
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

/// [`parse_amount`] with the batch's failure policy applied.
///
/// # Errors
///
/// In [`NumericMode::Strict`], returns [`IngestError::Conversion`] naming the
/// column, source line and offending text. In [`NumericMode::Lenient`] the
/// value becomes 0 and a warning is logged.
pub fn to_amount(
    raw: &str,
    mode: NumericMode,
    column: &str,
    line: usize,
) -> Result<i64, IngestError> {
    match parse_amount(raw) {
        Some(value) => Ok(value),
        None => match mode {
            NumericMode::Strict => Err(IngestError::Conversion {
                column: column.to_string(),
                row: line,
                value: raw.to_string(),
            }),
            NumericMode::Lenient => {
                tracing::warn!(column, line, value = raw, "non-numeric amount read as 0");
                Ok(0)
            }
        },
    }
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
