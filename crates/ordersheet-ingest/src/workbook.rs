//! Reads an uploaded export workbook into a [`RawBatch`].

use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};
use ordersheet_core::{PlatformConfig, WorkbookLayout};

use crate::error::IngestError;
use crate::normalize::{RawBatch, RawRow};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Opens `path` and reads the sheet described by the platform's layout.
///
/// # Errors
///
/// - [`IngestError::MissingInput`] if `path` does not exist.
/// - [`IngestError::Encrypted`] if the platform ships password-protected
///   exports and the file cannot be opened as a plain workbook.
/// - [`IngestError::Workbook`] for any other open or parse failure.
/// - [`IngestError::SheetNotFound`] / [`IngestError::EmptySheet`] when the
///   configured sheet or header row is absent.
pub fn read_export(path: &Path, platform: &PlatformConfig) -> Result<RawBatch, IngestError> {
    if !path.is_file() {
        return Err(IngestError::MissingInput {
            path: path.to_path_buf(),
        });
    }

    let mut workbook = match open_workbook_auto(path) {
        Ok(wb) => wb,
        Err(_) if platform.workbook.encrypted => {
            return Err(IngestError::Encrypted {
                platform: platform.label.clone(),
                path: path.to_path_buf(),
            });
        }
        Err(source) => {
            return Err(IngestError::Workbook {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let sheet_names = workbook.sheet_names();
    let sheet = match &platform.workbook.sheet {
        Some(name) => {
            if !sheet_names.iter().any(|s| s == name) {
                return Err(IngestError::SheetNotFound {
                    sheet: name.clone(),
                    available: sheet_names,
                });
            }
            name.clone()
        }
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| IngestError::SheetNotFound {
                sheet: "<first>".to_string(),
                available: Vec::new(),
            })?,
    };

    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|source| IngestError::Workbook {
            path: path.to_path_buf(),
            source,
        })?;

    let batch = range_to_batch(&range, &sheet, &platform.workbook)?;
    tracing::info!(
        platform = %platform.code,
        sheet = %sheet,
        rows = batch.len(),
        "read export workbook"
    );
    Ok(batch)
}

/// Splits a cell range into header and data rows.
///
/// `layout.header_row` counts from the top of the sheet, but a calamine range
/// begins at the first used cell, so leading blank rows are already gone.
/// Rows above the header are skipped; blank header cells are named
/// `col_{index}` so every column stays addressable.
pub(crate) fn range_to_batch(
    range: &Range<Data>,
    sheet: &str,
    layout: &WorkbookLayout,
) -> Result<RawBatch, IngestError> {
    let start_row = range.start().map_or(0, |(row, _)| row);
    let skip =
        usize::try_from(layout.header_row.saturating_sub(start_row)).unwrap_or(usize::MAX);
    let mut rows = range.rows().skip(skip);

    let header = rows.next().ok_or_else(|| IngestError::EmptySheet {
        sheet: sheet.to_string(),
        header_row: layout.header_row,
    })?;
    let columns = header
        .iter()
        .enumerate()
        .map(|(idx, cell)| {
            let name = cell_to_string(cell);
            if name.trim().is_empty() {
                format!("col_{idx}")
            } else {
                name
            }
        })
        .collect();

    // 1-based sheet line of the first data row.
    let first_line = start_row as usize + skip + 2;
    let data = rows
        .enumerate()
        .map(|(idx, cells)| RawRow {
            line: first_line + idx,
            cells: cells.iter().map(cell_to_string).collect(),
        })
        .collect();

    Ok(RawBatch {
        columns,
        rows: data,
    })
}

/// Renders one cell as the text an operator would see.
///
/// Whole floats lose their `.0` so ids and amounts stored as numbers read
/// back as written.
pub(crate) fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.is_finite() {
                format!("{f:.0}")
            } else {
                f.to_string()
            }
        }
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.as_datetime().map_or_else(
            || dt.as_f64().to_string(),
            |d| d.format(DATETIME_FORMAT).to_string(),
        ),
        Data::Error(e) => format!("#ERROR:{e:?}"),
    }
}
