use std::path::PathBuf;

use ordersheet_core::SheetError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("input file not found: {}", path.display())]
    MissingInput { path: PathBuf },

    #[error("failed to read workbook {}: {source}", path.display())]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error(
        "{platform} export {} could not be opened; decrypt it before uploading",
        path.display()
    )]
    Encrypted { platform: String, path: PathBuf },

    #[error("sheet '{sheet}' not found (available: {})", available.join(", "))]
    SheetNotFound {
        sheet: String,
        available: Vec<String>,
    },

    #[error("sheet '{sheet}' has no header row at offset {header_row}")]
    EmptySheet { sheet: String, header_row: u32 },

    #[error("export is missing column '{column}'")]
    MissingColumn { column: String },

    #[error("column '{column}' row {row}: '{value}' is not a whole amount")]
    Conversion {
        column: String,
        row: usize,
        value: String,
    },

    #[error("row {row}: {field} does not fit in a whole amount")]
    AmountOverflow { field: String, row: usize },

    #[error(transparent)]
    Sheet(#[from] SheetError),
}
