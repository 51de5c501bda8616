pub mod app_config;
pub mod columns;
pub mod config;
pub mod dispatch;
pub mod platform;
pub mod records;
pub mod table;

pub use app_config::{AppConfig, Environment, NumericMode};
pub use config::{load_app_config, load_app_config_from_env};
pub use dispatch::{dispatch_date, BatchStamp, DEFAULT_DISPATCH_CUTOFF_HOUR};
pub use platform::{
    load_platforms, parse_platforms, CustomerColumns, DeliveryColumns, DiscountRule, FeeRule,
    OrderColumns, PlatformConfig, PlatformsFile, SaleRule, SettlementRule, WorkbookLayout,
};
pub use records::{Customer, Delivery, ManifestRow, OptionRecord, Order};
pub use table::{RowView, Sheet, SheetError, Table};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read platforms file {path}: {source}")]
    PlatformsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse platforms file: {0}")]
    PlatformsFileParse(#[from] serde_yaml::Error),

    #[error("invalid platform configuration: {0}")]
    Validation(String),
}
