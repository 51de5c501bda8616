pub mod adapter;
pub mod error;
pub mod normalize;
pub mod resolve;
pub mod upsert;
pub mod workbook;

pub use adapter::{build_customers, build_deliveries, build_orders, fee_at_rate, OrderContext};
pub use error::IngestError;
pub use normalize::{normalize_batch, parse_amount, to_amount, RawBatch, RawRecord, RawRow};
pub use resolve::{clean_option_name, is_hangul_syllable, CustomerIndex, KeyIndex, OptionIndex};
pub use upsert::{dedupe_batch, select_new_customers};
pub use workbook::read_export;
