//! The append pipeline: one uploaded export through customers, orders and
//! deliveries, in that order.
//!
//! Each stage reads what it needs from the store, builds its records and
//! appends only rows whose key is not already present. A failed stage is
//! recorded on the report and the next stage still runs.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use chrono::NaiveDateTime;
use ordersheet_core::columns as col;
use ordersheet_core::{
    AppConfig, BatchStamp, Customer, NumericMode, OptionRecord, PlatformConfig, PlatformsFile,
    Table,
};
use ordersheet_db::{AppendOutcome, TableStore};
use ordersheet_ingest::{
    adapter, build_customers, build_deliveries, build_orders, normalize_batch, read_export,
    select_new_customers, CustomerIndex, OptionIndex, OrderContext, RawBatch,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Customers,
    Orders,
    Deliveries,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Customers, Stage::Orders, Stage::Deliveries];

    fn table(self) -> Table {
        match self {
            Stage::Customers => Table::Customer,
            Stage::Orders => Table::Order,
            Stage::Deliveries => Table::Delivery,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Customers => "customers",
            Stage::Orders => "orders",
            Stage::Deliveries => "deliveries",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Appended { rows: usize },
    NothingToDo,
    Failed { error: String },
}

impl From<AppendOutcome> for StageOutcome {
    fn from(outcome: AppendOutcome) -> Self {
        match outcome {
            AppendOutcome::NothingToDo => StageOutcome::NothingToDo,
            AppendOutcome::Appended { rows, .. } => StageOutcome::Appended { rows },
        }
    }
}

impl fmt::Display for StageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageOutcome::Appended { rows } => write!(f, "appended {rows} rows"),
            StageOutcome::NothingToDo => f.write_str("nothing to do"),
            StageOutcome::Failed { error } => write!(f, "FAILED: {error}"),
        }
    }
}

/// Per-stage outcomes of one batch.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub platform: String,
    pub stages: Vec<(Stage, StageOutcome)>,
}

impl BatchReport {
    #[cfg(test)]
    pub fn outcome(&self, stage: Stage) -> Option<&StageOutcome> {
        self.stages
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, o)| o)
    }

    #[must_use]
    pub fn failed_stages(&self) -> usize {
        self.stages
            .iter()
            .filter(|(_, o)| matches!(o, StageOutcome::Failed { .. }))
            .count()
    }

    #[must_use]
    pub fn appended_rows(&self) -> usize {
        self.stages
            .iter()
            .map(|(_, o)| match o {
                StageOutcome::Appended { rows } => *rows,
                _ => 0,
            })
            .sum()
    }

    pub fn print_summary(&self, prefix: &str) {
        for (stage, outcome) in &self.stages {
            println!("{prefix}{}: {stage}: {outcome}", self.platform);
        }
        println!(
            "{prefix}{}: {} rows appended, {} stage(s) failed",
            self.platform,
            self.appended_rows(),
            self.failed_stages()
        );
    }
}

/// Reads, normalizes and appends one export file.
///
/// Lookup and input errors (unknown platform, unreadable file) halt before
/// any stage runs and are returned as `Err`; stage failures are carried on the
/// returned report.
///
/// # Errors
///
/// Returns an error if `code` names no configured platform or the export
/// cannot be read.
pub async fn run_ingest<S>(
    store: &S,
    platforms: &PlatformsFile,
    code: &str,
    file: &Path,
    config: &AppConfig,
    now: NaiveDateTime,
) -> anyhow::Result<BatchReport>
where
    S: TableStore + ?Sized,
{
    let platform = platforms.find(code).ok_or_else(|| {
        let known: Vec<&str> = platforms.platforms.iter().map(|p| p.code.as_str()).collect();
        anyhow::anyhow!("unknown platform '{code}' (configured: {})", known.join(", "))
    })?;

    let raw = read_export(file, platform)?;
    let batch = normalize_batch(raw, adapter::id_column(platform))?;
    let stamp = BatchStamp::new(now, config.dispatch_cutoff_hour);

    tracing::info!(
        platform = %platform.code,
        rows = batch.len(),
        recorded_at = %stamp.recorded_at,
        dispatch_date = %stamp.dispatch_date,
        "starting batch"
    );

    Ok(run_batch(store, platform, &batch, &stamp, config.numeric_mode).await)
}

/// Runs every stage over an already normalized batch.
pub async fn run_batch<S>(
    store: &S,
    platform: &PlatformConfig,
    batch: &RawBatch,
    stamp: &BatchStamp,
    mode: NumericMode,
) -> BatchReport
where
    S: TableStore + ?Sized,
{
    let mut report = BatchReport {
        platform: platform.code.clone(),
        stages: Vec::with_capacity(Stage::ALL.len()),
    };

    for stage in Stage::ALL {
        let result = match stage {
            Stage::Customers => append_customers(store, platform, batch, stamp).await,
            Stage::Orders => append_orders(store, platform, batch, stamp, mode).await,
            Stage::Deliveries => append_deliveries(store, platform, batch, stamp).await,
        };

        let outcome = match result {
            Ok(outcome) => {
                tracing::info!(
                    platform = %platform.code,
                    stage = %stage,
                    table = %stage.table(),
                    rows = outcome.rows(),
                    "stage complete"
                );
                StageOutcome::from(outcome)
            }
            Err(e) => {
                tracing::error!(
                    platform = %platform.code,
                    stage = %stage,
                    error = %format!("{e:#}"),
                    "stage failed; continuing with next stage"
                );
                StageOutcome::Failed {
                    error: format!("{e:#}"),
                }
            }
        };
        report.stages.push((stage, outcome));
    }

    report
}

async fn append_customers<S>(
    store: &S,
    platform: &PlatformConfig,
    batch: &RawBatch,
    stamp: &BatchStamp,
) -> anyhow::Result<AppendOutcome>
where
    S: TableStore + ?Sized,
{
    let existing = Customer::from_sheet(&store.read_table(Table::Customer).await?)?;
    let candidates = build_customers(batch, platform, stamp)?;
    let fresh = select_new_customers(candidates, &existing, &platform.tag);

    let rows: Vec<Vec<String>> = fresh.iter().map(Customer::to_row).collect();
    Ok(store.append_rows(Table::Customer, &rows).await?)
}

async fn append_orders<S>(
    store: &S,
    platform: &PlatformConfig,
    batch: &RawBatch,
    stamp: &BatchStamp,
    mode: NumericMode,
) -> anyhow::Result<AppendOutcome>
where
    S: TableStore + ?Sized,
{
    // Re-read so customers appended by the previous stage resolve.
    let customers = Customer::from_sheet(&store.read_table(Table::Customer).await?)?;
    let options = OptionRecord::from_sheet(&store.read_table(Table::Option).await?)?;
    let customer_index = CustomerIndex::from_customers(&customers);
    let option_index = OptionIndex::from_options(&options);

    let ctx = OrderContext {
        stamp,
        mode,
        options: &option_index,
        customers: &customer_index,
    };
    let orders = build_orders(batch, platform, &ctx)?;

    let existing = store.read_table(Table::Order).await?;
    let known: HashSet<&str> = existing.column_values(col::ORDER_KEY).into_iter().collect();
    let rows: Vec<Vec<String>> = orders
        .iter()
        .filter(|o| !known.contains(o.key.as_str()))
        .map(ordersheet_core::Order::to_row)
        .collect();

    let skipped = orders.len() - rows.len();
    if skipped > 0 {
        tracing::info!(platform = %platform.code, skipped, "orders already recorded");
    }
    Ok(store.append_rows(Table::Order, &rows).await?)
}

async fn append_deliveries<S>(
    store: &S,
    platform: &PlatformConfig,
    batch: &RawBatch,
    stamp: &BatchStamp,
) -> anyhow::Result<AppendOutcome>
where
    S: TableStore + ?Sized,
{
    let deliveries = build_deliveries(batch, platform, stamp)?;

    let existing = store.read_table(Table::Delivery).await?;
    let known: HashSet<&str> = existing
        .column_values(col::DELIVERY_KEY)
        .into_iter()
        .collect();
    let rows: Vec<Vec<String>> = deliveries
        .iter()
        .filter(|d| !known.contains(d.key.as_str()))
        .map(ordersheet_core::Delivery::to_row)
        .collect();

    let skipped = deliveries.len() - rows.len();
    if skipped > 0 {
        tracing::info!(platform = %platform.code, skipped, "deliveries already recorded");
    }
    Ok(store.append_rows(Table::Delivery, &rows).await?)
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
