use chrono::{NaiveDate, NaiveDateTime, Timelike};

pub const DEFAULT_DISPATCH_CUTOFF_HOUR: u32 = 18;

pub const RECORDED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Date a delivery leaves the warehouse.
///
/// Orders processed at or after `cutoff_hour` (local time) ship the next day;
/// earlier ones ship today.
#[must_use]
pub fn dispatch_date(now: NaiveDateTime, cutoff_hour: u32) -> NaiveDate {
    let today = now.date();
    if now.hour() >= cutoff_hour {
        today.succ_opt().unwrap_or(today)
    } else {
        today
    }
}

/// Wall-clock values stamped onto every record of one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchStamp {
    pub recorded_at: String,
    pub dispatch_date: String,
}

impl BatchStamp {
    #[must_use]
    pub fn new(now: NaiveDateTime, cutoff_hour: u32) -> Self {
        Self {
            recorded_at: now.format(RECORDED_AT_FORMAT).to_string(),
            dispatch_date: dispatch_date(now, cutoff_hour)
                .format(DATE_FORMAT)
                .to_string(),
        }
    }
}
