//! Storage abstraction for cached quotations

use crate::core::error::QuoteError;
use crate::core::quotation::Quotation;
use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveTime, TimeDelta, TimeZone};

/// Append-only table of quotations. At most one row exists per timestamp.
#[async_trait]
pub trait QuotationStore: Send + Sync {
    /// Returns a quotation observed between the start of `now`'s local day and `now`.
    async fn find_today(&self, now: DateTime<Local>) -> Result<Option<Quotation>, QuoteError>;

    async fn find_by_timestamp(&self, timestamp: i64) -> Result<Option<Quotation>, QuoteError>;

    /// Stores `quotation` unless a row with its timestamp already exists.
    ///
    /// Returns the row that ends up stored for the timestamp, which is the
    /// earlier one when another writer got there first.
    async fn insert(&self, quotation: &Quotation) -> Result<Quotation, QuoteError>;
}

/// Epoch seconds of the first instant of `now`'s local date.
///
/// That is local midnight, or the first local time after it when a DST jump
/// skips midnight.
pub fn start_of_local_day<Tz: TimeZone>(now: &DateTime<Tz>) -> i64 {
    let tz = now.timezone();
    let wall_clock = now.naive_local();
    let mut candidate = now.date_naive().and_time(NaiveTime::MIN);
    while candidate <= wall_clock {
        if let Some(start) = tz.from_local_datetime(&candidate).earliest() {
            return start.timestamp();
        }
        candidate += TimeDelta::minutes(1);
    }
    now.timestamp()
}
