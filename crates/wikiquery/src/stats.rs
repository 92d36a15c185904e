use std::collections::BTreeMap;

use serde::Deserialize;

use crate::client::{Transport, WikiClient};
use crate::date::Date;
use crate::error::Result;

/// Earliest month the statistics service has data for.
const EARLIEST_MONTH: Date = Date::first_of(2007, 1);

/// Page view counts summed over a date range.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageViewStats {
    pub total_views: i64,
    /// Per-month payloads keyed by `YYYYMM`.
    pub monthly: BTreeMap<String, MonthlyViews>,
}

/// One month of data from the statistics service. Counts are signed because
/// the service has been known to report placeholder values below zero.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct MonthlyViews {
    #[serde(default)]
    pub total_views: i64,
    /// Views per day, keyed by `YYYY-MM-DD`.
    #[serde(default)]
    pub daily_views: BTreeMap<String, i64>,
}

impl<T: Transport> WikiClient<T> {
    /// Page view counts for a title from `start` (inclusive) to `end`
    /// (exclusive), fetched month by month from the statistics service.
    /// Months before January 2007 are skipped; the service holds no earlier
    /// data.
    pub fn page_views(&self, title: &str, start: Date, end: Date) -> Result<PageViewStats> {
        let mut stats = PageViewStats::default();
        if end <= start {
            return Ok(stats);
        }

        let mut current = start.month_start().max(EARLIEST_MONTH);
        while current < end {
            let month = current.year_month();
            let url = self.stats_url(&month, title)?;
            let payload = self.fetch_json(&url)?;
            let views: MonthlyViews = serde_json::from_value(payload)?;
            stats.total_views += views.total_views;
            stats.monthly.insert(month, views);
            current = current.next_month();
        }
        Ok(stats)
    }
}
