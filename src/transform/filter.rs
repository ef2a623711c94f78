use anyhow::{Result, bail};
use chrono::{Days, NaiveDate};

use crate::config::DateWindow;
use crate::records::{BandedRecord, GrowthRow};

/// Days skipped at the start of the data when no plotting lower bound is set.
pub const WARM_UP_DAYS: u64 = 14;

/// Keeps rows strictly inside the ingest window (`from < date < to`).
/// Unset bounds do not constrain.
pub fn within_ingest_window(records: Vec<BandedRecord>, window: &DateWindow) -> Vec<BandedRecord> {
    records
        .into_iter()
        .filter(|r| window.from.is_none_or(|from| r.date > from))
        .filter(|r| window.to.is_none_or(|to| r.date < to))
        .collect()
}

/// Inclusive plotting range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    /// Resolves the range against the full (all regions) row set. Without an
    /// explicit `from`, the lower bound is the earliest date plus
    /// [`WARM_UP_DAYS`]; without `to`, the latest date.
    ///
    /// # Errors
    ///
    /// Returns an error if `rows` is empty.
    pub fn resolve(rows: &[GrowthRow], window: &DateWindow) -> Result<Self> {
        let Some(min) = rows.iter().map(|r| r.date).min() else {
            bail!("no staged rows to resolve a date range from");
        };
        let max = rows.iter().map(|r| r.date).max().unwrap_or(min);

        let from = match window.from {
            Some(from) => from,
            None => min + Days::new(WARM_UP_DAYS),
        };
        let to = window.to.unwrap_or(max);

        Ok(Self { from, to })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

/// Rows for exactly `region` within `range`, ordered by age band then date.
pub fn select_region<'a>(rows: &'a [GrowthRow], region: &str, range: &DateRange) -> Vec<&'a GrowthRow> {
    let mut selected: Vec<&GrowthRow> = rows
        .iter()
        .filter(|r| r.region == region && range.contains(r.date))
        .collect();
    selected.sort_by_key(|r| (r.age_band, r.date));
    selected
}

/// Smallest and largest defined growth rate inside `range` across all regions.
///
/// # Errors
///
/// Returns an error if no row in range has a finite growth rate.
pub fn value_bounds(rows: &[GrowthRow], range: &DateRange) -> Result<(f64, f64)> {
    let values = rows
        .iter()
        .filter(|r| range.contains(r.date))
        .filter_map(|r| r.growth_rate)
        .filter(|v| v.is_finite());

    let bounds = values.fold(None, |acc: Option<(f64, f64)>, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    });

    match bounds {
        Some(bounds) => Ok(bounds),
        None => bail!(
            "no defined growth rates between {} and {}",
            range.from,
            range.to
        ),
    }
}
