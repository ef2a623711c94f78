//! Smoothed daily growth rate of the trailing 7-day case sum.
//!
//! Per (region, age band) series, in date order:
//! 1. trailing 7-row sum of cases,
//! 2. percent change between successive sums,
//! 3. exponential-window mean (7 wide, tau 5) of that change.
//!
//! The first [`WARM_UP_ROWS`] values of every series are undefined.

use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::records::{AgeBand, AggregatedRow, GrowthRow};
use crate::transform::utility::{exponential_weights, weighted_mean};

pub const SUM_WINDOW: usize = 7;
pub const SMOOTHING_WINDOW: usize = 7;
pub const TAU: f64 = 5.0;
/// Published metric compares each trailing sum with the previous day's.
pub const CHANGE_PERIODS: usize = 1;
pub const WARM_UP_ROWS: usize = (SUM_WINDOW - 1) + CHANGE_PERIODS + (SMOOTHING_WINDOW - 1);

/// Trailing sum over `window` rows. `None` until a full window is available
/// or if the sum overflows.
pub fn rolling_sum(values: &[i64], window: usize) -> Vec<Option<i64>> {
    (0..values.len())
        .map(|i| {
            if window == 0 || i + 1 < window {
                return None;
            }
            values[i + 1 - window..=i]
                .iter()
                .try_fold(0i64, |acc, v| acc.checked_add(*v))
        })
        .collect()
}

/// `(current / previous - 1) * 100` against the value `periods` rows earlier.
///
/// Undefined (`None`) when either side is undefined or the earlier value is
/// zero.
pub fn pct_change(values: &[Option<i64>], periods: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if periods == 0 || i < periods {
                return None;
            }
            match (values[i], values[i - periods]) {
                (Some(_), Some(0)) => None,
                (Some(current), Some(previous)) => {
                    Some((current as f64 / previous as f64 - 1.0) * 100.0)
                }
                _ => None,
            }
        })
        .collect()
}

/// Weighted mean of each trailing `window` values using
/// [`exponential_weights`]. `None` when any value in the window is undefined.
pub fn exponential_window_mean(values: &[Option<f64>], window: usize, tau: f64) -> Vec<Option<f64>> {
    let weights = exponential_weights(window, tau);
    (0..values.len())
        .map(|i| {
            if window == 0 || i + 1 < window {
                return None;
            }
            let slice: Option<Vec<f64>> = values[i + 1 - window..=i].iter().copied().collect();
            weighted_mean(&slice?, &weights)
        })
        .collect()
}

/// Published smoothed growth series for one date-ordered case series.
pub fn smoothed_growth(cases: &[i64]) -> Vec<Option<f64>> {
    smoothed_growth_from_sums(&rolling_sum(cases, SUM_WINDOW))
}

/// Steps 2 and 3 over already computed trailing sums.
pub fn smoothed_growth_from_sums(sums: &[Option<i64>]) -> Vec<Option<f64>> {
    let change = pct_change(sums, CHANGE_PERIODS);
    exponential_window_mean(&change, SMOOTHING_WINDOW, TAU)
}

/// Counts positions where a defined sum follows a zero window `periods` rows earlier.
fn zero_prior_windows(sums: &[Option<i64>], periods: usize) -> usize {
    (periods..sums.len())
        .filter(|&i| sums[i].is_some() && sums[i - periods] == Some(0))
        .count()
}

/// Computes the growth rate for every aggregated row, independently per
/// (region, age band). Rows come back grouped and date ordered.
pub fn growth_rates(rows: Vec<AggregatedRow>) -> Vec<GrowthRow> {
    let mut groups: BTreeMap<(String, AgeBand), Vec<AggregatedRow>> = BTreeMap::new();
    for row in rows {
        groups
            .entry((row.region.clone(), row.age_band))
            .or_default()
            .push(row);
    }

    let mut out = Vec::new();
    for ((region, age_band), mut series) in groups {
        series.sort_by_key(|r| r.date);
        let cases: Vec<i64> = series.iter().map(|r| r.cases).collect();

        let sums = rolling_sum(&cases, SUM_WINDOW);
        let zero_prior = zero_prior_windows(&sums, CHANGE_PERIODS);
        if zero_prior > 0 {
            warn!(
                region = %region,
                age_band = %age_band,
                zero_prior,
                "Growth undefined after zero-case windows"
            );
        }

        let rates = smoothed_growth_from_sums(&sums);
        debug!(
            region = %region,
            age_band = %age_band,
            rows = series.len(),
            defined = rates.iter().filter(|r| r.is_some()).count(),
            "Growth series computed"
        );

        out.extend(series.into_iter().zip(rates).map(|(row, growth_rate)| GrowthRow {
            date: row.date,
            age_band: row.age_band,
            region: row.region,
            cases: row.cases,
            growth_rate,
        }));
    }

    out
}
