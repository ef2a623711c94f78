use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::records::{AgeBand, AggregatedRow, BandedRecord};

/// Sums cases per (age band, region, date).
///
/// Output holds one row per distinct key, ordered by region, then age band,
/// then date, so each group's series is already date ordered.
///
/// # Errors
///
/// Returns an error if a key's total overflows `i64`.
pub fn aggregate(records: &[BandedRecord]) -> Result<Vec<AggregatedRow>> {
    let mut totals: BTreeMap<(&str, AgeBand, NaiveDate), i64> = BTreeMap::new();

    for record in records {
        let total = totals
            .entry((record.region.as_str(), record.age_band, record.date))
            .or_default();
        *total = total.checked_add(record.cases).ok_or_else(|| {
            anyhow!(
                "case total overflow for {} / {} / {}",
                record.region,
                record.age_band,
                record.date
            )
        })?;
    }

    Ok(totals
        .into_iter()
        .map(|((region, age_band, date), cases)| AggregatedRow {
            date,
            age_band,
            region: region.to_string(),
            cases,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 9, d).unwrap()
    }

    fn banded(region: &str, age_band: AgeBand, d: u32, cases: i64) -> BandedRecord {
        BandedRecord {
            date: day(d),
            age_band,
            region: region.to_string(),
            cases,
        }
    }

    #[test]
    fn test_sums_duplicate_keys() {
        let rows = aggregate(&[
            banded("London", AgeBand::Under20, 1, 3),
            banded("London", AgeBand::Under20, 1, 4),
            banded("London", AgeBand::Under20, 1, 5),
            banded("London", AgeBand::Age20To59, 1, 10),
        ])
        .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].age_band, AgeBand::Under20);
        assert_eq!(rows[0].cases, 12);
        assert_eq!(rows[1].cases, 10);
    }

    #[test]
    fn test_order_independent() {
        let mut input = vec![
            banded("North East", AgeBand::Under20, 2, 1),
            banded("London", AgeBand::Under20, 1, 2),
            banded("North East", AgeBand::Under20, 2, 30),
            banded("London", AgeBand::Age20To59, 3, 5),
            banded("London", AgeBand::Under20, 1, 7),
        ];
        let forward = aggregate(&input).unwrap();
        input.reverse();
        let backward = aggregate(&input).unwrap();

        assert_eq!(forward, backward);
        let total: i64 = forward.iter().map(|r| r.cases).sum();
        assert_eq!(total, 45);
    }

    #[test]
    fn test_output_sorted_by_group_then_date() {
        let rows = aggregate(&[
            banded("London", AgeBand::Under20, 3, 1),
            banded("London", AgeBand::Under20, 1, 1),
            banded("East Midlands", AgeBand::Under20, 2, 1),
            banded("London", AgeBand::Under20, 2, 1),
        ])
        .unwrap();

        assert_eq!(rows[0].region, "East Midlands");
        let london: Vec<_> = rows[1..].iter().map(|r| r.date).collect();
        assert_eq!(london, vec![day(1), day(2), day(3)]);
    }

    #[test]
    fn test_overflow_is_error() {
        let result = aggregate(&[
            banded("London", AgeBand::Under20, 1, i64::MAX),
            banded("London", AgeBand::Under20, 1, 1),
        ]);
        assert!(result.is_err());
    }
}
