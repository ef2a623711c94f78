use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::records::{AgeBand, BandedRecord, CaseRecord};

const UNDER_20: &[&str] = &["00_04", "05_09", "10_14", "15_19"];
const AGE_20_TO_59: &[&str] = &[
    "20_24", "25_29", "30_34", "35_39", "40_44", "45_49", "50_54", "55_59",
];

/// Maps a feed age label to its coarse band.
///
/// Returns `None` for every label outside the two retained bands: the `60+`
/// aggregate (summing it with the deciles would double count), the individual
/// 60-plus deciles, `00_59` and `unassigned`.
pub fn band_for(label: &str) -> Option<AgeBand> {
    if UNDER_20.contains(&label) {
        Some(AgeBand::Under20)
    } else if AGE_20_TO_59.contains(&label) {
        Some(AgeBand::Age20To59)
    } else {
        None
    }
}

/// Outcome of [`normalize`]: how many rows were kept and which labels were dropped.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct NormalizeSummary {
    pub kept: usize,
    pub dropped: BTreeMap<String, usize>,
}

impl NormalizeSummary {
    pub fn dropped_total(&self) -> usize {
        self.dropped.values().sum()
    }
}

/// Re-buckets feed rows into [`AgeBand`]s, dropping rows whose label maps to no band.
pub fn normalize(records: Vec<CaseRecord>) -> (Vec<BandedRecord>, NormalizeSummary) {
    let mut summary = NormalizeSummary::default();
    let mut banded = Vec::with_capacity(records.len());

    for record in records {
        match band_for(&record.age) {
            Some(age_band) => {
                summary.kept += 1;
                banded.push(BandedRecord {
                    date: record.date,
                    age_band,
                    region: record.area_name,
                    cases: record.cases,
                });
            }
            None => *summary.dropped.entry(record.age).or_default() += 1,
        }
    }

    for (label, count) in &summary.dropped {
        debug!(label = %label, count, "Dropped rows outside retained age bands");
    }
    if summary.kept == 0 && summary.dropped_total() > 0 {
        warn!(dropped = summary.dropped_total(), "No rows fall into a retained age band");
    }

    (banded, summary)
}
