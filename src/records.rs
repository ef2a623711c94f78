//! Record types flowing through the pipeline, from the raw feed row to the
//! staged growth-rate row.

use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single row of the regional age-demographics feed.
///
/// Only the columns the pipeline needs are typed; the feed's other columns
/// (`areaCode`, `areaType`, `rollingSum`, `rollingRate`) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CaseRecord {
    pub date: NaiveDate,
    pub age: String,
    #[serde(rename = "areaName")]
    pub area_name: String,
    pub cases: i64,
}

/// Coarse age category the fine-grained feed bands are collapsed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum AgeBand {
    #[serde(rename = "under-20")]
    Under20,
    #[serde(rename = "20-59")]
    Age20To59,
}

impl AgeBand {
    pub const ALL: [AgeBand; 2] = [AgeBand::Under20, AgeBand::Age20To59];

    /// Label stored in the staging table.
    pub fn label(self) -> &'static str {
        match self {
            AgeBand::Under20 => "under-20",
            AgeBand::Age20To59 => "20-59",
        }
    }

    /// Label shown in chart legends.
    pub fn legend_label(self) -> &'static str {
        match self {
            AgeBand::Under20 => "00 - 19",
            AgeBand::Age20To59 => "20 - 59",
        }
    }
}

impl fmt::Display for AgeBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AgeBand {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "under-20" => Ok(AgeBand::Under20),
            "20-59" => Ok(AgeBand::Age20To59),
            other => bail!("unknown age band label '{other}'"),
        }
    }
}

/// A feed row after its age label has been mapped to an [`AgeBand`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandedRecord {
    pub date: NaiveDate,
    pub age_band: AgeBand,
    pub region: String,
    pub cases: i64,
}

/// Total cases for one (age band, region, date) key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedRow {
    pub date: NaiveDate,
    pub age_band: AgeBand,
    pub region: String,
    pub cases: i64,
}

/// An aggregated row with its smoothed daily growth rate.
///
/// `growth_rate` is `None` during the warm-up period and wherever the rate
/// is undefined. Serialized with the staging table's column names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthRow {
    pub date: NaiveDate,
    #[serde(rename = "age")]
    pub age_band: AgeBand,
    #[serde(rename = "areaName")]
    pub region: String,
    pub cases: i64,
    #[serde(rename = "cases_ma_7day")]
    pub growth_rate: Option<f64>,
}
