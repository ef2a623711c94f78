//! Run configuration.
//!
//! [`PipelineConfig`] is built once (defaults, then an optional JSON file,
//! then CLI overrides) and handed to the pipeline by reference. Stored on disk
//! as a JSON object; every key is optional:
//! ```json
//! {
//!   "api": { "base_url": "https://api.coronavirus.data.gov.uk", "version": "v2" },
//!   "staging": { "db_path": "data/example.db", "table": "cases_by_specdate" },
//!   "ingest": { "from": "2022-08-01", "to": "2023-02-14" },
//!   "plot": { "from": null, "to": null },
//!   "output_path": "docs/images/UCD_Growth_By_Region_+_Age.png"
//! }
//! ```

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Request parameters for the dashboard data endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub version: String,
    pub area_type: String,
    pub metric: String,
    pub format: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.coronavirus.data.gov.uk".into(),
            version: "v2".into(),
            area_type: "region".into(),
            metric: "newCasesBySpecimenDateAgeDemographics".into(),
            format: "csv".into(),
        }
    }
}

impl ApiConfig {
    /// Renders the templated data URL.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/{}/data?areaType={}&metric={}&format={}",
            self.base_url.trim_end_matches('/'),
            self.version,
            self.area_type,
            self.metric,
            self.format
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StagingConfig {
    pub db_path: PathBuf,
    pub table: String,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("data/example.db"),
            table: "cases_by_specdate".into(),
        }
    }
}

/// Optional lower and upper date bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DateWindow {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub api: ApiConfig,
    pub staging: StagingConfig,
    /// Exclusive window applied to raw rows before aggregation.
    pub ingest: DateWindow,
    /// Inclusive window for each chart panel; unset bounds fall back to the
    /// data's own range after warm-up.
    pub plot: DateWindow,
    pub output_path: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            staging: StagingConfig::default(),
            ingest: DateWindow {
                from: NaiveDate::from_ymd_opt(2022, 8, 1),
                to: NaiveDate::from_ymd_opt(2023, 2, 14),
            },
            plot: DateWindow::default(),
            output_path: PathBuf::from("docs/images/UCD_Growth_By_Region_+_Age.png"),
        }
    }
}

impl PipelineConfig {
    /// Loads the config from a JSON file at `path`, filling absent keys with defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("invalid config file '{}'", path.display()))?;
        Ok(config)
    }

    /// Loads from `path` when given, otherwise returns the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
