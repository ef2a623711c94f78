//! Orchestration of a single report run:
//! fetch → parse → normalize → ingest window → aggregate → growth →
//! stage → reload → chart.

use anyhow::{Result, bail};
use chrono::Utc;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::chart::{ChartMeta, render_chart};
use crate::config::PipelineConfig;
use crate::fetch::{HttpClient, load_source};
use crate::parser::parse_cases;
use crate::records::{CaseRecord, GrowthRow};
use crate::staging::StagingStore;
use crate::transform::age::normalize;
use crate::transform::aggregate::aggregate;
use crate::transform::filter::{DateRange, value_bounds, within_ingest_window};
use crate::transform::growth::growth_rates;

/// Counts reported at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub fetched_rows: usize,
    pub staged_rows: usize,
    pub chart_path: PathBuf,
}

/// Turns parsed feed rows into growth rows, entirely in memory.
///
/// # Errors
///
/// Returns an error if no rows survive age-band normalization and the ingest
/// window, or if aggregation overflows.
#[tracing::instrument(skip(records, config), fields(rows = records.len()))]
pub fn compute(records: Vec<CaseRecord>, config: &PipelineConfig) -> Result<Vec<GrowthRow>> {
    let (banded, summary) = normalize(records);
    if summary.dropped_total() > 0 {
        info!(
            kept = summary.kept,
            dropped = summary.dropped_total(),
            labels = ?summary.dropped.keys().collect::<Vec<_>>(),
            "Rows outside the retained age bands dropped"
        );
    }

    let windowed = within_ingest_window(banded, &config.ingest);
    if windowed.is_empty() {
        bail!(
            "no rows left after the ingest window (from {:?}, to {:?})",
            config.ingest.from,
            config.ingest.to
        );
    }

    let aggregated = aggregate(&windowed)?;
    let rows = growth_rates(aggregated);

    let undefined = rows.iter().filter(|r| r.growth_rate.is_none()).count();
    info!(rows = rows.len(), undefined, "Growth rates computed");
    Ok(rows)
}

/// Rebuilds the staging table and writes `rows` into it.
pub fn stage(store: &mut StagingStore, rows: &[GrowthRow]) -> Result<usize> {
    store.create()?;
    store.insert(rows)
}

/// Reloads the staged rows and renders the chart.
///
/// # Errors
///
/// Returns an error if the table is empty, a region has nothing to plot, or
/// no growth rate inside the plotting range is defined.
#[tracing::instrument(skip_all, fields(table = store.table()))]
pub fn render_from_store(
    store: &StagingStore,
    config: &PipelineConfig,
    meta: &ChartMeta,
) -> Result<()> {
    let rows = store.select_all()?;
    if rows.is_empty() {
        bail!("staging table '{}' is empty", store.table());
    }

    let range = DateRange::resolve(&rows, &config.plot)?;
    if range.from > range.to {
        warn!(from = %range.from, to = %range.to, "Plotting range is inverted");
    }
    let bounds = value_bounds(&rows, &range)?;
    info!(from = %range.from, to = %range.to, min = bounds.0, max = bounds.1, "Plotting range resolved");

    render_chart(&config.output_path, &rows, &range, bounds, meta)
}

/// Runs the whole report against `source` (a URL or a local CSV path).
#[tracing::instrument(skip(client, config))]
pub async fn run<C: HttpClient>(
    client: &C,
    config: &PipelineConfig,
    source: &str,
) -> Result<RunSummary> {
    let bytes = load_source(client, source).await?;
    let records = parse_cases(&bytes)?;
    let fetched_rows = records.len();
    info!(rows = fetched_rows, "Feed rows parsed");

    let rows = compute(records, config)?;

    let mut store = StagingStore::open(&config.staging.db_path, &config.staging.table)?;
    let staged_rows = stage(&mut store, &rows)?;
    drop(rows);

    let meta = ChartMeta {
        endpoint: config.api.endpoint(),
        generated_at: Utc::now(),
    };
    render_from_store(&store, config, &meta)?;

    Ok(RunSummary {
        fetched_rows,
        staged_rows,
        chart_path: config.output_path.clone(),
    })
}
