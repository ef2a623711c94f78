//! Multi-panel growth chart.
//!
//! One panel per region in a fixed 3×3 grid, one line per age band, drawn
//! over the interpretive background from [`background`], with a two-line
//! title and a source/timestamp footer.

pub mod background;
pub mod layout;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Days, NaiveDate, Utc};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;
use tracing::{debug, info};

use crate::records::{AgeBand, GrowthRow};
use crate::transform::filter::{DateRange, select_region};
use background::{BAND_ALPHA, RECENT_DAYS, RECENT_GREY, growth_bands, visible_annotations};
use layout::{
    DATE_FORMAT, FIGURE_SIZE, GRID, LEGEND_TITLE, REGIONS, TITLE, X_DESC, Y_DESC, month_starts,
};

const FONT: &str = "sans-serif";
const HEADER_HEIGHT: i32 = 70;
const FOOTER_HEIGHT: i32 = 50;

/// Text shown around the grid.
#[derive(Debug, Clone)]
pub struct ChartMeta {
    pub endpoint: String,
    pub generated_at: DateTime<Utc>,
}

/// Plottable content of one grid cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub region: &'static str,
    pub position: (usize, usize),
    pub lines: Vec<(AgeBand, Vec<(NaiveDate, f64)>)>,
    /// First and last of the panel's final [`RECENT_DAYS`] dates.
    pub recent: (NaiveDate, NaiveDate),
}

/// Selects each region's rows inside `range` and splits them into one line per age band.
///
/// # Errors
///
/// Returns an error if a region has no rows inside `range`.
pub fn prepare_panels(rows: &[GrowthRow], range: &DateRange) -> Result<Vec<Panel>> {
    REGIONS
        .iter()
        .enumerate()
        .map(|(index, &region)| {
            let selected = select_region(rows, region, range);
            if selected.is_empty() {
                bail!(
                    "no rows to plot for {region} between {} and {}",
                    range.from,
                    range.to
                );
            }

            let lines = AgeBand::ALL
                .iter()
                .map(|&band| {
                    let points = selected
                        .iter()
                        .filter(|r| r.age_band == band)
                        .filter_map(|r| r.growth_rate.map(|rate| (r.date, rate)))
                        .filter(|(_, rate)| rate.is_finite())
                        .collect();
                    (band, points)
                })
                .collect();

            let mut dates: Vec<NaiveDate> = selected.iter().map(|r| r.date).collect();
            dates.sort();
            dates.dedup();
            let recent = (dates[dates.len().saturating_sub(RECENT_DAYS)], dates[dates.len() - 1]);

            Ok(Panel {
                region,
                position: layout::grid_position(index),
                lines,
                recent,
            })
        })
        .collect()
}

/// Y range for every panel; a flat range is widened so the axis has extent.
pub fn axis_limits((lo, hi): (f64, f64)) -> (f64, f64) {
    if lo < hi { (lo, hi) } else { (lo - 1.0, hi + 1.0) }
}

/// Renders the full figure to a PNG at `path`, creating its parent directory.
#[tracing::instrument(skip(path, rows, meta), fields(path = %path.display(), rows = rows.len()))]
pub fn render_chart(
    path: &Path,
    rows: &[GrowthRow],
    range: &DateRange,
    value_bounds: (f64, f64),
    meta: &ChartMeta,
) -> Result<()> {
    let panels = prepare_panels(rows, range)?;
    let y_range = axis_limits(value_bounds);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create '{}'", parent.display()))?;
    }

    let root = BitMapBackend::new(path, FIGURE_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let (header, rest) = root.split_vertically(HEADER_HEIGHT);
    let rest_height = rest.dim_in_pixel().1 as i32;
    let (body, footer) = rest.split_vertically(rest_height - FOOTER_HEIGHT);

    draw_title(&header)?;

    let cells = body.split_evenly(GRID);
    for panel in &panels {
        let (row, col) = panel.position;
        draw_panel(&cells[row * GRID.1 + col], panel, range, y_range)?;
        debug!(region = panel.region, "Panel drawn");
    }

    draw_footer(&footer, meta)?;

    root.present()
        .with_context(|| format!("failed to write chart '{}'", path.display()))?;
    info!(path = %path.display(), "Chart saved");
    Ok(())
}

fn draw_title<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let (width, _) = area.dim_in_pixel();
    let centre = width as i32 / 2;
    let first = TextStyle::from((FONT, 24).into_font()).pos(Pos::new(HPos::Center, VPos::Top));
    let second = TextStyle::from((FONT, 18).into_font()).pos(Pos::new(HPos::Center, VPos::Top));

    area.draw_text(TITLE[0], &first, (centre, 10))?;
    area.draw_text(TITLE[1], &second, (centre, 40))?;
    Ok(())
}

fn draw_footer<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, meta: &ChartMeta) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let (width, _) = area.dim_in_pixel();
    let left = TextStyle::from((FONT, 12).into_font()).pos(Pos::new(HPos::Left, VPos::Top));
    let right = TextStyle::from((FONT, 12).into_font()).pos(Pos::new(HPos::Right, VPos::Top));

    for (i, line) in layout::source_lines(&meta.endpoint).iter().enumerate() {
        area.draw_text(line, &left, (20, 8 + 16 * i as i32))?;
    }
    area.draw_text(
        &layout::generated_line(meta.generated_at),
        &right,
        (width as i32 - 20, 8),
    )?;
    Ok(())
}

fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    panel: &Panel,
    range: &DateRange,
    (y_min, y_max): (f64, f64),
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let x_from = range.from;
    let x_to = if range.to > range.from {
        range.to
    } else {
        range.from + Days::new(1)
    };

    let mut chart = ChartBuilder::on(area)
        .caption(panel.region, (FONT, 16))
        .margin(8)
        .x_label_area_size(30)
        .y_label_area_size(45)
        .build_cartesian_2d((x_from..x_to).monthly(), y_min..y_max)?;

    // Room for one label per month start keeps the axis on monthly ticks.
    let ticks = month_starts(x_from, x_to).len() + 1;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(ticks)
        .x_label_formatter(&|d: &NaiveDate| d.format(DATE_FORMAT).to_string())
        .x_desc(X_DESC)
        .y_desc(Y_DESC)
        .label_style((FONT, 10))
        .axis_desc_style((FONT, 12))
        .draw()?;

    chart.draw_series(growth_bands(y_min, y_max).into_iter().map(|band| {
        Rectangle::new(
            [(x_from, band.upper), (x_to, band.lower)],
            band.color.mix(BAND_ALPHA).filled(),
        )
    }))?;

    let (recent_from, recent_to) = panel.recent;
    chart.draw_series(std::iter::once(Rectangle::new(
        [(recent_from, y_max), (recent_to, y_min)],
        RECENT_GREY.mix(BAND_ALPHA).filled(),
    )))?;

    let mid = x_from + Days::new((x_to - x_from).num_days() as u64 / 2);
    let note_color = BLACK.mix(0.5);
    let note_style = TextStyle::from((FONT, 10).into_font())
        .color(&note_color)
        .pos(Pos::new(HPos::Center, VPos::Bottom));
    chart.draw_series(
        visible_annotations(y_min, y_max)
            .into_iter()
            .map(|(label, y)| Text::new(label, (mid, y), note_style.clone())),
    )?;

    chart.draw_series(LineSeries::new(
        [(x_from, 0.0), (x_to, 0.0)],
        BLACK.mix(0.75).stroke_width(1),
    ))?;

    // Label-only entry heading the legend box.
    chart
        .draw_series(std::iter::empty::<PathElement<(NaiveDate, f64)>>())?
        .label(LEGEND_TITLE);

    for (index, (band, points)) in panel.lines.iter().enumerate() {
        let color = Palette99::pick(index).mix(1.0);
        chart
            .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))?
            .label(band.legend_label())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .label_font((FONT, 10))
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 10, d).unwrap()
    }

    fn rows_for(region: &str, days: std::ops::RangeInclusive<u32>) -> Vec<GrowthRow> {
        days.flat_map(|d| {
            AgeBand::ALL.into_iter().map(move |age_band| GrowthRow {
                date: day(d),
                age_band,
                region: region.to_string(),
                cases: 10,
                growth_rate: if d < 5 { None } else { Some(d as f64) },
            })
        })
        .collect()
    }

    fn all_regions(days: std::ops::RangeInclusive<u32>) -> Vec<GrowthRow> {
        REGIONS
            .iter()
            .flat_map(|r| rows_for(r, days.clone()))
            .collect()
    }

    #[test]
    fn test_prepare_panels_covers_grid() {
        let rows = all_regions(1..=20);
        let range = DateRange { from: day(3), to: day(20) };

        let panels = prepare_panels(&rows, &range).unwrap();

        assert_eq!(panels.len(), 9);
        assert_eq!(panels[0].region, "North West");
        assert_eq!(panels[0].position, (0, 0));
        assert_eq!(panels[8].region, "South East");
        assert_eq!(panels[8].position, (2, 2));
    }

    #[test]
    fn test_panel_lines_skip_undefined_rates() {
        let rows = all_regions(1..=20);
        let range = DateRange { from: day(3), to: day(20) };

        let panels = prepare_panels(&rows, &range).unwrap();
        let (band, points) = &panels[7].lines[0];

        assert_eq!(*band, AgeBand::Under20);
        assert_eq!(points.len(), 16);
        assert_eq!(points[0], (day(5), 5.0));
        assert_eq!(points.last(), Some(&(day(20), 20.0)));
    }

    #[test]
    fn test_panel_recent_window() {
        let rows = all_regions(1..=20);
        let range = DateRange { from: day(1), to: day(20) };
        let panels = prepare_panels(&rows, &range).unwrap();
        assert_eq!(panels[0].recent, (day(14), day(20)));

        let short = all_regions(1..=3);
        let panels = prepare_panels(&short, &range).unwrap();
        assert_eq!(panels[0].recent, (day(1), day(3)));
    }

    #[test]
    fn test_missing_region_is_error() {
        let rows: Vec<_> = REGIONS
            .iter()
            .filter(|r| **r != "London")
            .flat_map(|r| rows_for(r, 1..=10))
            .collect();
        let range = DateRange { from: day(1), to: day(10) };

        let err = prepare_panels(&rows, &range).unwrap_err();
        assert!(err.to_string().contains("London"));
    }

    #[test]
    fn test_region_outside_range_is_error() {
        let rows = all_regions(1..=10);
        let range = DateRange { from: day(11), to: day(20) };
        assert!(prepare_panels(&rows, &range).is_err());
    }

    #[test]
    fn test_render_chart_writes_png_into_new_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("images").join("chart.png");
        let rows = all_regions(1..=28);
        let range = DateRange { from: day(15), to: day(28) };
        let meta = ChartMeta {
            endpoint: "https://example.test/v2/data".into(),
            generated_at: Utc::now(),
        };

        render_chart(&path, &rows, &range, (15.0, 28.0), &meta).unwrap();

        assert!(path.parent().unwrap().is_dir());
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn test_render_chart_spanning_months() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.png");
        let start = NaiveDate::from_ymd_opt(2022, 9, 20).unwrap();
        let rows: Vec<GrowthRow> = REGIONS
            .iter()
            .flat_map(|region| {
                (0..80u64).flat_map(move |d| {
                    AgeBand::ALL.into_iter().map(move |age_band| GrowthRow {
                        date: start + Days::new(d),
                        age_band,
                        region: region.to_string(),
                        cases: 10,
                        growth_rate: Some((d as f64 / 10.0).sin() * 5.0),
                    })
                })
            })
            .collect();
        let range = DateRange {
            from: start + Days::new(14),
            to: start + Days::new(79),
        };
        let meta = ChartMeta {
            endpoint: String::new(),
            generated_at: Utc::now(),
        };

        render_chart(&path, &rows, &range, (-5.0, 5.0), &meta).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn test_axis_limits() {
        assert_eq!(axis_limits((-3.0, 4.0)), (-3.0, 4.0));
        assert_eq!(axis_limits((0.0, 0.0)), (-1.0, 1.0));
    }
}
