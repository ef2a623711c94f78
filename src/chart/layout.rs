use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};

pub const FIGURE_SIZE: (u32, u32) = (1800, 900);
pub const GRID: (usize, usize) = (3, 3);

/// Regions in row-major grid order, roughly following the map:
///
/// ```text
/// North West     Yorkshire and The Humber  North East
/// West Midlands  East Midlands             East of England
/// South West     London                    South East
/// ```
pub const REGIONS: [&str; 9] = [
    "North West",
    "Yorkshire and The Humber",
    "North East",
    "West Midlands",
    "East Midlands",
    "East of England",
    "South West",
    "London",
    "South East",
];

pub const TITLE: [&str; 2] = [
    "Daily Growth (%) for Trailing 7 Day +VE Covid Test Counts",
    "7 Day Exponential Moving Average (Tau=5), by Specimen Date, Stratified by Age Range",
];

pub const X_DESC: &str = "Date";
pub const Y_DESC: &str = "% Daily Growth";
pub const DATE_FORMAT: &str = "%d / %m / %y";
pub const LEGEND_TITLE: &str = "Age Range";

/// (row, column) of the panel at `index` in [`REGIONS`].
pub fn grid_position(index: usize) -> (usize, usize) {
    (index / GRID.1, index % GRID.1)
}

/// First days of the months falling inside `from..=to`; one x tick each.
pub fn month_starts(from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(from.year(), from.month(), 1).and_then(|start| {
        if start < from {
            start.checked_add_months(Months::new(1))
        } else {
            Some(start)
        }
    });
    std::iter::successors(first, |d| d.checked_add_months(Months::new(1)))
        .take_while(|d| *d <= to)
        .collect()
}

/// Left footer: where the data came from.
pub fn source_lines(endpoint: &str) -> [String; 2] {
    ["Data Source: UK Covid Dashboard".to_string(), endpoint.to_string()]
}

/// Right footer: when the chart was generated (UTC).
pub fn generated_line(at: DateTime<Utc>) -> String {
    format!(
        "generated on {} at {}",
        at.format("%d-%m-%Y"),
        at.format("%H:%M:%S")
    )
}
