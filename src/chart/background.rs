//! Interpretive background of each panel: growth bands and doubling/halving
//! annotations.

use plotters::style::RGBColor;

pub const GROWTH_RED: RGBColor = RGBColor(0xFF, 0xE1, 0xE1);
pub const GROWTH_YELLOW: RGBColor = RGBColor(0xFF, 0xFF, 0xE1);
pub const SHRINK_GREEN: RGBColor = RGBColor(0xE1, 0xFF, 0xE1);
pub const RECENT_GREY: RGBColor = RGBColor(0xDD, 0xDD, 0xDD);
pub const BAND_ALPHA: f64 = 0.5;

/// Days covered by the "recent" shading at the right edge of each panel.
pub const RECENT_DAYS: usize = 7;

/// Growth above this is shaded red.
const FAST_GROWTH: f64 = 5.0;

/// Daily growth rates at which cases double or halve over a given number of days.
pub const ANNOTATIONS: [(&str, f64); 5] = [
    ("14 day doubling", 5.0),
    ("7 day doubling", 10.0),
    ("5 day doubling", 15.0),
    ("14 day halving", -5.0),
    ("7 day halving", -10.0),
];

/// A horizontal band between two growth rates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub lower: f64,
    pub upper: f64,
    pub color: RGBColor,
}

/// Bands clipped to `[y_min, y_max]`; bands outside the range are omitted.
pub fn growth_bands(y_min: f64, y_max: f64) -> Vec<Band> {
    [
        (FAST_GROWTH, f64::INFINITY, GROWTH_RED),
        (0.0, FAST_GROWTH, GROWTH_YELLOW),
        (f64::NEG_INFINITY, 0.0, SHRINK_GREEN),
    ]
    .into_iter()
    .filter_map(|(lower, upper, color)| {
        let lower = lower.max(y_min);
        let upper = upper.min(y_max);
        (lower < upper).then_some(Band { lower, upper, color })
    })
    .collect()
}

/// Annotations whose threshold falls inside `[y_min, y_max]`.
pub fn visible_annotations(y_min: f64, y_max: f64) -> Vec<(&'static str, f64)> {
    ANNOTATIONS
        .into_iter()
        .filter(|(_, y)| (y_min..=y_max).contains(y))
        .collect()
}
