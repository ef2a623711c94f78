//! In-memory transforms from parsed feed rows to growth-rate rows.
//!
//! Age-band normalization, the ingest date window, aggregation per
//! (age band, region, date), the smoothed growth rate, and the per-region
//! plotting filter.

pub mod age;
pub mod aggregate;
pub mod filter;
pub mod growth;
pub mod utility;
