pub mod chart;
pub mod config;
pub mod fetch;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod records;
pub mod staging;
pub mod transform;
