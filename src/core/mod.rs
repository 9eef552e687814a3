pub mod config;
pub mod diagnostics;
pub mod distance_metric;
pub mod embedding;
pub mod error;
pub mod natural;
pub mod sparse;
pub mod table;
pub mod tav;
