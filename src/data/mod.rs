//! Data module - CSV loading, filtering and cause aggregation

mod aggregator;
mod filter;
pub mod labels;
mod loader;
mod years;

pub use aggregator::{AggregateOptions, CauseAggregator, OthersPolicy};
pub use filter::RowFilter;
pub use loader::DataLoader;
pub use years::{normalize_year_column, YearRange};
