//! Stats module - per-cause summaries of the aggregated table

mod summary;

pub use summary::SummaryCalculator;
