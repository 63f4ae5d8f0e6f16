//! Charts module - Chart series and static rendering

mod renderer;
mod series;

pub use renderer::{format_count, ChartStyle, StaticChartRenderer};
pub use series::{NamedSeries, ScatterPanel, StackedSeries};
