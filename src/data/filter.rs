//! Row Filter Module
//! Country and year-range selection applied before any chart is built.

use super::years::{normalize_year_column, YearRange};
use polars::prelude::*;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Column not found: {0}")]
    MissingColumn(String),
}

/// Entity and year selection. An empty entity list keeps every entity.
#[derive(Debug, Clone, Default)]
pub struct RowFilter {
    pub entities: Vec<String>,
    pub years: Option<YearRange>,
}

impl RowFilter {
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.years.is_none()
    }

    /// Keep only rows matching the selected entities and year range.
    ///
    /// The year column of the result is normalised to `Int64` calendar years.
    pub fn apply(
        &self,
        df: &DataFrame,
        entity_column: &str,
        year_column: &str,
    ) -> Result<DataFrame, FilterError> {
        for column in [entity_column, year_column] {
            if df.column(column).is_err() {
                return Err(FilterError::MissingColumn(column.to_string()));
            }
        }

        let df = normalize_year_column(df, year_column)?;
        if self.is_empty() {
            return Ok(df);
        }

        let entities = df.column(entity_column)?.str()?;
        let years = df.column(year_column)?.i64()?;

        let keep: Vec<bool> = entities
            .into_iter()
            .zip(years)
            .map(|(entity, year)| {
                let entity_ok = self.entities.is_empty()
                    || entity.is_some_and(|e| self.entities.iter().any(|s| s.as_str() == e));
                let year_ok = match &self.years {
                    Some(range) => year.is_some_and(|y| range.contains(y)),
                    None => true,
                };
                entity_ok && year_ok
            })
            .collect();

        let mask = BooleanChunked::new("keep".into(), keep);
        let filtered = df.filter(&mask)?;
        debug!(
            "Row filter kept {} of {} rows",
            filtered.height(),
            df.height()
        );
        Ok(filtered)
    }
}
