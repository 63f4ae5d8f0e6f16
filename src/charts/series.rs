//! Chart Series Module
//! Typed views over the tables the renderer draws.

use crate::data::labels::panel_title;
use crate::data::normalize_year_column;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One stacked bar series (a cause, or `Others`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedSeries {
    pub name: String,
    pub values: Vec<f64>,
}

/// Aggregated table as chart input: x = year, one stacked series per column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackedSeries {
    pub years: Vec<i64>,
    pub series: Vec<NamedSeries>,
}

/// Vertical span of one series in one bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarSegment {
    pub year: i64,
    pub series_index: usize,
    pub bottom: f64,
    pub top: f64,
}

impl StackedSeries {
    /// Build from an aggregated table whose first column is the year.
    pub fn from_aggregated(df: &DataFrame) -> PolarsResult<Self> {
        let mut columns = df.get_columns().iter();
        let Some(year_col) = columns.next() else {
            return Ok(Self {
                years: Vec::new(),
                series: Vec::new(),
            });
        };

        let years = year_col
            .cast(&DataType::Int64)?
            .i64()?
            .into_iter()
            .map(|y| y.unwrap_or_default())
            .collect();

        let series = columns
            .map(|column| {
                let values = column
                    .cast(&DataType::Float64)?
                    .f64()?
                    .into_iter()
                    .map(|v| v.unwrap_or(0.0))
                    .collect();
                Ok(NamedSeries {
                    name: column.name().to_string(),
                    values,
                })
            })
            .collect::<PolarsResult<Vec<_>>>()?;

        Ok(Self { years, series })
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty() || self.series.is_empty()
    }

    /// Height of each stacked bar.
    pub fn bar_totals(&self) -> Vec<f64> {
        (0..self.years.len())
            .map(|i| self.series.iter().map(|s| s.values[i]).sum())
            .collect()
    }

    /// Stacked spans, bar by bar, series stacked in column order from the
    /// axis upwards.
    pub fn segments(&self) -> Vec<BarSegment> {
        let mut segments = Vec::with_capacity(self.years.len() * self.series.len());
        for (i, &year) in self.years.iter().enumerate() {
            let mut bottom = 0.0;
            for (series_index, series) in self.series.iter().enumerate() {
                let top = bottom + series.values[i];
                segments.push(BarSegment {
                    year,
                    series_index,
                    bottom,
                    top,
                });
                bottom = top;
            }
        }
        segments
    }
}

/// Per-entity scatter of one cause column over the years.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterPanel {
    pub column: String,
    pub title: String,
    pub points_by_entity: BTreeMap<String, Vec<(i64, f64)>>,
}

impl ScatterPanel {
    /// Collect `(year, value)` points per entity, skipping nulls and NaNs.
    pub fn from_rows(
        df: &DataFrame,
        column: &str,
        entity_column: &str,
        year_column: &str,
    ) -> PolarsResult<Self> {
        let df = normalize_year_column(df, year_column)?;
        let entities = df.column(entity_column)?.str()?;
        let years = df.column(year_column)?.i64()?;
        let values = df.column(column)?.cast(&DataType::Float64)?;
        let values = values.f64()?;

        let mut points_by_entity: BTreeMap<String, Vec<(i64, f64)>> = BTreeMap::new();
        for ((entity, year), value) in entities.into_iter().zip(years).zip(values) {
            if let (Some(entity), Some(year), Some(value)) = (entity, year, value) {
                if !value.is_nan() {
                    points_by_entity
                        .entry(entity.to_string())
                        .or_default()
                        .push((year, value));
                }
            }
        }
        for points in points_by_entity.values_mut() {
            points.sort_by_key(|&(year, _)| year);
        }

        Ok(Self {
            column: column.to_string(),
            title: panel_title(column),
            points_by_entity,
        })
    }

    pub fn year_bounds(&self) -> Option<(i64, i64)> {
        let mut years = self.points_by_entity.values().flatten().map(|&(y, _)| y);
        let first = years.next()?;
        Some(years.fold((first, first), |(lo, hi), y| (lo.min(y), hi.max(y))))
    }

    pub fn max_value(&self) -> f64 {
        self.points_by_entity
            .values()
            .flatten()
            .map(|&(_, v)| v)
            .fold(0.0, f64::max)
    }
}
