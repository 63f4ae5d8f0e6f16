//! Year handling: normalising the year column and the year-range control.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum YearRangeError {
    #[error("Year range is inverted: {min} > {max}")]
    Inverted { min: i64, max: i64 },
    #[error("Year range mark step must be at least 1")]
    ZeroStep,
}

/// Fixed configuration of the year-range selector: bounds, tick marks and
/// the tooltip shown on the handles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    #[serde(default = "default_min")]
    pub min: i64,

    #[serde(default = "default_max")]
    pub max: i64,

    /// Distance between labelled marks.
    #[serde(default = "default_mark_step")]
    pub mark_step: usize,

    /// Tooltip template, `{value}` is replaced by the year.
    #[serde(default = "default_tooltip")]
    pub tooltip: String,
}

impl Default for YearRange {
    fn default() -> Self {
        Self {
            min: default_min(),
            max: default_max(),
            mark_step: default_mark_step(),
            tooltip: default_tooltip(),
        }
    }
}

fn default_min() -> i64 {
    1990
}

fn default_max() -> i64 {
    2019
}

fn default_mark_step() -> usize {
    2
}

fn default_tooltip() -> String {
    "{value}".to_string()
}

impl YearRange {
    pub fn new(min: i64, max: i64) -> Result<Self, YearRangeError> {
        let range = Self {
            min,
            max,
            ..Self::default()
        };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<(), YearRangeError> {
        if self.min > self.max {
            return Err(YearRangeError::Inverted {
                min: self.min,
                max: self.max,
            });
        }
        if self.mark_step == 0 {
            return Err(YearRangeError::ZeroStep);
        }
        Ok(())
    }

    /// Inclusive on both ends.
    pub fn contains(&self, year: i64) -> bool {
        (self.min..=self.max).contains(&year)
    }

    /// Labelled marks from `min` through `max + 1`, every `mark_step` years,
    /// labelled with the two-digit year (`'90`, `'92`, ...).
    pub fn marks(&self) -> Vec<(i64, String)> {
        (self.min..=self.max.saturating_add(1))
            .step_by(self.mark_step.max(1))
            .map(|year| (year, Self::mark_label(year)))
            .collect()
    }

    pub fn mark_label(year: i64) -> String {
        format!("'{:02}", year.rem_euclid(100))
    }

    pub fn tooltip_for(&self, year: i64) -> String {
        self.tooltip.replace("{value}", &year.to_string())
    }
}

/// Expression turning the year column into plain `Int64` calendar years.
///
/// Date and datetime columns are truncated to their year; anything else is cast.
pub fn year_expr(df: &DataFrame, year_column: &str) -> PolarsResult<Expr> {
    let expr = match df.column(year_column)?.dtype() {
        DataType::Date | DataType::Datetime(_, _) => {
            col(year_column).dt().year().cast(DataType::Int64)
        }
        _ => col(year_column).cast(DataType::Int64),
    };
    Ok(expr.alias(year_column))
}

/// Copy of `df` with the year column normalised by [`year_expr`].
pub fn normalize_year_column(df: &DataFrame, year_column: &str) -> PolarsResult<DataFrame> {
    let expr = year_expr(df, year_column)?;
    df.clone().lazy().with_column(expr).collect()
}
