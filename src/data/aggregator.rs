//! Cause-of-Death Aggregator Module
//! Builds the yearly "top causes + Others" table behind the stacked bar chart.

use super::labels::short_label;
use super::loader::is_numeric_dtype;
use super::years::year_expr;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Name of the synthesized long-tail column.
pub const OTHERS_COLUMN: &str = "Others";

#[derive(Error, Debug)]
pub enum InputShapeError {
    #[error("Required column not found: {0}")]
    MissingColumn(String),
    #[error("No numeric cause columns in input")]
    NoCauseColumns,
    #[error("Cause label '{0}' is not unique after shortening")]
    DuplicateLabel(String),
}

#[derive(Error, Debug)]
pub enum AggregateError {
    #[error("Input shape error: {0}")]
    InputShape(#[from] InputShapeError),
    #[error("Cannot merge the last {window} causes into 'Others': only {causes} causes remain")]
    DegenerateMerge { causes: usize, window: usize },
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// How the lowest-ranked causes are folded into the `Others` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum OthersPolicy {
    /// Once the table (`Year` plus causes) is wider than `threshold`,
    /// the last `window` causes are merged.
    Literal { threshold: usize, window: usize },
    /// Keep the `keep` largest causes, merge everything after them.
    KeepTop { keep: usize },
}

impl Default for OthersPolicy {
    fn default() -> Self {
        OthersPolicy::Literal {
            threshold: 6,
            window: 8,
        }
    }
}

impl OthersPolicy {
    /// Number of ranked causes kept as individual columns, or `None` when
    /// nothing is merged.
    pub fn retained(&self, causes: usize) -> Result<Option<usize>, AggregateError> {
        match *self {
            OthersPolicy::Literal { threshold, window } => {
                // Table width is the causes plus the year column.
                if causes < threshold {
                    return Ok(None);
                }
                if window == 0 || causes < window {
                    return Err(AggregateError::DegenerateMerge { causes, window });
                }
                Ok(Some(causes - window))
            }
            OthersPolicy::KeepTop { keep } => Ok((causes > keep).then_some(keep)),
        }
    }
}

/// Column layout and merge settings for one aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateOptions {
    /// Entities containing any of these substrings are dropped.
    #[serde(default = "default_exclude_markers")]
    pub exclude_markers: Vec<String>,

    #[serde(default = "default_entity_column")]
    pub entity_column: String,

    #[serde(default = "default_year_column")]
    pub year_column: String,

    #[serde(default = "default_code_column")]
    pub code_column: String,

    #[serde(default)]
    pub others: OthersPolicy,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            exclude_markers: default_exclude_markers(),
            entity_column: default_entity_column(),
            year_column: default_year_column(),
            code_column: default_code_column(),
            others: OthersPolicy::default(),
        }
    }
}

fn default_exclude_markers() -> Vec<String> {
    vec!["G20", "World", "(WHO)", "(WB)", "OECD"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_entity_column() -> String {
    "Entity".to_string()
}

fn default_year_column() -> String {
    "Year".to_string()
}

fn default_code_column() -> String {
    "Code".to_string()
}

/// Stateless aggregation over an already loaded table.
pub struct CauseAggregator;

impl CauseAggregator {
    /// Aggregate causes of death per year.
    ///
    /// Output columns: [year, ranked causes..., optional "Others"], one row per
    /// distinct year (ascending). Cause columns are renamed to their short label
    /// and ordered by descending total across all years.
    pub fn aggregate_causes(
        rows: &DataFrame,
        options: &AggregateOptions,
    ) -> Result<DataFrame, AggregateError> {
        let causes = Self::cause_columns(rows, options)?;
        let labels = Self::short_labels(&causes, &options.year_column)?;

        let filtered =
            Self::drop_aggregate_entities(rows, &options.entity_column, &options.exclude_markers)?;

        // Entity and code columns fall away here: only the year key and the
        // summed causes survive the group-by.
        let sums: Vec<Expr> = causes
            .iter()
            .zip(&labels)
            .map(|(cause, label)| {
                col(cause.as_str())
                    .cast(DataType::Float64)
                    .sum()
                    .alias(label.as_str())
            })
            .collect();

        let year_key = year_expr(&filtered, &options.year_column)?;
        let missing_years = filtered.column(&options.year_column)?.null_count();
        if missing_years > 0 {
            debug!(
                "Dropping {} rows without a '{}' value",
                missing_years, options.year_column
            );
        }

        let grouped = filtered
            .clone()
            .lazy()
            .with_column(year_key)
            .filter(col(options.year_column.as_str()).is_not_null())
            .group_by([col(options.year_column.as_str())])
            .agg(sums)
            .sort(
                [options.year_column.as_str()],
                SortMultipleOptions::default(),
            )
            .collect()?;

        let ranked = Self::rank_by_total(&grouped, &labels)?;
        let mut columns = vec![grouped.column(&options.year_column)?.clone()];

        match options.others.retained(ranked.len())? {
            None => {
                for (label, _) in &ranked {
                    columns.push(grouped.column(label)?.clone());
                }
            }
            Some(retained) => {
                let (kept, merged) = ranked.split_at(retained);
                if let Some((label, _)) = kept.iter().find(|(l, _)| *l == OTHERS_COLUMN) {
                    return Err(InputShapeError::DuplicateLabel(label.clone()).into());
                }
                for (label, _) in kept {
                    columns.push(grouped.column(label)?.clone());
                }
                debug!(
                    "Merging {} causes into '{}': {:?}",
                    merged.len(),
                    OTHERS_COLUMN,
                    merged.iter().map(|(l, _)| l.as_str()).collect::<Vec<_>>()
                );
                columns.push(Self::row_sum(&grouped, merged)?);
            }
        }

        let table = DataFrame::new(columns)?;
        info!(
            "Aggregated {} causes over {} years into {} columns",
            ranked.len(),
            table.height(),
            table.width() - 1
        );
        Ok(table)
    }

    /// Numeric columns other than the entity, year and code columns.
    pub fn cause_columns(
        df: &DataFrame,
        options: &AggregateOptions,
    ) -> Result<Vec<String>, InputShapeError> {
        let keys = [
            options.entity_column.as_str(),
            options.year_column.as_str(),
            options.code_column.as_str(),
        ];
        for key in keys {
            if df.column(key).is_err() {
                return Err(InputShapeError::MissingColumn(key.to_string()));
            }
        }

        let mut causes = Vec::new();
        for column in df.get_columns() {
            let name = column.name().as_str();
            if keys.contains(&name) {
                continue;
            }
            if is_numeric_dtype(column.dtype()) {
                causes.push(name.to_string());
            } else {
                warn!("Ignoring non-numeric column '{}' ({})", name, column.dtype());
            }
        }

        if causes.is_empty() {
            return Err(InputShapeError::NoCauseColumns);
        }
        Ok(causes)
    }

    fn short_labels(causes: &[String], year_column: &str) -> Result<Vec<String>, InputShapeError> {
        let mut labels: Vec<String> = Vec::with_capacity(causes.len());
        for cause in causes {
            let label = short_label(cause).to_string();
            if label == year_column || labels.contains(&label) {
                return Err(InputShapeError::DuplicateLabel(label));
            }
            labels.push(label);
        }
        Ok(labels)
    }

    /// Drop rows whose entity contains any marker. Null entities are kept.
    fn drop_aggregate_entities(
        df: &DataFrame,
        entity_column: &str,
        markers: &[String],
    ) -> Result<DataFrame, AggregateError> {
        if markers.is_empty() {
            return Ok(df.clone());
        }

        let keep: Vec<bool> = df
            .column(entity_column)?
            .str()?
            .into_iter()
            .map(|entity| match entity {
                Some(name) => !markers.iter().any(|m| name.contains(m.as_str())),
                None => true,
            })
            .collect();

        let mask = BooleanChunked::new("keep".into(), keep);
        let filtered = df.filter(&mask)?;
        debug!(
            "Excluded {} aggregate-entity rows",
            df.height() - filtered.height()
        );
        Ok(filtered)
    }

    /// Labels ordered by descending column total; ties keep input order.
    fn rank_by_total(df: &DataFrame, labels: &[String]) -> PolarsResult<Vec<(String, f64)>> {
        let mut ranked = labels
            .iter()
            .map(|label| {
                let total = df.column(label)?.f64()?.sum().unwrap_or(0.0);
                Ok((label.clone(), total))
            })
            .collect::<PolarsResult<Vec<_>>>()?;
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        Ok(ranked)
    }

    fn row_sum(df: &DataFrame, merged: &[(String, f64)]) -> PolarsResult<Column> {
        let mut totals = vec![0.0f64; df.height()];
        for (label, _) in merged {
            let values = df.column(label)?.f64()?;
            for (slot, value) in totals.iter_mut().zip(values) {
                *slot += value.unwrap_or(0.0);
            }
        }
        Ok(Column::new(OTHERS_COLUMN.into(), totals))
    }
}
