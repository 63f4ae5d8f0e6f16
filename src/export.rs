//! Table Export Module
//! Writes the aggregated table to CSV or JSON, picked by file extension.

use crate::charts::StackedSeries;
use polars::prelude::*;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported export format '{0}' (use .csv or .json)")]
    UnsupportedFormat(String),
}

pub struct TableExporter;

impl TableExporter {
    /// Write `table` to `path`; `.csv` keeps the table layout, `.json` writes
    /// the `{ years, series }` chart form.
    pub fn write(table: &DataFrame, path: &Path) -> Result<(), ExportError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "csv" => Self::write_csv(table, path)?,
            "json" => Self::write_json(table, path)?,
            _ => return Err(ExportError::UnsupportedFormat(ext)),
        }

        info!("Aggregated table written to {}", path.display());
        Ok(())
    }

    fn write_csv(table: &DataFrame, path: &Path) -> Result<(), ExportError> {
        let mut file = File::create(path)?;
        let mut table = table.clone();
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut table)?;
        Ok(())
    }

    fn write_json(table: &DataFrame, path: &Path) -> Result<(), ExportError> {
        let series = StackedSeries::from_aggregated(table)?;
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, &series)?;
        Ok(())
    }
}
