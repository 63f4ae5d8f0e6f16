//! CSV Data Loader Module
//! Reads the deaths-by-risk-factor CSV once and hands the table to callers.

use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("CSV file not found: {0}")]
    NotFound(PathBuf),
    #[error("No data loaded")]
    NoData,
}

/// True for the integer and float dtypes a cause column may have.
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Float32
            | DataType::Float64
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

/// Handles CSV file loading with Polars.
#[derive(Default)]
pub struct DataLoader {
    df: Option<DataFrame>,
}

impl DataLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a CSV file using Polars.
    pub fn load_csv(&mut self, file_path: &Path) -> Result<&DataFrame, LoaderError> {
        if !file_path.is_file() {
            return Err(LoaderError::NotFound(file_path.to_path_buf()));
        }
        let df = LazyCsvReader::new(file_path)
            .with_has_header(true)
            .with_infer_schema_length(Some(10000))
            .finish()?
            .collect()?;

        info!(
            "Loaded {} rows x {} columns from {}",
            df.height(),
            df.width(),
            file_path.display()
        );

        self.df = Some(df);
        self.df.as_ref().ok_or(LoaderError::NoData)
    }

    /// Get list of column names from loaded DataFrame.
    pub fn get_columns(&self) -> Vec<String> {
        self.df
            .as_ref()
            .map(|df| {
                df.get_column_names()
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get list of numeric column names, in file order.
    pub fn get_numeric_columns(&self) -> Vec<String> {
        let Some(df) = &self.df else {
            return Vec::new();
        };

        df.get_columns()
            .iter()
            .filter(|col| is_numeric_dtype(col.dtype()))
            .map(|col| col.name().to_string())
            .collect()
    }

    /// Get sorted unique, non-null values from a column.
    pub fn get_unique_values(&self, column: &str) -> Vec<String> {
        let Some(df) = &self.df else {
            return Vec::new();
        };

        let mut values: Vec<String> = df
            .column(column)
            .ok()
            .and_then(|col| col.unique().ok())
            .map(|unique| {
                let series = unique.as_materialized_series();
                (0..series.len())
                    .filter_map(|i| {
                        let val = series.get(i).ok()?;
                        if val.is_null() {
                            None
                        } else {
                            Some(val.to_string().trim_matches('"').to_string())
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();
        values.sort();
        values
    }

    /// Get the number of rows in the DataFrame.
    pub fn get_row_count(&self) -> usize {
        self.df.as_ref().map(|df| df.height()).unwrap_or(0)
    }

    /// Get a reference to the loaded DataFrame.
    pub fn get_dataframe(&self) -> Result<&DataFrame, LoaderError> {
        self.df.as_ref().ok_or(LoaderError::NoData)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CSV: &str = "\
Entity,Code,Year,\"Deaths that are from all causes attributed to smoking, in both sexes aged all ages\",\"Deaths that are from all causes attributed to unsafe water source, in both sexes aged all ages\"
France,FRA,1990,100.5,3
Spain,ESP,1990,80,2
G20,,1990,9000,700
France,FRA,1991,101.5,4
";

    fn write_csv() -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(CSV.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_csv() {
        let file = write_csv();
        let mut loader = DataLoader::new();
        let df = loader.load_csv(file.path()).unwrap();

        assert_eq!(df.height(), 4);
        assert_eq!(df.width(), 5);
        assert_eq!(loader.get_row_count(), 4);
        assert_eq!(loader.get_columns()[..3], ["Entity", "Code", "Year"]);
    }

    #[test]
    fn test_numeric_columns_include_year_and_causes() {
        let file = write_csv();
        let mut loader = DataLoader::new();
        loader.load_csv(file.path()).unwrap();

        let numeric = loader.get_numeric_columns();
        assert_eq!(numeric.len(), 3);
        assert_eq!(numeric[0], "Year");
        assert!(numeric[1].contains("smoking"));
    }

    #[test]
    fn test_unique_entities_sorted() {
        let file = write_csv();
        let mut loader = DataLoader::new();
        loader.load_csv(file.path()).unwrap();

        assert_eq!(
            loader.get_unique_values("Entity"),
            vec!["France", "G20", "Spain"]
        );
        assert!(loader.get_unique_values("Missing").is_empty());
    }

    #[test]
    fn test_missing_file() {
        let mut loader = DataLoader::new();
        let err = loader
            .load_csv(Path::new("/definitely/not/here.csv"))
            .unwrap_err();
        assert!(matches!(err, LoaderError::NotFound(_)));
        assert!(matches!(loader.get_dataframe(), Err(LoaderError::NoData)));
    }
}
