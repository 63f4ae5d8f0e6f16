//! Configuration file handling.
//!
//! Settings live in `.mortality-charts.toml`; every field has a default so a
//! partial file (or none at all) works.

use crate::charts::ChartStyle;
use crate::cli::Args;
use crate::data::{AggregateOptions, OthersPolicy, RowFilter, YearRange};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = ".mortality-charts.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Input dataset.
    #[serde(default)]
    pub data: DataConfig,

    /// Column names, aggregate-entity markers and `Others` policy.
    #[serde(default)]
    pub aggregate: AggregateOptions,

    /// Entity and year selection.
    #[serde(default)]
    pub filter: FilterConfig,

    /// Year-range control: bounds, marks and tooltip.
    #[serde(default)]
    pub years: YearRange,

    /// Scatter grid settings.
    #[serde(default)]
    pub scatter: ScatterConfig,

    /// Chart image settings.
    #[serde(default)]
    pub chart: ChartStyle,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// CSV file with one row per entity and year.
    #[serde(default = "default_data_path")]
    pub path: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: default_data_path(),
        }
    }
}

fn default_data_path() -> PathBuf {
    PathBuf::from("number-of-deaths-by-risk-factor.csv")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Entities to keep; empty keeps all.
    #[serde(default)]
    pub entities: Vec<String>,

    /// Drop rows outside `[years]`.
    #[serde(default)]
    pub restrict_years: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScatterConfig {
    /// Cause columns to plot, by full name or short label. Empty picks the
    /// first few cause columns of the file.
    #[serde(default)]
    pub columns: Vec<String>,

    /// Number of panels when `columns` is empty.
    #[serde(default = "default_panels")]
    pub panels: usize,
}

impl Default for ScatterConfig {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            panels: default_panels(),
        }
    }
}

fn default_panels() -> usize {
    4
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .years
            .validate()
            .with_context(|| format!("Invalid [years] section in {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence, but only where they were given.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(ref data) = args.data {
            self.data.path = data.clone();
        }

        if !args.filter.entities.is_empty() {
            self.filter.entities = args.filter.entities.clone();
        }

        if let Some(from) = args.filter.from {
            self.years.min = from;
            self.filter.restrict_years = true;
        }
        if let Some(to) = args.filter.to {
            self.years.max = to;
            self.filter.restrict_years = true;
        }

        if let Some(keep) = args.keep_top {
            self.aggregate.others = OthersPolicy::KeepTop { keep };
        }
    }

    /// Row filter described by the `[filter]` and `[years]` sections.
    pub fn row_filter(&self) -> RowFilter {
        RowFilter {
            entities: self.filter.entities.clone(),
            years: self.filter.restrict_years.then(|| self.years.clone()),
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Command, FilterArgs};

    fn make_args() -> Args {
        Args {
            command: Command::Entities,
            data: None,
            config: None,
            verbose: false,
            quiet: false,
            keep_top: None,
            filter: FilterArgs::default(),
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.aggregate.entity_column, "Entity");
        assert!(config.aggregate.exclude_markers.contains(&"G20".to_string()));
        assert_eq!(config.years.min, 1990);
        assert_eq!(config.scatter.panels, 4);
        assert!(config.row_filter().is_empty());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[data]
path = "data/deaths.csv"

[aggregate]
exclude_markers = ["World"]

[aggregate.others]
mode = "keep_top"
keep = 5

[filter]
entities = ["France", "Spain"]
restrict_years = true

[years]
min = 2000
max = 2010

[scatter]
columns = ["smoking", "diet high in sodium"]
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.data.path, PathBuf::from("data/deaths.csv"));
        assert_eq!(config.aggregate.exclude_markers, vec!["World"]);
        assert_eq!(config.aggregate.year_column, "Year");
        assert_eq!(config.aggregate.others, OthersPolicy::KeepTop { keep: 5 });
        assert_eq!(config.years.mark_step, 2);

        let filter = config.row_filter();
        assert_eq!(filter.entities, vec!["France", "Spain"]);
        assert_eq!(filter.years.unwrap().max, 2010);
        assert_eq!(config.scatter.columns.len(), 2);
    }

    #[test]
    fn test_default_toml_round_trips() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[aggregate]"));
        assert!(toml_str.contains("[years]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.aggregate, AggregateOptions::default());
        assert_eq!(parsed.years, YearRange::default());
        assert_eq!(parsed.chart, ChartStyle::default());
    }

    #[test]
    fn test_merge_with_args() {
        let mut args = make_args();
        args.data = Some(PathBuf::from("other.csv"));
        args.filter.entities = vec!["France".to_string()];
        args.filter.from = Some(2005);
        args.keep_top = Some(3);

        let mut config = Config::default();
        config.merge_with_args(&args);

        assert_eq!(config.data.path, PathBuf::from("other.csv"));
        assert_eq!(config.aggregate.others, OthersPolicy::KeepTop { keep: 3 });
        let filter = config.row_filter();
        assert_eq!(filter.entities, vec!["France"]);
        let years = filter.years.unwrap();
        assert_eq!((years.min, years.max), (2005, 2019));
    }

    #[test]
    fn test_merge_keeps_config_when_args_absent() {
        let mut config = Config::default();
        config.filter.entities = vec!["Spain".to_string()];
        config.merge_with_args(&make_args());

        assert_eq!(config.filter.entities, vec!["Spain"]);
        assert!(!config.filter.restrict_years);
        assert_eq!(config.aggregate.others, OthersPolicy::default());
    }
}
