//! Command-line interface argument parsing.
//!
//! One subcommand per output: the aggregated table, the stacked bar chart,
//! the scatter grid, the per-cause summary and the entity list.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Mortality Charts - deaths by risk factor, aggregated and charted
///
/// Examples:
///   mortality-charts aggregate --output causes.csv
///   mortality-charts chart --output stacked.png --from 2000 --to 2019
///   mortality-charts scatter --column smoking --column "air pollution"
///   mortality-charts summary --format json --keep-top 5
///   mortality-charts init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// CSV dataset to load
    ///
    /// Overrides `[data] path` from the config file.
    #[arg(short, long, global = true, value_name = "FILE", env = "MORTALITY_DATA")]
    pub data: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .mortality-charts.toml in the current directory
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Keep the N largest causes and merge the rest into "Others"
    ///
    /// Replaces the default merge rule (table wider than 6 columns: merge
    /// the last 8 causes).
    #[arg(long, global = true, value_name = "N")]
    pub keep_top: Option<usize>,

    #[command(flatten)]
    pub filter: FilterArgs,
}

/// Country and year selection shared by every subcommand.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Only keep this entity (repeatable)
    #[arg(long = "entity", global = true, value_name = "NAME")]
    pub entities: Vec<String>,

    /// First year to keep
    #[arg(long, global = true, value_name = "YEAR")]
    pub from: Option<i64>,

    /// Last year to keep
    #[arg(long, global = true, value_name = "YEAR")]
    pub to: Option<i64>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the yearly "top causes + Others" table
    Aggregate {
        /// Also write the table to a .csv or .json file
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Render the stacked bar chart of causes of death
    Chart {
        /// Output image (.png or .svg)
        #[arg(short, long, default_value = "stacked_bar.png", value_name = "FILE")]
        output: PathBuf,

        /// Open the image with the system viewer afterwards
        #[arg(long)]
        open: bool,
    },

    /// Render per-entity scatter panels for selected cause columns
    Scatter {
        /// Output image (.png or .svg)
        #[arg(short, long, default_value = "scatter_grid.png", value_name = "FILE")]
        output: PathBuf,

        /// Cause column by full name or short label (repeatable)
        #[arg(long = "column", value_name = "CAUSE")]
        columns: Vec<String>,

        /// Open the image with the system viewer afterwards
        #[arg(long)]
        open: bool,
    },

    /// Per-cause totals, shares and peaks of the aggregated table
    Summary {
        /// Output format (text, json)
        #[arg(long, default_value = "text", value_name = "FORMAT")]
        format: OutputFormat,
    },

    /// List the distinct entities in the dataset
    Entities,

    /// Generate a default .mortality-charts.toml configuration file
    InitConfig,
}

/// Output format for the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Aligned text table (default)
    #[default]
    Text,
    /// JSON array
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let (Some(from), Some(to)) = (self.filter.from, self.filter.to) {
            if from > to {
                return Err(format!("--from ({}) must not be after --to ({})", from, to));
            }
        }

        if let Some(ref data) = self.data {
            if !data.is_file() {
                return Err(format!("Data file does not exist: {}", data.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chart_with_filters() {
        let args = Args::try_parse_from([
            "mortality-charts",
            "chart",
            "--output",
            "out.svg",
            "--entity",
            "France",
            "--entity",
            "Spain",
            "--from",
            "2000",
            "--keep-top",
            "5",
        ])
        .unwrap();

        assert!(matches!(
            args.command,
            Command::Chart { ref output, open: false } if output == &PathBuf::from("out.svg")
        ));
        assert_eq!(args.filter.entities, vec!["France", "Spain"]);
        assert_eq!(args.filter.from, Some(2000));
        assert_eq!(args.filter.to, None);
        assert_eq!(args.keep_top, Some(5));
    }

    #[test]
    fn test_parse_scatter_columns() {
        let args = Args::try_parse_from([
            "mortality-charts",
            "scatter",
            "--column",
            "smoking",
            "--column",
            "air pollution",
        ])
        .unwrap();

        match args.command {
            Command::Scatter { columns, output, .. } => {
                assert_eq!(columns, vec!["smoking", "air pollution"]);
                assert_eq!(output, PathBuf::from("scatter_grid.png"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_summary_format() {
        let args =
            Args::try_parse_from(["mortality-charts", "summary", "--format", "json"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Summary {
                format: OutputFormat::Json
            }
        ));
    }

    #[test]
    fn test_validate_conflicts() {
        let mut args = Args::try_parse_from(["mortality-charts", "entities"]).unwrap();
        assert!(args.validate().is_ok());

        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());

        args.quiet = false;
        args.filter.from = Some(2010);
        args.filter.to = Some(2000);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = Args::try_parse_from(["mortality-charts", "entities"]).unwrap();
        assert_eq!(args.log_level(), tracing::Level::INFO);
        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);
        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
