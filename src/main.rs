//! Mortality Charts - deaths by risk factor, aggregated and charted
//!
//! Loads the deaths-by-risk-factor CSV, builds the yearly "top causes +
//! Others" table and renders it (plus per-entity scatter panels) to static
//! chart files.

mod charts;
mod cli;
mod config;
mod data;
mod export;
mod stats;

use anyhow::{bail, Context, Result};
use charts::{format_count, ScatterPanel, StackedSeries, StaticChartRenderer};
use cli::{Args, Command, OutputFormat};
use config::{Config, CONFIG_FILE};
use data::{labels, CauseAggregator, DataLoader};
use export::TableExporter;
use polars::prelude::DataFrame;
use rayon::prelude::*;
use stats::SummaryCalculator;
use std::path::Path;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // No logging or data needed to write the default config
    if matches!(args.command, Command::InitConfig) {
        return handle_init_config();
    }

    init_logging(&args);
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args) {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
    Ok(())
}

/// Handle init-config: write a default config file.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("{} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("Created {} with default settings.", CONFIG_FILE);
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level())
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Warning: tracing subscriber already installed");
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    let mut config = match args.config {
        Some(ref path) => {
            info!("Loading config from: {}", path.display());
            Config::load(path)?
        }
        None => match Config::load_default() {
            Ok(Some(config)) => {
                info!("Loaded default config from {}", CONFIG_FILE);
                config
            }
            Ok(None) => {
                debug!("No config file found, using defaults");
                Config::default()
            }
            Err(e) => {
                warn!("Failed to load config: {:#}", e);
                Config::default()
            }
        },
    };
    config.merge_with_args(args);
    config
        .years
        .validate()
        .context("Invalid year range after applying --from/--to")?;
    Ok(config)
}

fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;

    let mut loader = DataLoader::new();
    loader
        .load_csv(&config.data.path)
        .with_context(|| format!("Failed to load {}", config.data.path.display()))?;
    let rows = loader.get_dataframe()?;
    debug!(
        "{} rows, {} numeric of {} columns",
        loader.get_row_count(),
        loader.get_numeric_columns().len(),
        loader.get_columns().len()
    );

    match args.command {
        Command::Aggregate { output } => {
            let table = aggregate(&filter_rows(rows, &config)?, &config)?;
            println!("{}", table);
            if let Some(path) = output {
                TableExporter::write(&table, &path)?;
            }
        }
        Command::Chart { output, open } => {
            let table = aggregate(&filter_rows(rows, &config)?, &config)?;
            let series = StackedSeries::from_aggregated(&table)?;
            StaticChartRenderer::render_stacked_bar(
                &series,
                &config.chart,
                &config.years.marks(),
                &output,
            )?;
            println!("Chart saved to: {}", output.display());
            if open {
                open_file(&output)?;
            }
        }
        Command::Scatter {
            output,
            columns,
            open,
        } => {
            let rows = filter_rows(rows, &config)?;
            let columns = scatter_columns(&rows, &config, &columns)?;
            let panels = columns
                .par_iter()
                .map(|column| {
                    ScatterPanel::from_rows(
                        &rows,
                        column,
                        &config.aggregate.entity_column,
                        &config.aggregate.year_column,
                    )
                })
                .collect::<Result<Vec<_>, _>>()?;
            StaticChartRenderer::render_scatter_grid(&panels, &config.chart, &output)?;
            println!("Scatter grid saved to: {}", output.display());
            if open {
                open_file(&output)?;
            }
        }
        Command::Summary { format } => {
            let table = aggregate(&filter_rows(rows, &config)?, &config)?;
            let series = StackedSeries::from_aggregated(&table)?;
            let summaries = SummaryCalculator::summarize(&series);
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summaries)?),
                OutputFormat::Text => {
                    println!(
                        "{:<45} {:>10} {:>7} {:>10} {:>6} {:>8}",
                        "Cause", "Total", "Share", "Mean/yr", "Peak", "Change"
                    );
                    for s in &summaries {
                        println!(
                            "{:<45} {:>10} {:>6.1}% {:>10} {:>6} {:>8}",
                            s.cause,
                            format_count(s.total),
                            s.share * 100.0,
                            format_count(s.mean),
                            s.peak_year.map(|y| y.to_string()).unwrap_or_default(),
                            s.change
                                .map(|c| format!("{:+.1}%", c * 100.0))
                                .unwrap_or_default()
                        );
                    }
                }
            }
        }
        Command::Entities => list_entities(&loader, &config)?,
        Command::InitConfig => handle_init_config()?,
    }

    Ok(())
}

/// Apply the configured entity and year selection.
fn filter_rows(rows: &DataFrame, config: &Config) -> Result<DataFrame> {
    let filter = config.row_filter();
    if let Some(ref years) = filter.years {
        info!(
            "Restricting to years {} - {}",
            years.tooltip_for(years.min),
            years.tooltip_for(years.max)
        );
    }
    let rows = filter
        .apply(
            rows,
            &config.aggregate.entity_column,
            &config.aggregate.year_column,
        )
        .context("Failed to apply row filter")?;
    if rows.height() == 0 {
        bail!("No rows left after filtering");
    }
    Ok(rows)
}

fn aggregate(rows: &DataFrame, config: &Config) -> Result<DataFrame> {
    CauseAggregator::aggregate_causes(rows, &config.aggregate)
        .context("Failed to aggregate causes of death")
}

/// Resolve scatter column references (CLI first, then config) against the
/// dataset's cause columns.
fn scatter_columns(rows: &DataFrame, config: &Config, cli_columns: &[String]) -> Result<Vec<String>> {
    let causes = CauseAggregator::cause_columns(rows, &config.aggregate)?;
    let references = if cli_columns.is_empty() {
        config.scatter.columns.as_slice()
    } else {
        cli_columns
    };

    if references.is_empty() {
        return Ok(causes.into_iter().take(config.scatter.panels).collect());
    }

    references
        .iter()
        .map(|reference| {
            causes
                .iter()
                .find(|cause| labels::matches_column(reference, cause))
                .cloned()
                .with_context(|| format!("Unknown cause column: {}", reference))
        })
        .collect()
}

fn list_entities(loader: &DataLoader, config: &Config) -> Result<()> {
    let entities = loader.get_unique_values(&config.aggregate.entity_column);
    if entities.is_empty() {
        bail!("No values in column '{}'", config.aggregate.entity_column);
    }

    for entity in &entities {
        let is_aggregate = config
            .aggregate
            .exclude_markers
            .iter()
            .any(|m| entity.contains(m.as_str()));
        if is_aggregate {
            println!("{} (aggregate, excluded from stacked bar)", entity);
        } else {
            println!("{}", entity);
        }
    }
    info!("{} entities", entities.len());
    Ok(())
}

fn open_file(path: &Path) -> Result<()> {
    open::that(path).with_context(|| format!("Failed to open {}", path.display()))
}
