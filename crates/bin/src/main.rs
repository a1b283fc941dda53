//! Darwin CLI binary.
//!
//! Fetches quotes, writes features and outcomes tables, and trains models
//! on the aligned data.

mod integration;

use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use darwin::{DefaultUniverse, GicsSector, Pipeline, PipelineConfig, Universe};
use darwin_data::offline;
use darwin_data::yahoo::YahooQuoteProvider;
use darwin_features::{ColumnInfo, MasterTable, OutcomeSet, available_features, available_outcomes};
use darwin_models::ModelKind;
use darwin_output::{ExportFormat, Exporter, write_frame_csv, write_frame_csv_file};
use indicatif::{ProgressBar, ProgressStyle};
use integration::cache_manager::print_cache_info;
use integration::data_pipeline::{FetchConfig, fetch_universe_quotes, load_quote_file, store_securities};
use polars::prelude::DataFrame;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "darwin")]
#[command(about = "Darwin: causally aligned features and outcomes for stock prediction", long_about = None)]
#[command(version)]
struct Cli {
    /// Log debug output (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Where quotes come from.
#[derive(Args, Debug, Clone)]
struct DataArgs {
    /// Comma-separated symbols (default: the built-in universe)
    #[arg(long, value_delimiter = ',')]
    symbols: Vec<String>,

    /// Years of history
    #[arg(long)]
    years: Option<u32>,

    /// Read quotes from a CSV file instead of Yahoo Finance
    #[arg(long)]
    quotes_file: Option<PathBuf>,

    /// Disable caching (always fetch fresh data)
    #[arg(long)]
    no_cache: bool,

    /// Force refresh cached data
    #[arg(long)]
    refresh: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Populate the quote cache
    Fetch {
        #[command(flatten)]
        data: DataArgs,

        /// Also write the fetched quotes to a CSV file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Write the features table as CSV
    Features {
        #[command(flatten)]
        data: DataArgs,

        /// Comma-separated feature columns (default: the standard set)
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,

        /// Add sector indicator columns
        #[arg(long)]
        sectors: bool,

        /// Output file (default: stdout)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Write the outcomes table as CSV
    Outcomes {
        #[command(flatten)]
        data: DataArgs,

        /// Comma-separated outcome columns (default: the standard set)
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,

        /// Output file (default: stdout)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Train, evaluate and predict
    Train {
        #[command(flatten)]
        data: DataArgs,

        /// JSON run configuration; flags below override it
        #[arg(long)]
        config: Option<PathBuf>,

        /// Outcome column to predict
        #[arg(long)]
        outcome: Option<String>,

        /// Model: linear, tree or forest
        #[arg(long)]
        model: Option<ModelKind>,

        /// Comma-separated feature columns
        #[arg(long, value_delimiter = ',')]
        features: Vec<String>,

        /// Share of dates used for training
        #[arg(long)]
        train_fraction: Option<f64>,

        /// Number of trees for the forest
        #[arg(long)]
        trees: Option<usize>,

        /// Add sector indicator columns
        #[arg(long)]
        sectors: bool,

        /// Skip the causality audit
        #[arg(long)]
        no_audit: bool,

        /// Write test and latest predictions (csv or json, by extension)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Report format on stdout
        #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
        format: ReportFormat,
    },

    /// List available features and outcomes
    Registry,

    /// Show the built-in universe
    Universe {
        /// Filter by GICS sector name
        #[arg(long)]
        sector: Option<String>,

        /// List all sectors
        #[arg(long)]
        list_sectors: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ReportFormat {
    Text,
    Markdown,
    Json,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli.command).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(command: Commands) -> CliResult<()> {
    match command {
        Commands::Fetch { data, output } => fetch(&data, output.as_deref()).await,
        Commands::Features {
            data,
            columns,
            sectors,
            output,
        } => {
            let config = PipelineConfig {
                features: columns,
                include_sectors: sectors,
                ..data.apply(PipelineConfig::default())
            };
            let pipeline = Pipeline::new(config)?;
            let quotes = load_quotes(&data, pipeline.config()).await?;
            let master = master_table(pipeline.config());
            let table = pipeline.features_table(&quotes, Some(&master))?;
            write_table(&table, output.as_deref())
        }
        Commands::Outcomes {
            data,
            columns,
            output,
        } => {
            let config = data.apply(PipelineConfig::default());
            let outcomes = if columns.is_empty() {
                OutcomeSet::standard()
            } else {
                OutcomeSet::from_names(&columns)?
            };
            let quotes = load_quotes(&data, &config).await?;
            write_table(&outcomes.build(&quotes)?, output.as_deref())
        }
        Commands::Train {
            data,
            config,
            outcome,
            model,
            features,
            train_fraction,
            trees,
            sectors,
            no_audit,
            output,
            format,
        } => {
            let mut config = match config {
                Some(path) => PipelineConfig::from_file(path)?,
                None => PipelineConfig::default(),
            };
            config = data.apply(config);
            if let Some(outcome) = outcome {
                config.outcome = outcome;
            }
            if let Some(model) = model {
                config.model = model;
            }
            if !features.is_empty() {
                config.features = features;
            }
            if let Some(fraction) = train_fraction {
                config.train_fraction = fraction;
            }
            if let Some(trees) = trees {
                config.forest.n_trees = trees;
            }
            config.include_sectors |= sectors;
            if no_audit {
                config.audit_samples = 0;
            }
            train(&data, config, output.as_deref(), format).await
        }
        Commands::Registry => {
            print_registry();
            Ok(())
        }
        Commands::Universe {
            sector,
            list_sectors,
        } => show_universe(sector.as_deref(), list_sectors),
    }
}

impl DataArgs {
    /// Override the symbols and history length of a configuration.
    fn apply(&self, mut config: PipelineConfig) -> PipelineConfig {
        if !self.symbols.is_empty() {
            config.symbols = self.symbols.clone();
        }
        if let Some(years) = self.years {
            config.years = years;
        }
        config
    }

    const fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            use_cache: !self.no_cache,
            force_refresh: self.refresh,
        }
    }
}

async fn load_quotes(data: &DataArgs, config: &PipelineConfig) -> CliResult<DataFrame> {
    let symbols = config.universe().symbols();

    if let Some(path) = &data.quotes_file {
        let quotes = load_quote_file(path, &data.symbols)?;
        tracing::info!(path = %path.display(), rows = quotes.height(), "loaded quote file");
        return Ok(quotes);
    }

    let end = Utc::now().date_naive();
    let start = config.start_date(end);
    let provider = YahooQuoteProvider::new()?;

    let pb = ProgressBar::new(symbols.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("█▓░"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Fetching quotes...");

    match fetch_universe_quotes(&provider, &symbols, start, end, data.fetch_config(), Some(&pb)).await {
        Ok(quotes) => {
            pb.finish_and_clear();
            eprintln!(
                "Loaded {} rows for {} symbols ({} to {})",
                quotes.height(),
                darwin_data::frame::symbols(&quotes)?.len(),
                start,
                end
            );
            Ok(quotes)
        }
        Err(e) => {
            pb.finish_with_message("Failed!");
            Err(format!("Failed to fetch quotes: {}", e).into())
        }
    }
}

fn master_table(config: &PipelineConfig) -> MasterTable {
    MasterTable::from_records(&config.universe().security_records())
}

fn write_table(table: &DataFrame, output: Option<&Path>) -> CliResult<()> {
    match output {
        Some(path) => {
            write_frame_csv_file(table, path)?;
            eprintln!("Wrote {} rows to {}", table.height(), path.display());
        }
        None => write_frame_csv(table, std::io::stdout().lock())?,
    }
    Ok(())
}

async fn fetch(data: &DataArgs, output: Option<&Path>) -> CliResult<()> {
    let config = data.apply(PipelineConfig::default());
    let quotes = load_quotes(data, &config).await?;

    if !data.no_cache {
        let stored = store_securities(&config.universe())?;
        println!("Stored sector assignments for {} symbols", stored);
        print_cache_info();
    }

    if let Some(path) = output {
        offline::write_quotes(&quotes, std::fs::File::create(path)?)?;
        println!("Wrote {} rows to {}", quotes.height(), path.display());
    }
    Ok(())
}

async fn train(
    data: &DataArgs,
    config: PipelineConfig,
    output: Option<&Path>,
    format: ReportFormat,
) -> CliResult<()> {
    let pipeline = Pipeline::new(config)?;
    let quotes = load_quotes(data, pipeline.config()).await?;
    let master = master_table(pipeline.config());

    let report = pipeline.run(&quotes, Some(&master))?;

    match format {
        ReportFormat::Text => println!("{}", report.run.to_text()),
        ReportFormat::Markdown => println!("{}", report.run.to_markdown()),
        ReportFormat::Json => println!("{}", report.run.to_json()?),
    }

    if let Some(path) = output {
        let mut records = report.test_predictions.clone();
        records.extend(report.latest_predictions.iter().cloned());
        let format = ExportFormat::from_path(path)?;
        records.as_slice().export_to_file(path, format)?;
        eprintln!("Wrote {} predictions to {}", records.len(), path.display());
    }
    Ok(())
}

fn print_registry() {
    fn section(title: &str, columns: &[ColumnInfo]) {
        println!("{}:", title);
        for info in columns {
            println!("  {:<18} {}", info.pattern(), info.description);
        }
        println!();
    }

    section("Features", &available_features());
    section("Outcomes", &available_outcomes());
}

fn show_universe(sector: Option<&str>, list_sectors: bool) -> CliResult<()> {
    let universe = DefaultUniverse::new();

    if list_sectors {
        println!("GICS sectors:");
        for sector in GicsSector::all() {
            let members = universe
                .constituents()
                .iter()
                .filter(|c| c.sector == Some(sector))
                .count();
            println!("  {:>2}  {:<24} {} symbols", sector.code(), sector.name(), members);
        }
        return Ok(());
    }

    let filter = sector
        .map(|name| GicsSector::from_name(name).ok_or_else(|| format!("Unknown sector: {}", name)))
        .transpose()?;

    for constituent in universe.constituents() {
        if filter.is_none() || constituent.sector == filter {
            let sector = constituent.sector.map_or("Unknown", |s| s.name());
            println!("{:<6} {}", constituent.symbol, sector);
        }
    }
    Ok(())
}
