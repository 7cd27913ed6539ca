//! EPTS command-line interface

use clap::{Parser, Subcommand};
use epts::cli::output::{self, OutputFormat};
use epts::cli::{calculate, compose, validate};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// EPTS cohort calculation tool
#[derive(Parser)]
#[command(name = "epts")]
#[command(author, version, about = "EPTS HIV care cohort calculations", long_about = None)]
struct Cli {
    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Pretty, global = true)]
    format: OutputFormat,

    /// Output file (default: stdout)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    color: String,

    #[command(subcommand)]
    command: Commands,
}

/// Inputs shared by every command that reads a dataset
#[derive(clap::Args)]
struct DatasetArgs {
    /// Dataset file (JSON)
    #[arg(short, long)]
    data: PathBuf,

    /// Metadata dictionary file (JSON)
    #[arg(short, long)]
    metadata: PathBuf,

    /// Calculator configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reference date of the run (YYYY-MM-DD)
    #[arg(short, long)]
    now: chrono::NaiveDate,

    /// Report location id
    #[arg(short, long)]
    location: Option<i64>,

    /// Parameters (name=value)
    #[arg(short, long = "param")]
    params: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate composition strings and parameter mappings
    Validate {
        /// Composition strings to validate
        compositions: Vec<String>,

        /// Parameter mappings to validate
        #[arg(long = "mapping")]
        mappings: Vec<String>,
    },

    /// Run one calculation for every patient in a dataset
    Calculate {
        /// Calculation name (e.g. routineViralLoad)
        #[arg(long)]
        calculation: String,

        #[command(flatten)]
        dataset: DatasetArgs,
    },

    /// Evaluate a cohort composition document
    Compose {
        /// Cohort definition file (JSON)
        #[arg(long)]
        definition: PathBuf,

        #[command(flatten)]
        dataset: DatasetArgs,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "epts=debug" } else { "epts=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn main() {
    human_panic::setup_panic!();

    let cli = Cli::parse();

    output::setup_colors(&cli.color);
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Validate { compositions, mappings } => validate::validate(validate::ValidateConfig {
            compositions,
            mappings,
            verbose: cli.verbose,
        }),

        Commands::Calculate { calculation, dataset } => calculate::calculate(calculate::CalculateConfig {
            data: dataset.data,
            metadata: dataset.metadata,
            config: dataset.config,
            calculation,
            now: dataset.now,
            location: dataset.location,
            params: dataset.params,
            format: cli.format,
            output_file: cli.output,
        }),

        Commands::Compose { definition, dataset } => compose::compose(compose::ComposeConfig {
            data: dataset.data,
            metadata: dataset.metadata,
            config: dataset.config,
            definition,
            now: dataset.now,
            location: dataset.location,
            params: dataset.params,
            format: cli.format,
            output_file: cli.output,
        }),
    };

    if let Err(e) = result {
        eprintln!("{}", output::format_error(&e));
        std::process::exit(1);
    }
}
