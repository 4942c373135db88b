use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

use cohort_qc::config::Config;
use cohort_qc::constants::DEFAULT_PAGE_SIZE;
use cohort_qc::export::export_samples;
use cohort_qc::ingest::{IngestPipeline, ViolationPolicy};
use cohort_qc::query::{FilterSpec, QueryService, SampleResolver};
use cohort_qc::store::QcStore;
use cohort_qc::{logging, metrics, migrate};

#[derive(Parser)]
#[command(name = "cohort_qc")]
#[command(about = "Per-sample QC spreadsheet ingestion and cohort queries")]
#[command(version)]
struct Cli {
    /// Config file (defaults to $COHORT_QC_CONFIG, then config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database location; overrides config and $DATABASE_URL
    #[arg(long, global = true)]
    database: Option<String>,

    /// Print Prometheus metrics to stderr when the command finishes
    #[arg(long, global = true)]
    print_metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and all QC tables
    Init,
    /// Add any declared columns missing from an existing database
    Migrate,
    /// Load .csv or .xlsx QC files
    Ingest {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// What to do with rows or sheets that cannot be mapped
        #[arg(long, value_enum)]
        on_violation: Option<Policy>,
    },
    /// Look up samples by id, or by prefix with a trailing '*'
    Search { term: String },
    /// Run a filter spec JSON file
    Filter { spec: PathBuf },
    /// Write combined and per-table CSVs for a set of samples
    Export {
        /// Comma-separated sample ids
        #[arg(long, value_delimiter = ',', conflicts_with = "term")]
        samples: Vec<String>,
        /// Search term resolving the samples instead
        #[arg(long)]
        term: Option<String>,
        /// Output directory (defaults to [export] output_dir)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Browse samples a page at a time
    List {
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        limit: usize,
    },
    /// Show past ingestion runs
    History,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum Policy {
    Abort,
    Skip,
}

impl From<Policy> for ViolationPolicy {
    fn from(p: Policy) -> Self {
        match p {
            Policy::Abort => ViolationPolicy::Abort,
            Policy::Skip => ViolationPolicy::Skip,
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())
        .context("Failed to load configuration")?
        .with_database_url(cli.database.clone());
    let _guard = logging::init_logging(&config.logging.dir);

    if cli.print_metrics && metrics::init_metrics().is_none() {
        warn!("Metrics recorder could not be installed");
    }

    let result = run(cli.command, &config);

    if cli.print_metrics {
        if let Some(rendered) = metrics::render() {
            eprintln!("{rendered}");
        }
    }
    result
}

fn run(command: Commands, config: &Config) -> Result<()> {
    let database = config.database();
    info!("Using database {:?}", database);

    match command {
        Commands::Init => {
            database.open().context("Failed to initialize database")?;
            println!("Database ready");
        }
        Commands::Migrate => {
            let store = database.connect().context("Failed to open database")?;
            let added = migrate::apply(&store).context("Migration failed")?;
            print_json(&added)?;
        }
        Commands::Ingest { files, on_violation } => {
            let store = database.open().context("Failed to open database")?;
            let policy = on_violation
                .map(ViolationPolicy::from)
                .unwrap_or(config.ingest.on_schema_violation);
            let pipeline = IngestPipeline::new(&store)
                .with_normalizer(config.normalizer())
                .with_policy(policy);

            let mut reports = Vec::new();
            for file in &files {
                let report = pipeline
                    .ingest_path(file)
                    .with_context(|| format!("Failed to ingest {}", file.display()))?;
                reports.push(report);
            }
            print_json(&reports)?;
        }
        Commands::Search { term } => {
            let store = database.open().context("Failed to open database")?;
            print_json(&QueryService::new(&store).search(&term)?)?;
        }
        Commands::Filter { spec } => {
            let input =
                fs::read_to_string(&spec).with_context(|| format!("Failed to read {}", spec.display()))?;
            let spec = FilterSpec::from_json_str(&input)?;
            let store = database.open().context("Failed to open database")?;
            print_json(&QueryService::new(&store).filter(&spec)?)?;
        }
        Commands::Export { samples, term, out } => {
            let store = database.open().context("Failed to open database")?;
            let samples = match term {
                Some(term) => SampleResolver::new(&store).resolve(&term)?,
                None => samples,
            };
            let out_dir = out.unwrap_or_else(|| config.export.output_dir.clone());
            let written = export_samples(&store, &samples, &out_dir).context("Export failed")?;
            print_json(&written)?;
        }
        Commands::List { offset, limit } => {
            let store = database.open().context("Failed to open database")?;
            print_json(&QueryService::new(&store).page(offset, limit)?)?;
        }
        Commands::History => {
            let store = database.open().context("Failed to open database")?;
            print_json(&store.ingest_runs()?)?;
        }
    }
    Ok(())
}
