//! CLI entry point for the regional case-growth report.
//!
//! Provides subcommands for running the full report, saving the raw feed,
//! re-rendering the chart from the staging table, and exporting staged rows.

use anyhow::Result;
use case_growth::{
    chart::ChartMeta,
    config::PipelineConfig,
    fetch::{BasicClient, load_source},
    output::{write_raw, write_rows},
    pipeline::{render_from_store, run},
    staging::StagingStore,
};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "case_growth")]
#[command(
    about = "Daily growth of regional COVID-19 case counts by age band, charted",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ConfigArgs {
    /// JSON config file; absent keys use the built-in defaults
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// SQLite staging database (overrides config)
    #[arg(long, value_name = "FILE")]
    db: Option<PathBuf>,
}

impl ConfigArgs {
    fn load(&self) -> Result<PipelineConfig> {
        let mut config = PipelineConfig::load_or_default(self.config.as_deref())?;
        if let Some(db) = &self.db {
            config.staging.db_path = db.clone();
        }
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, transform, stage and chart
    Run {
        #[command(flatten)]
        config: ConfigArgs,

        /// URL or local CSV to read instead of the configured endpoint
        #[arg(short, long, value_name = "FILE_OR_URL")]
        source: Option<String>,

        /// Chart image path (overrides config)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Save the raw feed CSV without transforming it
    Fetch {
        #[command(flatten)]
        config: ConfigArgs,

        /// URL or local CSV to read instead of the configured endpoint
        #[arg(short, long, value_name = "FILE_OR_URL")]
        source: Option<String>,

        /// Where to write the CSV
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },
    /// Re-render the chart from an existing staging table
    Render {
        #[command(flatten)]
        config: ConfigArgs,

        /// Chart image path (overrides config)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Dump the staging table to CSV
    Export {
        #[command(flatten)]
        config: ConfigArgs,

        /// Where to write the CSV
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/case_growth.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("case_growth.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            source,
            output,
        } => {
            let mut config = config.load()?;
            if let Some(output) = output {
                config.output_path = output;
            }
            let source = source.unwrap_or_else(|| config.api.endpoint());

            let client = BasicClient::new();
            let summary = run(&client, &config, &source).await?;

            info!(
                fetched = summary.fetched_rows,
                staged = summary.staged_rows,
                chart = %summary.chart_path.display(),
                "Report complete"
            );
        }
        Commands::Fetch {
            config,
            source,
            output,
        } => {
            let config = config.load()?;
            let source = source.unwrap_or_else(|| config.api.endpoint());

            let client = BasicClient::new();
            let bytes = load_source(&client, &source).await?;
            write_raw(&output, &bytes)?;
        }
        Commands::Render { config, output } => {
            let mut config = config.load()?;
            if let Some(output) = output {
                config.output_path = output;
            }

            let store = StagingStore::open(&config.staging.db_path, &config.staging.table)?;
            let meta = ChartMeta {
                endpoint: config.api.endpoint(),
                generated_at: Utc::now(),
            };
            render_from_store(&store, &config, &meta)?;
        }
        Commands::Export { config, output } => {
            let config = config.load()?;

            let store = StagingStore::open(&config.staging.db_path, &config.staging.table)?;
            let rows = store.select_all()?;
            write_rows(&output, &rows)?;
        }
    }

    Ok(())
}
