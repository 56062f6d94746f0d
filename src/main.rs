use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use client_jsonl::config::Config;
use client_jsonl::logging;
use client_jsonl::metrics;
use client_jsonl::pipeline::{self, Converter, OutputTarget};
use client_jsonl::transform::headers::header_collisions;
use client_jsonl::transform::{AliasTagging, ClientRecordBuilder, HeaderMode, MetricsTransformer};

#[derive(Parser)]
#[command(name = "client-jsonl")]
#[command(about = "Convert client spreadsheets into JSONL records")]
#[command(version)]
struct Cli {
    /// Config file; defaults to $CLIENT_JSONL_CONFIG or ./client-jsonl.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a workbook (or JSON array of rows) into one JSON record per line
    Convert {
        input: PathBuf,
        /// Output path, or "-" for stdout
        #[arg(long, short)]
        output: Option<String>,
        /// Sheet to read instead of the first one
        #[arg(long)]
        sheet: Option<String>,
        #[arg(long)]
        header_mode: Option<HeaderMode>,
        #[arg(long)]
        alias_tags: Option<AliasTagging>,
        /// Drop records that carry nothing beyond objectType
        #[arg(long)]
        skip_empty: bool,
        /// Write Prometheus-format conversion metrics to this file
        #[arg(long)]
        metrics_file: Option<PathBuf>,
    },
    /// List the sheet's headers with their normalized keys
    Inspect {
        input: PathBuf,
        #[arg(long)]
        sheet: Option<String>,
        #[arg(long)]
        header_mode: Option<HeaderMode>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    let _guard = logging::init_logging(&config.logging);

    match cli.command {
        Commands::Convert {
            input,
            output,
            sheet,
            header_mode,
            alias_tags,
            skip_empty,
            metrics_file,
        } => {
            if let Some(mode) = header_mode {
                config.convert.header_mode = mode;
            }
            if let Some(tags) = alias_tags {
                config.convert.alias_tags = tags;
            }
            if skip_empty {
                config.convert.skip_empty_records = true;
            }
            let sheet = sheet.or(config.input.sheet.clone());

            let metrics_handle = match &metrics_file {
                Some(_) => Some(metrics::install_recorder()?),
                None => None,
            };

            let target = match output.as_deref() {
                Some("-") => OutputTarget::Stdout,
                Some(path) => OutputTarget::File(PathBuf::from(path)),
                None => OutputTarget::File(pipeline::default_output_path(&config.output.dir, &input)),
            };

            let stop = Arc::new(AtomicBool::new(false));
            {
                let stop = stop.clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        warn!("Ctrl-C received, stopping after the current row");
                        stop.store(true, Ordering::Relaxed);
                    }
                });
            }

            info!("Converting {}", input.display());
            let parsed = pipeline::load_sheet(&input, sheet)
                .await
                .with_context(|| format!("reading {}", input.display()))?;

            let transformer =
                MetricsTransformer::new(ClientRecordBuilder::new(config.convert.builder_options()));
            let converter = Arc::new(Converter::new(transformer, config.convert.skip_empty_records));
            let summary = pipeline::convert_rows(converter, parsed.rows, target.clone(), stop)
                .await
                .with_context(|| format!("writing {}", target.describe()))?;

            eprintln!("\n📊 Conversion Results for {}:", input.display());
            eprintln!("   Total rows: {}", summary.total_rows);
            eprintln!("   Written: {}", summary.written);
            eprintln!("   Skipped (empty): {}", summary.skipped_empty);
            eprintln!("   Output: {}", target.describe());
            if summary.cancelled {
                eprintln!("\n⚠️  Cancelled before the last row; output holds the rows written so far");
            }

            if let (Some(path), Some(handle)) = (metrics_file, metrics_handle) {
                std::fs::write(&path, handle.render())
                    .with_context(|| format!("writing metrics to {}", path.display()))?;
            }
        }
        Commands::Inspect {
            input,
            sheet,
            header_mode,
        } => {
            let mode = header_mode.unwrap_or(config.convert.header_mode);
            let sheet = sheet.or(config.input.sheet.clone());
            let parsed = pipeline::load_sheet(&input, sheet)
                .await
                .with_context(|| format!("reading {}", input.display()))?;

            println!("🔍 {} ({} rows, {} header mode)", input.display(), parsed.rows.len(), mode);
            for header in &parsed.headers {
                println!("   {:<40} -> {}", format!("{header:?}"), mode.normalize(header));
            }

            let collisions = header_collisions(parsed.headers.iter().map(String::as_str), mode);
            if !collisions.is_empty() {
                println!("\n⚠️  Colliding headers (the rightmost column wins):");
                for (key, headers) in collisions {
                    println!("   {key}: {}", headers.join(", "));
                }
            }
        }
    }
    Ok(())
}
