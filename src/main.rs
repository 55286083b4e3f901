use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use inspections_etl::infra::{CsvDirectorySink, CsvFileSource};
use inspections_etl::observability::{init_logging, metrics};
use inspections_etl::{EtlConfig, EtlUseCase};

#[derive(Parser)]
#[command(name = "inspections_etl")]
#[command(about = "Restaurant inspection ETL: graded and ungraded establishment tables")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CommonArgs {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Input CSV file (overrides config)
    #[arg(long)]
    input: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline once and write Graded/Ungraded under a new run directory
    Run {
        #[command(flatten)]
        common: CommonArgs,
        /// Root directory for run output (overrides config)
        #[arg(long)]
        output_root: Option<PathBuf>,
        /// Aggregate in parallel
        #[arg(long)]
        parallel: bool,
        /// Write a header row into output files
        #[arg(long)]
        header: bool,
        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate the input's columns without writing any output
    CheckSchema {
        #[command(flatten)]
        common: CommonArgs,
    },
}

fn resolve_config(common: &CommonArgs) -> anyhow::Result<EtlConfig> {
    let mut config = match &common.config {
        Some(path) => EtlConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => EtlConfig::default(),
    };
    if let Some(input) = &common.input {
        config.input_path = input.clone();
    }
    Ok(config)
}

fn build_use_case(config: EtlConfig) -> EtlUseCase {
    let sink = CsvDirectorySink::new(config.write.header);
    EtlUseCase::new(config, Box::new(CsvFileSource::new()), Box::new(sink))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_logging();
    metrics::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            common,
            output_root,
            parallel,
            header,
            json,
        } => {
            let mut config = resolve_config(&common)?;
            if let Some(root) = output_root {
                config.output_root = root;
            }
            config.parallel |= parallel;
            config.write.header |= header;
            config.validate()?;

            info!("🚀 Running inspections ETL on {}", config.input_path.display());
            let summary = build_use_case(config).run().await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("\n📊 Run results:");
                println!("   Rows read: {}", summary.counts.rows_read);
                println!("   Rows kept after cleaning: {}", summary.counts.rows_cleaned);
                println!("   Groups: {}", summary.counts.groups);
                println!("   Graded: {} -> {}", summary.counts.graded, summary.graded_path.display());
                println!(
                    "   Ungraded: {} -> {}",
                    summary.counts.ungraded,
                    summary.ungraded_path.display()
                );
            }
        }
        Commands::CheckSchema { common } => {
            let config = resolve_config(&common)?;
            let report = build_use_case(config).check_schema().await?;
            println!("✅ Schema OK: {} input columns, {} rows", report.input_columns, report.rows);
            println!("   Projected columns: {}", report.projected_columns.join(", "));
        }
    }
    Ok(())
}
