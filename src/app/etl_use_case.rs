use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info, instrument, warn};

use crate::app::ports::{TableSink, TableSource};
use crate::config::EtlConfig;
use crate::constants::{GRADED_DIR, UNGRADED_DIR};
use crate::error::{EtlError, Result};
use crate::observability::metrics;
use crate::pipeline::processing::partitioner::to_output_table;
use crate::pipeline::processing::Projector;
use crate::pipeline::record;
use crate::pipeline::{run_dir, transform, StageCounts};

/// Outcome of a successful run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub run_dir: PathBuf,
    pub graded_path: PathBuf,
    pub ungraded_path: PathBuf,
    #[serde(flatten)]
    pub counts: StageCounts,
}

/// Result of validating an input's schema without writing anything
#[derive(Debug, Clone, Serialize)]
pub struct SchemaReport {
    pub input_columns: usize,
    pub projected_columns: Vec<String>,
    pub rows: usize,
}

/// Reads the inspection table, transforms it and persists both partitions.
pub struct EtlUseCase {
    config: EtlConfig,
    source: Box<dyn TableSource>,
    sink: Box<dyn TableSink>,
}

impl EtlUseCase {
    pub fn new(config: EtlConfig, source: Box<dyn TableSource>, sink: Box<dyn TableSink>) -> Self {
        Self {
            config,
            source,
            sink,
        }
    }

    /// Runs the pipeline with the current time as the run timestamp.
    pub async fn run(&self) -> Result<RunSummary> {
        self.run_at(Utc::now()).await
    }

    /// Runs the pipeline writing under `<output_root>/<started_at seconds>`.
    ///
    /// A run succeeds only if both partitions are written. If either write
    /// fails the run directory is removed before the error is returned.
    #[instrument(skip(self), fields(input = %self.config.input_path.display()))]
    pub async fn run_at(&self, started_at: DateTime<Utc>) -> Result<RunSummary> {
        let timer = Instant::now();
        let result = self.execute(started_at).await;

        match &result {
            Ok(summary) => {
                metrics::run::success(timer.elapsed().as_secs_f64());
                info!(
                    "✅ Run complete: {} graded, {} ungraded rows in {}",
                    summary.counts.graded,
                    summary.counts.ungraded,
                    summary.run_dir.display()
                );
            }
            Err(e) => {
                metrics::run::error(error_kind(e));
                error!("❌ Run failed: {}", e);
            }
        }
        result
    }

    async fn execute(&self, started_at: DateTime<Utc>) -> Result<RunSummary> {
        let raw = self
            .source
            .read(&self.config.input_path, self.config.read)
            .await?;
        metrics::stages::rows_read(raw.len());

        // Everything up to here is pure; a schema problem aborts before any output exists
        let output = transform(&raw, &self.config)?;

        let dir = run_dir(&self.config.output_root, started_at);
        let graded_path = dir.join(GRADED_DIR);
        let ungraded_path = dir.join(UNGRADED_DIR);

        let graded = to_output_table(GRADED_DIR, &output.partitioned.graded);
        let ungraded = to_output_table(UNGRADED_DIR, &output.partitioned.ungraded);

        let dir_existed = self.sink.exists(&dir).await?;
        let mut written: Vec<&Path> = Vec::with_capacity(2);
        for (table, path) in [(&graded, &graded_path), (&ungraded, &ungraded_path)] {
            if let Err(e) = self.sink.write(table, path, self.config.write.mode).await {
                metrics::sink::write_error(&table.name);
                self.roll_back(&written, &dir, dir_existed).await;
                return Err(e);
            }
            metrics::sink::write_success(&table.name, table.len());
            written.push(path);
        }

        Ok(RunSummary {
            started_at,
            run_dir: dir,
            graded_path,
            ungraded_path,
            counts: output.counts,
        })
    }

    /// Removes the partitions this run wrote, and the run directory if this
    /// run created it. Output that predates the run is left alone.
    async fn roll_back(&self, written: &[&Path], dir: &Path, dir_existed: bool) {
        let targets: Vec<&Path> = if dir_existed {
            written.to_vec()
        } else {
            vec![dir]
        };
        for path in targets {
            match self.sink.discard(path).await {
                Ok(()) => warn!("Removed incomplete output {}", path.display()),
                Err(e) => warn!("Failed to remove incomplete output {}: {}", path.display(), e),
            }
        }
    }

    /// Reads the input and checks that it projects and binds cleanly.
    pub async fn check_schema(&self) -> Result<SchemaReport> {
        let raw = self
            .source
            .read(&self.config.input_path, self.config.read)
            .await?;
        let projected = Projector::new(self.config.columns.clone()).project(&raw)?;
        record::bind(&projected)?;

        Ok(SchemaReport {
            input_columns: raw.headers.len(),
            projected_columns: projected.headers,
            rows: raw.len(),
        })
    }
}

fn error_kind(e: &EtlError) -> &'static str {
    match e {
        EtlError::SchemaMismatch { .. } => "schema_mismatch",
        EtlError::SourceRead { .. } => "source_read",
        EtlError::SinkWrite { .. } => "sink_write",
        EtlError::Csv(_) | EtlError::Io(_) => "io",
        EtlError::Toml(_) | EtlError::Config(_) => "config",
    }
}
