//! Metrics for the inspection ETL.
//!
//! Metric names follow Prometheus conventions and live in one enum so no
//! stage records against a magic string.

use std::fmt;
use std::net::SocketAddr;
use tracing::{info, warn};

/// Every metric the pipeline records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Run metrics
    RunsSuccess,
    RunsError,
    RunDuration,

    // Source metrics
    SourceRowsRead,

    // Stage metrics
    StageDuration,
    CleanerRowsDropped,
    BindCoercions,
    AggregatorGroups,

    // Partition metrics
    PartitionGradedRows,
    PartitionUngradedRows,

    // Sink metrics
    SinkWritesSuccess,
    SinkWritesError,
    SinkRowsWritten,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::RunsSuccess => "etl_runs_success_total",
            MetricName::RunsError => "etl_runs_error_total",
            MetricName::RunDuration => "etl_run_duration_seconds",
            MetricName::SourceRowsRead => "etl_source_rows_read_total",
            MetricName::StageDuration => "etl_stage_duration_seconds",
            MetricName::CleanerRowsDropped => "etl_cleaner_rows_dropped_total",
            MetricName::BindCoercions => "etl_bind_coercions_total",
            MetricName::AggregatorGroups => "etl_aggregator_groups",
            MetricName::PartitionGradedRows => "etl_partition_graded_rows_total",
            MetricName::PartitionUngradedRows => "etl_partition_ungraded_rows_total",
            MetricName::SinkWritesSuccess => "etl_sink_writes_success_total",
            MetricName::SinkWritesError => "etl_sink_writes_error_total",
            MetricName::SinkRowsWritten => "etl_sink_rows_written_total",
        }
    }

    pub fn all_metrics() -> impl Iterator<Item = MetricName> {
        use MetricName::*;
        [
            RunsSuccess,
            RunsError,
            RunDuration,
            SourceRowsRead,
            StageDuration,
            CleanerRowsDropped,
            BindCoercions,
            AggregatorGroups,
            PartitionGradedRows,
            PartitionUngradedRows,
            SinkWritesSuccess,
            SinkWritesError,
            SinkRowsWritten,
        ]
        .into_iter()
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Installs the Prometheus exporter when `ETL_METRICS_PORT` is set.
///
/// Without an installed recorder the `metrics` macros are no-ops.
pub fn init() {
    let port = match std::env::var("ETL_METRICS_PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
    {
        Some(port) => port,
        None => return,
    };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new().with_http_listener(addr);
    match builder.install() {
        Ok(()) => info!("Prometheus exporter listening on http://{}/metrics", addr),
        Err(e) => warn!("Prometheus exporter install failed: {}", e),
    }
}

pub mod run {
    use super::MetricName;

    pub fn success(duration_secs: f64) {
        ::metrics::counter!(MetricName::RunsSuccess.as_str()).increment(1);
        ::metrics::histogram!(MetricName::RunDuration.as_str()).record(duration_secs);
    }

    pub fn error(kind: &'static str) {
        ::metrics::counter!(MetricName::RunsError.as_str(), "kind" => kind).increment(1);
    }
}

pub mod stages {
    use super::MetricName;

    pub fn rows_read(count: usize) {
        ::metrics::counter!(MetricName::SourceRowsRead.as_str()).increment(count as u64);
    }

    pub fn duration(stage: &'static str, secs: f64) {
        ::metrics::histogram!(MetricName::StageDuration.as_str(), "stage" => stage).record(secs);
    }

    pub fn rows_dropped(count: usize) {
        ::metrics::counter!(MetricName::CleanerRowsDropped.as_str()).increment(count as u64);
    }

    pub fn coercions(count: usize) {
        ::metrics::counter!(MetricName::BindCoercions.as_str()).increment(count as u64);
    }

    pub fn groups(count: usize) {
        ::metrics::gauge!(MetricName::AggregatorGroups.as_str()).set(count as f64);
    }

    pub fn partitioned(graded: usize, ungraded: usize) {
        ::metrics::counter!(MetricName::PartitionGradedRows.as_str()).increment(graded as u64);
        ::metrics::counter!(MetricName::PartitionUngradedRows.as_str()).increment(ungraded as u64);
    }
}

pub mod sink {
    use super::MetricName;

    pub fn write_success(table: &str, rows: usize) {
        ::metrics::counter!(MetricName::SinkWritesSuccess.as_str(), "table" => table.to_string())
            .increment(1);
        ::metrics::counter!(MetricName::SinkRowsWritten.as_str(), "table" => table.to_string())
            .increment(rows as u64);
    }

    pub fn write_error(table: &str) {
        ::metrics::counter!(MetricName::SinkWritesError.as_str(), "table" => table.to_string())
            .increment(1);
    }
}
