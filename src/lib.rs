//! Restaurant inspection ETL.
//!
//! Turns the raw inspection export into two aggregated tables, graded and
//! ungraded establishments, through five pure stages: projection, cleaning,
//! flag encoding, aggregation and partitioning.

pub mod config;
pub mod constants;
pub mod error;
pub mod observability;
pub mod pipeline;

// Ports and the run use case
pub mod app;
// CSV and in-memory adapters for the ports
pub mod infra;

pub use app::etl_use_case::{EtlUseCase, RunSummary};
pub use config::EtlConfig;
pub use error::{EtlError, Result};
