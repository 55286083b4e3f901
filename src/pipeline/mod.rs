// Data processing pipeline: tables, typed records, stages, and the transform

pub mod processing;
pub mod record;
pub mod table;
pub mod transform;

pub use transform::{run_dir, transform, StageCounts, TransformOutput};
