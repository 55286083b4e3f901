// Pipeline processing: projection, cleaning, encoding, aggregation, partitioning

pub mod projector;
pub mod cleaner;
pub mod encoder;
pub mod aggregator;
pub mod partitioner;

pub use aggregator::{aggregate, aggregate_parallel, AggregatedRow, GroupKey, Grouping};
pub use cleaner::clean;
pub use encoder::encode;
pub use partitioner::{partition, GradePolicy, Partitioned};
pub use projector::{ColumnMapping, Projector, RenameRule};
