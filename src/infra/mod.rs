pub mod csv_sink;
pub mod csv_source;
pub mod in_memory;

pub use csv_sink::CsvDirectorySink;
pub use csv_source::CsvFileSource;
pub use in_memory::{InMemorySink, InMemorySource};
