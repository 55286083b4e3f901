use async_trait::async_trait;
use csv::ReaderBuilder;
use std::fs::File;
use std::path::Path;
use tracing::{info, instrument};

use crate::app::ports::{ReadOptions, TableSource};
use crate::error::{EtlError, Result};
use crate::pipeline::table::RawTable;

/// Reads a delimited text file into a [`RawTable`].
///
/// Empty fields become nulls. Ragged rows are padded with nulls so every row
/// matches the header width.
pub struct CsvFileSource {
    delimiter: u8,
}

impl CsvFileSource {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn with_delimiter(delimiter: u8) -> Self {
        Self { delimiter }
    }

    fn read_blocking(&self, path: &Path, options: ReadOptions) -> Result<RawTable> {
        let file = File::open(path).map_err(|e| EtlError::source_read(path, e))?;
        let mut rdr = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(options.has_header)
            .flexible(true)
            .from_reader(file);

        let mut table = if options.has_header {
            let headers = rdr
                .headers()
                .map_err(|e| EtlError::source_read(path, e))?
                .iter()
                .map(|h| h.trim().to_string())
                .collect();
            RawTable::new(headers)
        } else {
            RawTable::default()
        };

        for record in rdr.records() {
            let record = record.map_err(|e| EtlError::source_read(path, e))?;
            if !options.has_header && record.len() > table.headers.len() {
                // Headerless input: name columns positionally, widening as needed
                for i in table.headers.len()..record.len() {
                    table.headers.push(format!("_c{}", i));
                }
                for row in &mut table.rows {
                    row.resize(table.headers.len(), None);
                }
            }
            table.push_row(
                record
                    .iter()
                    .map(|field| (!field.is_empty()).then(|| field.to_string()))
                    .collect(),
            );
        }

        Ok(table)
    }
}

impl Default for CsvFileSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TableSource for CsvFileSource {
    #[instrument(skip(self))]
    async fn read(&self, path: &Path, options: ReadOptions) -> Result<RawTable> {
        let table = self.read_blocking(path, options)?;
        info!(
            "📥 Read {} rows x {} columns from {}",
            table.len(),
            table.headers.len(),
            path.display()
        );
        Ok(table)
    }
}
