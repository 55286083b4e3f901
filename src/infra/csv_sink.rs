use async_trait::async_trait;
use csv::WriterBuilder;
use std::fs;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

use crate::app::ports::{TableSink, WriteMode};
use crate::error::{EtlError, Result};
use crate::pipeline::table::OutputTable;

pub const PART_FILE: &str = "part-00000.csv";
pub const SUCCESS_MARKER: &str = "_SUCCESS";

/// Persists a table as a directory holding one CSV part file and an empty
/// `_SUCCESS` marker written after the part file is complete.
pub struct CsvDirectorySink {
    header: bool,
}

impl CsvDirectorySink {
    pub fn new(header: bool) -> Self {
        Self { header }
    }

    fn write_blocking(&self, table: &OutputTable, dir: &Path, mode: WriteMode) -> Result<()> {
        if dir.exists() {
            match mode {
                WriteMode::Overwrite => {
                    debug!("Replacing existing destination {}", dir.display());
                    fs::remove_dir_all(dir)?;
                }
                WriteMode::ErrorIfExists => {
                    return Err(EtlError::Config(format!(
                        "destination '{}' already exists",
                        dir.display()
                    )));
                }
            }
        }
        fs::create_dir_all(dir)?;

        // The directory is ours from here on; a failed write leaves nothing behind
        self.write_part(table, dir).map_err(|e| {
            if let Err(cleanup) = fs::remove_dir_all(dir) {
                warn!("Failed to remove partial output {}: {}", dir.display(), cleanup);
            }
            e
        })
    }

    fn write_part(&self, table: &OutputTable, dir: &Path) -> Result<()> {
        let mut writer = WriterBuilder::new().from_path(dir.join(PART_FILE))?;
        if self.header {
            writer.write_record(&table.headers)?;
        }
        for row in &table.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;

        fs::File::create(dir.join(SUCCESS_MARKER))?;
        Ok(())
    }
}

impl Default for CsvDirectorySink {
    fn default() -> Self {
        Self::new(false)
    }
}

#[async_trait]
impl TableSink for CsvDirectorySink {
    #[instrument(skip(self, table), fields(table_name = %table.name, rows = table.rows.len()))]
    async fn write(&self, table: &OutputTable, path: &Path, mode: WriteMode) -> Result<()> {
        self.write_blocking(table, path, mode)
            .map_err(|e| EtlError::sink_write(path, e))?;
        info!("💾 Wrote {} rows to {}", table.len(), path.display());
        Ok(())
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        Ok(path.exists())
    }

    async fn discard(&self, path: &Path) -> Result<()> {
        match fs::remove_dir_all(path) {
            Ok(()) => {
                info!("🗑️ Discarded {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(EtlError::sink_write(path, e)),
        }
    }
}
