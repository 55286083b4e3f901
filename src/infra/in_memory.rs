use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::app::ports::{ReadOptions, TableSink, TableSource, WriteMode};
use crate::error::{EtlError, Result};
use crate::pipeline::table::{OutputTable, RawTable};

/// Serves a fixed table regardless of path
pub struct InMemorySource {
    table: RawTable,
}

impl InMemorySource {
    pub fn new(table: RawTable) -> Self {
        Self { table }
    }
}

#[async_trait]
impl TableSource for InMemorySource {
    async fn read(&self, _path: &Path, _options: ReadOptions) -> Result<RawTable> {
        Ok(self.table.clone())
    }
}

/// Keeps written tables in memory, keyed by destination path.
///
/// Cloning shares the underlying store, so a test can keep a handle after
/// boxing the sink into a use case.
#[derive(Clone, Default)]
pub struct InMemorySink {
    tables: Arc<Mutex<HashMap<PathBuf, OutputTable>>>,
    writes: Arc<Mutex<Vec<PathBuf>>>,
    fail_on: Option<String>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that fails any write whose table name equals `table_name`
    pub fn failing_on(table_name: &str) -> Self {
        Self {
            fail_on: Some(table_name.to_string()),
            ..Self::default()
        }
    }

    pub fn get(&self, path: &Path) -> Option<OutputTable> {
        self.tables.lock().unwrap().get(path).cloned()
    }

    /// Destination paths in the order they were written
    pub fn writes(&self) -> Vec<PathBuf> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl TableSink for InMemorySink {
    async fn write(&self, table: &OutputTable, path: &Path, mode: WriteMode) -> Result<()> {
        self.writes.lock().unwrap().push(path.to_path_buf());

        if self.fail_on.as_deref() == Some(table.name.as_str()) {
            return Err(EtlError::sink_write(path, "simulated write failure"));
        }

        let mut tables = self.tables.lock().unwrap();
        if mode == WriteMode::ErrorIfExists && tables.contains_key(path) {
            return Err(EtlError::sink_write(path, "destination already exists"));
        }
        tables.insert(path.to_path_buf(), table.clone());
        Ok(())
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .keys()
            .any(|stored| stored.starts_with(path)))
    }

    async fn discard(&self, path: &Path) -> Result<()> {
        self.tables
            .lock()
            .unwrap()
            .retain(|stored, _| !stored.starts_with(path));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(name: &str) -> OutputTable {
        OutputTable {
            name: name.to_string(),
            headers: vec!["Codes".to_string()],
            rows: vec![vec!["10F".to_string()]],
        }
    }

    #[tokio::test]
    async fn test_discard_removes_everything_below_path() {
        let sink = InMemorySink::new();
        let graded = Path::new("Output/1/Graded");
        let other_run = Path::new("Output/2/Graded");
        sink.write(&table("Graded"), graded, WriteMode::Overwrite).await.unwrap();
        sink.write(&table("Graded"), other_run, WriteMode::Overwrite).await.unwrap();

        assert!(sink.exists(Path::new("Output/1")).await.unwrap());
        sink.discard(Path::new("Output/1")).await.unwrap();

        assert!(sink.get(graded).is_none());
        assert!(!sink.exists(Path::new("Output/1")).await.unwrap());
        assert!(sink.get(other_run).is_some());
    }
}
