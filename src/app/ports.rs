use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::pipeline::table::{OutputTable, RawTable};

/// Options understood by a [`TableSource`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadOptions {
    /// First line holds column names; otherwise columns are `_c0`, `_c1`, ...
    pub has_header: bool,
    /// Passed through to the source; value typing happens at binding time
    pub infer_schema: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            infer_schema: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Replace whatever already exists at the destination
    Overwrite,
    /// Fail if the destination already exists
    ErrorIfExists,
}

#[async_trait]
pub trait TableSource: Send + Sync {
    async fn read(&self, path: &Path, options: ReadOptions) -> Result<RawTable>;
}

#[async_trait]
pub trait TableSink: Send + Sync {
    async fn write(&self, table: &OutputTable, path: &Path, mode: WriteMode) -> Result<()>;

    /// Whether anything is stored at or below `path`
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Removes everything stored at or below `path`; a missing path is not an error.
    async fn discard(&self, path: &Path) -> Result<()>;
}
