use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app::ports::{ReadOptions, WriteMode};
use crate::constants::{DEFAULT_INPUT_PATH, DEFAULT_OUTPUT_ROOT};
use crate::error::{EtlError, Result};
use crate::pipeline::processing::{ColumnMapping, GradePolicy, Grouping};

/// Everything one run needs, passed explicitly to the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EtlConfig {
    pub input_path: PathBuf,
    pub output_root: PathBuf,
    pub read: ReadOptions,
    pub write: WriteOptions,
    pub columns: ColumnMapping,
    pub grouping: Grouping,
    pub grades: GradePolicy,
    /// Aggregate with per-thread partial groups
    pub parallel: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteOptions {
    /// Emit a header row in each output file
    pub header: bool,
    pub mode: WriteMode,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            header: false,
            mode: WriteMode::Overwrite,
        }
    }
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            output_root: PathBuf::from(DEFAULT_OUTPUT_ROOT),
            read: ReadOptions::default(),
            write: WriteOptions::default(),
            columns: ColumnMapping::default(),
            grouping: Grouping::default(),
            grades: GradePolicy::default(),
            parallel: false,
        }
    }
}

impl EtlConfig {
    /// Loads a TOML config file; missing keys take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            EtlError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;

        let config: EtlConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.columns.rename.is_empty() {
            return Err(EtlError::Config("columns.rename must not be empty".to_string()));
        }
        for rule in &self.columns.rename {
            if self.columns.drop.contains(&rule.from) || self.columns.drop.contains(&rule.to) {
                return Err(EtlError::Config(format!(
                    "column '{}' is both renamed and dropped",
                    rule.from
                )));
            }
        }
        if self.grades.graded.is_empty() {
            return Err(EtlError::Config("grades.graded must not be empty".to_string()));
        }
        Ok(())
    }
}
