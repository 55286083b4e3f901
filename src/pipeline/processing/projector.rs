use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{DROPPED_COLUMNS, RENAMED_COLUMNS};
use crate::error::{EtlError, Result};
use crate::pipeline::table::RawTable;

/// A single column rename
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameRule {
    pub from: String,
    pub to: String,
}

/// Which raw columns are removed and how the survivors are renamed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    pub drop: Vec<String>,
    pub rename: Vec<RenameRule>,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            drop: DROPPED_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rename: RENAMED_COLUMNS
                .iter()
                .map(|(from, to)| RenameRule {
                    from: from.to_string(),
                    to: to.to_string(),
                })
                .collect(),
        }
    }
}

/// Drops and renames columns of a raw table.
pub struct Projector {
    mapping: ColumnMapping,
}

impl Projector {
    pub fn new(mapping: ColumnMapping) -> Self {
        Self { mapping }
    }

    /// A table is canonical when none of the raw names survive and every
    /// rename target is present.
    pub fn is_canonical(&self, table: &RawTable) -> bool {
        self.mapping.drop.iter().all(|c| !table.has_column(c))
            && self
                .mapping
                .rename
                .iter()
                .all(|r| !table.has_column(&r.from) && table.has_column(&r.to))
    }

    /// Returns a new table without the dropped columns and with renamed
    /// headers. Projecting an already canonical table returns it unchanged.
    pub fn project(&self, table: &RawTable) -> Result<RawTable> {
        if self.is_canonical(table) {
            debug!("Table already in canonical form, projection is a no-op");
            return Ok(table.clone());
        }

        for column in &self.mapping.drop {
            if !table.has_column(column) {
                return Err(EtlError::schema_mismatch(column.as_str(), "drop"));
            }
        }
        for rule in &self.mapping.rename {
            if !table.has_column(&rule.from) {
                return Err(EtlError::schema_mismatch(rule.from.as_str(), "rename"));
            }
        }

        let kept: Vec<usize> = table
            .headers
            .iter()
            .enumerate()
            .filter(|(_, name)| !self.mapping.drop.contains(*name))
            .map(|(i, _)| i)
            .collect();

        let headers = kept
            .iter()
            .map(|&i| {
                let name = &table.headers[i];
                self.mapping
                    .rename
                    .iter()
                    .find(|r| &r.from == name)
                    .map(|r| r.to.clone())
                    .unwrap_or_else(|| name.clone())
            })
            .collect();

        let rows = table
            .rows
            .iter()
            .map(|row| kept.iter().map(|&i| row.get(i).cloned().flatten()).collect())
            .collect();

        debug!(
            "Projected {} columns down to {}",
            table.headers.len(),
            kept.len()
        );

        Ok(RawTable { headers, rows })
    }
}

impl Default for Projector {
    fn default() -> Self {
        Self::new(ColumnMapping::default())
    }
}
