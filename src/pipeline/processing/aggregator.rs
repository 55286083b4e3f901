use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::constants::CODES_SEPARATOR;
use crate::pipeline::record::EncodedRecord;

/// Composite grouping key.
///
/// Nullable fields stay `Option`-wrapped so two missing values land in the
/// same group, matching SQL `GROUP BY` semantics. The derived `Ord` fixes the
/// output order of the aggregated rows.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey {
    pub business_name: Option<String>,
    pub inspection_date: Option<NaiveDate>,
    pub inspection_type: Option<String>,
    pub critical_flag: i64,
    pub score: Option<i64>,
    pub grade: Option<String>,
}

impl GroupKey {
    pub fn of(record: &EncodedRecord, grouping: &Grouping) -> Self {
        Self {
            business_name: record.business_name.clone(),
            inspection_date: record.inspection_date,
            inspection_type: record.inspection_type.clone(),
            critical_flag: if grouping.include_critical_flag {
                record.critical_flag
            } else {
                0
            },
            score: record.score,
            grade: record.grade.clone(),
        }
    }
}

/// Key options for the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Grouping {
    /// Keep the encoded critical flag in the key. When off, flagged and
    /// unflagged violations of one inspection share a group and `Flags`
    /// counts the flagged ones.
    pub include_critical_flag: bool,
}

impl Default for Grouping {
    fn default() -> Self {
        Self {
            include_critical_flag: true,
        }
    }
}

/// Running state of one group: distinct violation codes and the flag sum.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupAccumulator {
    pub codes: BTreeSet<String>,
    pub flags: i64,
}

impl GroupAccumulator {
    pub fn add(&mut self, record: &EncodedRecord) {
        // Null codes are skipped, like a set collection over a column
        if let Some(code) = &record.violation_code {
            self.codes.insert(code.clone());
        }
        self.flags += record.critical_flag;
    }

    pub fn merge(&mut self, other: GroupAccumulator) {
        self.codes.extend(other.codes);
        self.flags += other.flags;
    }

    /// Distinct codes in lexicographic order, comma-joined.
    pub fn joined_codes(&self) -> String {
        self.codes
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(CODES_SEPARATOR)
    }
}

/// One output row of the aggregated tables.
///
/// Field order is the output column order; serde names are the output
/// column headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedRow {
    #[serde(rename = "InspectionType")]
    pub inspection_type: Option<String>,
    #[serde(rename = "Codes")]
    pub codes: String,
    #[serde(rename = "Flags")]
    pub flags: i64,
    #[serde(rename = "Score")]
    pub score: Option<i64>,
    #[serde(rename = "Grade")]
    pub grade: Option<String>,
}

impl AggregatedRow {
    fn from_group(key: GroupKey, acc: GroupAccumulator) -> Self {
        Self {
            codes: acc.joined_codes(),
            flags: acc.flags,
            inspection_type: key.inspection_type,
            score: key.score,
            grade: key.grade,
        }
    }

    /// Renders the row as CSV cells; nulls become empty cells.
    pub fn to_cells(&self) -> Vec<String> {
        vec![
            self.inspection_type.clone().unwrap_or_default(),
            self.codes.clone(),
            self.flags.to_string(),
            self.score.map(|s| s.to_string()).unwrap_or_default(),
            self.grade.clone().unwrap_or_default(),
        ]
    }
}

type Groups = BTreeMap<GroupKey, GroupAccumulator>;

fn group_into(groups: &mut Groups, record: &EncodedRecord, grouping: &Grouping) {
    groups
        .entry(GroupKey::of(record, grouping))
        .or_default()
        .add(record);
}

fn merge_groups(mut left: Groups, right: Groups) -> Groups {
    for (key, acc) in right {
        left.entry(key).or_default().merge(acc);
    }
    left
}

fn finish(groups: Groups) -> Vec<AggregatedRow> {
    groups
        .into_iter()
        .map(|(key, acc)| AggregatedRow::from_group(key, acc))
        .collect()
}

/// Groups records by [`GroupKey`] and computes `Codes` and `Flags` per group.
pub fn aggregate(records: &[EncodedRecord], grouping: &Grouping) -> Vec<AggregatedRow> {
    let mut groups = Groups::new();
    for record in records {
        group_into(&mut groups, record, grouping);
    }
    debug!("Aggregated {} records into {} groups", records.len(), groups.len());
    finish(groups)
}

/// Same result as [`aggregate`], computed as per-thread partial groups that
/// are merged on the key afterwards.
pub fn aggregate_parallel(records: &[EncodedRecord], grouping: &Grouping) -> Vec<AggregatedRow> {
    let groups = records
        .par_iter()
        .fold(Groups::new, |mut groups, record| {
            group_into(&mut groups, record, grouping);
            groups
        })
        .reduce(Groups::new, merge_groups);
    debug!(
        "Aggregated {} records into {} groups (parallel)",
        records.len(),
        groups.len()
    );
    finish(groups)
}
