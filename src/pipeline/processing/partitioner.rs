use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{GRADED_GRADES, OUTPUT_COLUMNS};
use crate::pipeline::processing::aggregator::AggregatedRow;
use crate::pipeline::table::OutputTable;

/// The set of grades that count as "graded".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradePolicy {
    pub graded: Vec<String>,
}

impl Default for GradePolicy {
    fn default() -> Self {
        Self {
            graded: GRADED_GRADES.iter().map(|g| g.to_string()).collect(),
        }
    }
}

impl GradePolicy {
    /// Exact, case-sensitive membership test; a null grade is never graded.
    pub fn is_graded(&self, grade: Option<&str>) -> bool {
        grade.is_some_and(|g| self.graded.iter().any(|allowed| allowed == g))
    }
}

/// The two disjoint outputs of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partitioned {
    pub graded: Vec<AggregatedRow>,
    pub ungraded: Vec<AggregatedRow>,
}

impl Partitioned {
    pub fn total(&self) -> usize {
        self.graded.len() + self.ungraded.len()
    }
}

/// Splits aggregated rows by grade. Every input row lands in exactly one side.
pub fn partition(rows: Vec<AggregatedRow>, policy: &GradePolicy) -> Partitioned {
    let (graded, ungraded): (Vec<_>, Vec<_>) = rows
        .into_iter()
        .partition(|row| policy.is_graded(row.grade.as_deref()));

    debug!("Partitioned into {} graded / {} ungraded rows", graded.len(), ungraded.len());
    Partitioned { graded, ungraded }
}

/// Renders aggregated rows into a named table for a sink.
pub fn to_output_table(name: &str, rows: &[AggregatedRow]) -> OutputTable {
    OutputTable {
        name: name.to_string(),
        headers: OUTPUT_COLUMNS.iter().map(|c| c.to_string()).collect(),
        rows: rows.iter().map(AggregatedRow::to_cells).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(grade: Option<&str>) -> AggregatedRow {
        AggregatedRow {
            inspection_type: Some("Cycle Inspection / Initial Inspection".to_string()),
            codes: "10F".to_string(),
            flags: 0,
            score: Some(10),
            grade: grade.map(str::to_string),
        }
    }

    #[test]
    fn test_partition_predicate() {
        let parts = partition(
            vec![row(Some("Z")), row(None), row(Some("B"))],
            &GradePolicy::default(),
        );

        assert_eq!(parts.graded, vec![row(Some("B"))]);
        assert_eq!(parts.ungraded, vec![row(Some("Z")), row(None)]);
    }

    #[test]
    fn test_partition_is_case_sensitive_and_exact() {
        let parts = partition(
            vec![row(Some("a")), row(Some("")), row(Some("A ")), row(Some("P")), row(Some("C"))],
            &GradePolicy::default(),
        );

        assert_eq!(parts.graded.len(), 1);
        assert_eq!(parts.ungraded.len(), 4);
    }

    #[test]
    fn test_partition_conserves_rows() {
        let input: Vec<AggregatedRow> = ["A", "B", "C", "N", "Z", "P", "A"]
            .iter()
            .map(|g| row(Some(*g)))
            .chain(std::iter::once(row(None)))
            .collect();

        let parts = partition(input.clone(), &GradePolicy::default());

        assert_eq!(parts.total(), input.len());
        assert!(parts.graded.iter().all(|r| !parts.ungraded.contains(r)));
    }

    #[test]
    fn test_custom_policy() {
        let policy = GradePolicy {
            graded: vec!["A".to_string()],
        };

        let parts = partition(vec![row(Some("A")), row(Some("B"))], &policy);

        assert_eq!(parts.graded.len(), 1);
        assert_eq!(parts.ungraded[0].grade.as_deref(), Some("B"));
    }

    #[test]
    fn test_to_output_table_uses_output_columns() {
        let table = to_output_table("Graded", &[row(Some("A"))]);

        assert_eq!(table.headers, vec!["InspectionType", "Codes", "Flags", "Score", "Grade"]);
        assert_eq!(table.rows[0], vec!["Cycle Inspection / Initial Inspection", "10F", "0", "10", "A"]);
    }
}
