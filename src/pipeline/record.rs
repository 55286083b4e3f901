use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use crate::constants::{
    BUSINESS_NAME, CRITICAL_FLAG, DATE_FORMATS, GRADE, INSPECTION_DATE, INSPECTION_TYPE, SCORE,
    VIOLATION_CODE,
};
use crate::error::{EtlError, Result};
use crate::pipeline::table::RawTable;

/// One inspection-violation row in canonical, typed form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectionRecord {
    pub business_name: Option<String>,
    pub inspection_date: Option<NaiveDate>,
    pub inspection_type: Option<String>,
    pub critical_flag: Option<String>,
    pub violation_code: Option<String>,
    pub score: Option<i64>,
    pub grade: Option<String>,
    /// Retained columns outside the canonical set, keyed by column name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extras: BTreeMap<String, Option<String>>,
}

impl InspectionRecord {
    /// True when every retained column, canonical or extra, has a value.
    pub fn is_complete(&self) -> bool {
        self.business_name.is_some()
            && self.inspection_date.is_some()
            && self.inspection_type.is_some()
            && self.critical_flag.is_some()
            && self.violation_code.is_some()
            && self.score.is_some()
            && self.grade.is_some()
            && self.extras.values().all(Option::is_some)
    }
}

/// An [`InspectionRecord`] after the critical flag has been encoded to 0/1.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedRecord {
    pub business_name: Option<String>,
    pub inspection_date: Option<NaiveDate>,
    pub inspection_type: Option<String>,
    pub critical_flag: i64,
    pub violation_code: Option<String>,
    pub score: Option<i64>,
    pub grade: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extras: BTreeMap<String, Option<String>>,
}

/// Typed records produced from a projected table.
#[derive(Debug, Clone, Default)]
pub struct BoundRecords {
    pub records: Vec<InspectionRecord>,
    /// Cells that were present but could not be typed and were read as null
    pub coercions: usize,
}

struct CanonicalIndexes {
    business_name: usize,
    inspection_date: usize,
    inspection_type: usize,
    critical_flag: usize,
    violation_code: usize,
    score: usize,
    grade: usize,
}

impl CanonicalIndexes {
    fn resolve(table: &RawTable) -> Result<Self> {
        let index = |name: &str| {
            table
                .column_index(name)
                .ok_or_else(|| EtlError::schema_mismatch(name, "bind"))
        };

        Ok(Self {
            business_name: index(BUSINESS_NAME)?,
            inspection_date: index(INSPECTION_DATE)?,
            inspection_type: index(INSPECTION_TYPE)?,
            critical_flag: index(CRITICAL_FLAG)?,
            violation_code: index(VIOLATION_CODE)?,
            score: index(SCORE)?,
            grade: index(GRADE)?,
        })
    }

    fn contains(&self, idx: usize) -> bool {
        [
            self.business_name,
            self.inspection_date,
            self.inspection_type,
            self.critical_flag,
            self.violation_code,
            self.score,
            self.grade,
        ]
        .contains(&idx)
    }
}

/// Binds a projected table to typed records.
///
/// Column lookups by name happen once here; later stages only use field
/// access. A present value that does not parse as its column's type is read
/// as null and counted in [`BoundRecords::coercions`].
pub fn bind(table: &RawTable) -> Result<BoundRecords> {
    let idx = CanonicalIndexes::resolve(table)?;
    let extra_columns: Vec<(usize, &String)> = table
        .headers
        .iter()
        .enumerate()
        .filter(|(i, _)| !idx.contains(*i))
        .collect();

    let mut bound = BoundRecords {
        records: Vec::with_capacity(table.len()),
        coercions: 0,
    };

    for row in &table.rows {
        let cell = |i: usize| row.get(i).cloned().flatten();

        let inspection_date = match cell(idx.inspection_date) {
            Some(raw) => {
                let parsed = parse_date(&raw);
                if parsed.is_none() {
                    warn!("Unparseable {} value '{}', treating as null", INSPECTION_DATE, raw);
                    bound.coercions += 1;
                }
                parsed
            }
            None => None,
        };

        let score = match cell(idx.score) {
            Some(raw) => {
                let parsed = parse_score(&raw);
                if parsed.is_none() {
                    warn!("Unparseable {} value '{}', treating as null", SCORE, raw);
                    bound.coercions += 1;
                }
                parsed
            }
            None => None,
        };

        bound.records.push(InspectionRecord {
            business_name: cell(idx.business_name),
            inspection_date,
            inspection_type: cell(idx.inspection_type),
            critical_flag: cell(idx.critical_flag),
            violation_code: cell(idx.violation_code),
            score,
            grade: cell(idx.grade),
            extras: extra_columns
                .iter()
                .map(|(i, name)| ((*name).clone(), cell(*i)))
                .collect(),
        });
    }

    Ok(bound)
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    // Exports sometimes carry a midnight time component
    let date_part = raw.split_whitespace().next().unwrap_or(raw);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

/// Scores are integral; a decimal value is accepted only when it has no
/// fractional part.
pub fn parse_score(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    raw.parse::<i64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive
            .filter(|v| v.fract() == 0.0 && *v >= i64::MIN as f64 && *v < i64::MAX as f64)
            .map(|v| v as i64)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical_table(rows: &[&[&str]]) -> RawTable {
        RawTable::from_strs(
            &[
                BUSINESS_NAME,
                INSPECTION_DATE,
                VIOLATION_CODE,
                CRITICAL_FLAG,
                SCORE,
                GRADE,
                INSPECTION_TYPE,
            ],
            rows,
        )
    }

    #[test]
    fn test_bind_types_canonical_columns() {
        let table = canonical_table(&[&["PIZZA PLACE", "02/14/2023", "10F", "Y", "12", "A", "Initial"]]);

        let bound = bind(&table).unwrap();
        let record = &bound.records[0];

        assert_eq!(record.business_name.as_deref(), Some("PIZZA PLACE"));
        assert_eq!(record.inspection_date, NaiveDate::from_ymd_opt(2023, 2, 14));
        assert_eq!(record.score, Some(12));
        assert_eq!(record.critical_flag.as_deref(), Some("Y"));
        assert!(record.extras.is_empty());
        assert_eq!(bound.coercions, 0);
    }

    #[test]
    fn test_bind_counts_coercions() {
        let table = canonical_table(&[&["DINER", "not a date", "04L", "N", "twelve", "B", "Re-inspection"]]);

        let bound = bind(&table).unwrap();

        assert_eq!(bound.records[0].inspection_date, None);
        assert_eq!(bound.records[0].score, None);
        assert_eq!(bound.coercions, 2);
    }

    #[test]
    fn test_bind_keeps_extra_columns() {
        let mut table = canonical_table(&[&["DINER", "2023-01-05", "04L", "N", "7", "A", "Initial"]]);
        table.headers.push("CUISINE".to_string());
        table.rows[0].push(None);

        let bound = bind(&table).unwrap();

        assert_eq!(bound.records[0].extras.get("CUISINE"), Some(&None));
        assert!(!bound.records[0].is_complete());
    }

    #[test]
    fn test_bind_reports_missing_canonical_column() {
        let table = RawTable::from_strs(&[BUSINESS_NAME, INSPECTION_DATE], &[]);

        let err = bind(&table).unwrap_err();
        assert!(matches!(err, EtlError::SchemaMismatch { operation: "bind", .. }));
    }

    #[test]
    fn test_parse_score_accepts_integral_decimals() {
        assert_eq!(parse_score("13"), Some(13));
        assert_eq!(parse_score("13.0"), Some(13));
        assert_eq!(parse_score("13.5"), None);
    }

    #[test]
    fn test_parse_score_rejects_out_of_range_values() {
        assert_eq!(parse_score("1e30"), None);
        assert_eq!(parse_score("-1e30"), None);
        assert_eq!(parse_score("inf"), None);
        assert_eq!(parse_score("NaN"), None);
        assert_eq!(parse_score("1e3"), Some(1000));
    }

    #[test]
    fn test_parse_date_ignores_time_component() {
        assert_eq!(
            parse_date("08/28/2017 12:00:00 AM"),
            NaiveDate::from_ymd_opt(2017, 8, 28)
        );
    }
}
