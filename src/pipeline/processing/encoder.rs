use crate::constants::CRITICAL_FLAG_SET;
use crate::pipeline::record::{EncodedRecord, InspectionRecord};

/// `1` when the flag is exactly `"Y"`, otherwise `0`.
pub fn encode_flag(flag: Option<&str>) -> i64 {
    match flag {
        Some(CRITICAL_FLAG_SET) => 1,
        _ => 0,
    }
}

/// Encodes the critical flag of every record; must run after cleaning.
/// Every other field, extra columns included, is carried over unchanged.
pub fn encode(records: Vec<InspectionRecord>) -> Vec<EncodedRecord> {
    records
        .into_iter()
        .map(|r| EncodedRecord {
            critical_flag: encode_flag(r.critical_flag.as_deref()),
            business_name: r.business_name,
            inspection_date: r.inspection_date,
            inspection_type: r.inspection_type,
            violation_code: r.violation_code,
            score: r.score,
            grade: r.grade,
            extras: r.extras,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_flag(flag: Option<&str>) -> InspectionRecord {
        InspectionRecord {
            business_name: Some("TACO SPOT".to_string()),
            critical_flag: flag.map(str::to_string),
            violation_code: Some("02B".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_encode_flag_is_exact_and_case_sensitive() {
        assert_eq!(encode_flag(Some("Y")), 1);
        assert_eq!(encode_flag(Some("y")), 0);
        assert_eq!(encode_flag(Some("N")), 0);
        assert_eq!(encode_flag(Some("Not Applicable")), 0);
        assert_eq!(encode_flag(Some(" Y")), 0);
        assert_eq!(encode_flag(None), 0);
    }

    #[test]
    fn test_encode_passes_other_fields_through() {
        let encoded = encode(vec![with_flag(Some("Y")), with_flag(Some("N"))]);

        assert_eq!(encoded[0].critical_flag, 1);
        assert_eq!(encoded[1].critical_flag, 0);
        assert_eq!(encoded[0].business_name.as_deref(), Some("TACO SPOT"));
        assert_eq!(encoded[0].violation_code.as_deref(), Some("02B"));
        assert!(encoded.iter().all(|r| r.critical_flag == 0 || r.critical_flag == 1));
    }

    #[test]
    fn test_encode_keeps_extra_columns() {
        let mut record = with_flag(Some("Y"));
        record
            .extras
            .insert("BORO".to_string(), Some("Queens".to_string()));

        let encoded = encode(vec![record]);

        assert_eq!(
            encoded[0].extras.get("BORO"),
            Some(&Some("Queens".to_string()))
        );
    }
}
