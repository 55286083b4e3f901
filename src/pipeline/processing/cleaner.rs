use tracing::debug;

use crate::pipeline::record::InspectionRecord;

/// Removes every record with a missing value in any retained column.
pub fn clean(records: Vec<InspectionRecord>) -> Vec<InspectionRecord> {
    let before = records.len();
    let cleaned: Vec<InspectionRecord> = records
        .into_iter()
        .filter(InspectionRecord::is_complete)
        .collect();

    debug!("Cleaner kept {} of {} records", cleaned.len(), before);
    cleaned
}
