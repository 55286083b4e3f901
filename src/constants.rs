//! Column name constants for the raw inspection export and the canonical
//! schema the pipeline works in.

// Raw columns removed by the projector
pub const DROPPED_COLUMNS: [&str; 19] = [
    "CAMIS",
    "CUISINE DESCRIPTION",
    "VIOLATION DESCRIPTION",
    "BORO",
    "BUILDING",
    "STREET",
    "ZIPCODE",
    "PHONE",
    "ACTION",
    "GRADE DATE",
    "RECORD DATE",
    "Latitude",
    "Longitude",
    "Community Board",
    "Council District",
    "Census Tract",
    "BIN",
    "BBL",
    "NTA",
];

// Canonical (space-free) column names
pub const BUSINESS_NAME: &str = "BusinessName";
pub const INSPECTION_DATE: &str = "InspectionDate";
pub const INSPECTION_TYPE: &str = "InspectionType";
pub const CRITICAL_FLAG: &str = "CriticalFlag";
pub const VIOLATION_CODE: &str = "ViolationCode";
pub const SCORE: &str = "Score";
pub const GRADE: &str = "Grade";

// Aggregated output columns
pub const CODES: &str = "Codes";
pub const FLAGS: &str = "Flags";

/// Raw column name -> canonical column name
pub const RENAMED_COLUMNS: [(&str, &str); 7] = [
    ("INSPECTION DATE", INSPECTION_DATE),
    ("INSPECTION TYPE", INSPECTION_TYPE),
    ("CRITICAL FLAG", CRITICAL_FLAG),
    ("VIOLATION CODE", VIOLATION_CODE),
    ("DBA", BUSINESS_NAME),
    ("SCORE", SCORE),
    ("GRADE", GRADE),
];

/// Columns of the aggregated tables, in output order
pub const OUTPUT_COLUMNS: [&str; 5] = [INSPECTION_TYPE, CODES, FLAGS, SCORE, GRADE];

pub const GRADED_GRADES: [&str; 3] = ["A", "B", "C"];

/// Flag value that encodes to 1
pub const CRITICAL_FLAG_SET: &str = "Y";

pub const CODES_SEPARATOR: &str = ",";

pub const GRADED_DIR: &str = "Graded";
pub const UNGRADED_DIR: &str = "Ungraded";

pub const DEFAULT_INPUT_PATH: &str = "Data/NYC-Restaurant-Inspections.csv";
pub const DEFAULT_OUTPUT_ROOT: &str = "Output";

/// Accepted date layouts for InspectionDate, tried in order
pub const DATE_FORMATS: [&str; 2] = ["%m/%d/%Y", "%Y-%m-%d"];
