use serde::{Deserialize, Serialize};

/// Name of the destination table.
pub const RECORDS_TABLE: &str = "records";

/// Column order and SQL types of the `records` table. The flattener's output
/// struct and the sink's DDL/INSERT statements are both built from this list.
pub const RECORD_COLUMNS: [(&str, &str); 7] = [
    ("user_id", "TEXT"),
    ("oauth_consumer_key", "TEXT"),
    ("lis_result_sourcedid", "TEXT"),
    ("lis_outcome_service_url", "TEXT"),
    ("is_correct", "BOOLEAN"),
    ("attempt_type", "TEXT"),
    ("created_at", "TIMESTAMP"),
];

/// Source field names in an API attempt object.
pub mod raw_fields {
    pub const LTI_USER_ID: &str = "lti_user_id";
    pub const IS_CORRECT: &str = "is_correct";
    pub const ATTEMPT_TYPE: &str = "attempt_type";
    pub const CREATED_AT: &str = "created_at";
    pub const PASSBACK_PARAMS: &str = "passback_params";
}

/// Fields read out of a decoded `passback_params` object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassbackParams {
    pub oauth_consumer_key: String,
    pub lis_result_sourcedid: String,
    pub lis_outcome_service_url: String,
}

/// One row of the `records` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlattenedRecord {
    pub user_id: String,
    pub oauth_consumer_key: String,
    pub lis_result_sourcedid: String,
    pub lis_outcome_service_url: String,
    pub is_correct: Option<bool>,
    pub attempt_type: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Default)]
pub struct TransformResult {
    pub records: Vec<FlattenedRecord>,
    /// Array items that were not JSON objects.
    pub skipped: usize,
    pub passback_errors: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegradedStage {
    Extract,
    Transform,
}

/// Summary of one engine pass.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub fetched: usize,
    pub flattened: usize,
    pub skipped: usize,
    pub passback_errors: usize,
    pub rows_written: u64,
    pub degraded: Option<DegradedStage>,
}

impl RunReport {
    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }
}
