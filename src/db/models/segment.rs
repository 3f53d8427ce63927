use serde::{Deserialize, Serialize};

/// Model-derived summary over one contiguous batch of frames.
///
/// Indices are 1-based and dense per session; the whole per-session set is
/// replaced in one transaction whenever segmentation is re-run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub id: Option<i64>,
    pub session_id: String,
    pub idx: i64,
    pub title: String,
    pub summary: String,
    pub open_questions: Vec<String>,
}
