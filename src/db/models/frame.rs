use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One accepted screen sample. The image bytes live on disk; the row keeps
/// the path plus the capture time. Rows are append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub id: Option<i64>,
    pub session_id: String,
    pub captured_at: DateTime<Utc>,
    pub image_path: String,
}
