use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Append-only audit row written once per quiz-generation call. Never read
/// back by the pipeline itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizRecord {
    pub id: Option<i64>,
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub content: String,
}
