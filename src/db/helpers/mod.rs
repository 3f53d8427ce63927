use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};

use crate::db::models::SessionMode;

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field}"))
}

pub fn parse_mode(value: &str) -> Result<SessionMode> {
    match value {
        "light" => Ok(SessionMode::Light),
        "standard" => Ok(SessionMode::Standard),
        "enhanced" => Ok(SessionMode::Enhanced),
        other => Err(anyhow!("unknown session mode {other}")),
    }
}

/// Stored open-question lists are JSON arrays; older or hand-edited rows may
/// hold bare text, which is read back as a single-element list.
pub fn parse_open_questions(value: &str) -> Vec<String> {
    if value.is_empty() {
        return Vec::new();
    }
    serde_json::from_str(value).unwrap_or_else(|_| vec![value.to_string()])
}
