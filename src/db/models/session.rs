//! Session data model.
//!
//! A session is one lecture-capture run. Rows are immutable after creation;
//! the capture mode decides whether (and how often) the screen is sampled.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    Light,
    Standard,
    Enhanced,
}

impl SessionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionMode::Light => "light",
            SessionMode::Standard => "standard",
            SessionMode::Enhanced => "enhanced",
        }
    }

    /// Effective sampling interval for a caller-requested interval, or `None`
    /// when this mode never captures. Standard mode floors the request at 5s;
    /// enhanced mode clamps it into [3s, 15s].
    pub fn capture_interval(&self, requested_secs: u64) -> Option<Duration> {
        let secs = match self {
            SessionMode::Light => return None,
            SessionMode::Standard => requested_secs.max(5),
            SessionMode::Enhanced => requested_secs.clamp(3, 15),
        };
        Some(Duration::from_secs(secs))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub course_name: String,
    pub mode: SessionMode,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn light_mode_never_captures() {
        assert_eq!(SessionMode::Light.capture_interval(30), None);
    }

    #[test]
    fn standard_mode_floors_interval_at_five_seconds() {
        assert_eq!(
            SessionMode::Standard.capture_interval(1),
            Some(Duration::from_secs(5))
        );
        assert_eq!(
            SessionMode::Standard.capture_interval(30),
            Some(Duration::from_secs(30))
        );
    }

    #[test]
    fn enhanced_mode_clamps_interval() {
        assert_eq!(
            SessionMode::Enhanced.capture_interval(1),
            Some(Duration::from_secs(3))
        );
        assert_eq!(
            SessionMode::Enhanced.capture_interval(30),
            Some(Duration::from_secs(15))
        );
        assert_eq!(
            SessionMode::Enhanced.capture_interval(10),
            Some(Duration::from_secs(10))
        );
    }
}
