//! Turns a session's ordered frames into model-summarized segments.
//!
//! Frames are batched, each batch becomes one multi-image model call, and the
//! decoded outlines replace the session's previous segmentation in a single
//! transaction once every batch has resolved.

use anyhow::{Context, Result};
use log::{info, warn};
use serde_json::Value;

use crate::db::{Database, Frame, Segment};
use crate::llm::{ChatMessage, ContentPart, ModelService};

pub const DEFAULT_BATCH_SIZE: usize = 6;

const MAX_OPEN_QUESTIONS: usize = 3;
const SEGMENT_MAX_TOKENS: u32 = 800;
const SEGMENT_TEMPERATURE: f32 = 0.2;

const SEGMENT_SYSTEM_PROMPT: &str = "You are a teaching assistant reviewing \
consecutive screen captures from one stretch of a lecture. Work out what was \
taught and reply with a JSON object containing \"title\" (a short section \
heading), \"summary\" (a markdown paragraph covering the key points), and \
\"open_questions\" (a list of up to three questions a student might still \
have).";

/// What one model call decodes into. `decode` never fails: malformed output
/// degrades to a raw-text segment instead of blocking the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentOutline {
    pub title: String,
    pub summary: String,
    pub open_questions: Vec<String>,
}

impl SegmentOutline {
    pub fn decode(idx: usize, raw: &str) -> Self {
        let fallback_title = || format!("Segment {idx}");

        let Ok(value) = serde_json::from_str::<Value>(raw) else {
            return Self {
                title: fallback_title(),
                summary: raw.to_string(),
                open_questions: Vec::new(),
            };
        };
        let Some(object) = value.as_object() else {
            return Self {
                title: fallback_title(),
                summary: raw.to_string(),
                open_questions: Vec::new(),
            };
        };

        let title = object
            .get("title")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(fallback_title);
        let summary = object
            .get("summary")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| raw.to_string());
        let open_questions = match object.get("open_questions") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .unwrap_or_else(|| item.to_string())
                })
                .take(MAX_OPEN_QUESTIONS)
                .collect(),
            Some(other) => vec![other
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| other.to_string())],
        };

        Self {
            title,
            summary,
            open_questions,
        }
    }
}

/// Rebuild the session's segmentation from its captured frames.
///
/// No frames means no-op: an empty capture never wipes a previously valid
/// segmentation. A model failure mid-run aborts before any row is touched,
/// so the previous segment set stays intact. Returns the new segment count.
pub async fn build_segments(
    db: &Database,
    model: &dyn ModelService,
    session_id: &str,
    transcript: &str,
    batch_size: usize,
) -> Result<usize> {
    let frames = db.get_frames_for_session(session_id).await?;
    if frames.is_empty() {
        info!("no frames captured for session {session_id}, leaving segments untouched");
        return Ok(0);
    }

    let mut segments = Vec::with_capacity(frames.len().div_ceil(batch_size));
    for (i, batch) in frames.chunks(batch_size).enumerate() {
        let idx = i + 1;
        let messages = batch_messages(transcript, batch);
        let raw = model
            .complete(&messages, SEGMENT_MAX_TOKENS, SEGMENT_TEMPERATURE)
            .await
            .with_context(|| format!("summarization failed for batch {idx}"))?;

        let outline = SegmentOutline::decode(idx, &raw);
        segments.push(Segment {
            id: None,
            session_id: session_id.to_string(),
            idx: idx as i64,
            title: outline.title,
            summary: outline.summary,
            open_questions: outline.open_questions,
        });
    }

    db.replace_segments(session_id, &segments).await?;
    info!(
        "segmented session {session_id}: {} frames into {} segments",
        frames.len(),
        segments.len()
    );

    Ok(segments.len())
}

fn batch_messages(transcript: &str, batch: &[Frame]) -> Vec<ChatMessage> {
    let mut parts = vec![ContentPart::text(
        "Summarize this stretch of the lecture from the captures below.",
    )];
    if !transcript.is_empty() {
        parts.push(ContentPart::text(format!(
            "Lecture transcript:\n{transcript}"
        )));
    }

    for frame in batch {
        match std::fs::read(&frame.image_path) {
            Ok(bytes) => parts.push(ContentPart::inline_jpeg(&bytes)),
            Err(err) => warn!("skipping unreadable frame {}: {err}", frame.image_path),
        }
    }

    vec![
        ChatMessage::system(SEGMENT_SYSTEM_PROMPT),
        ChatMessage::user_parts(parts),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_accepts_well_formed_output() {
        let raw = r#"{"title":"Cache hierarchies","summary":"L1 vs L2 tradeoffs.","open_questions":["Why is L1 split?"]}"#;
        let outline = SegmentOutline::decode(3, raw);
        assert_eq!(outline.title, "Cache hierarchies");
        assert_eq!(outline.summary, "L1 vs L2 tradeoffs.");
        assert_eq!(outline.open_questions, vec!["Why is L1 split?"]);
    }

    #[test]
    fn decode_falls_back_on_non_json_output() {
        let outline = SegmentOutline::decode(2, "The lecture covered sorting.");
        assert_eq!(outline.title, "Segment 2");
        assert_eq!(outline.summary, "The lecture covered sorting.");
        assert!(outline.open_questions.is_empty());
    }

    #[test]
    fn decode_fills_in_missing_keys() {
        let outline = SegmentOutline::decode(1, r#"{"summary":"Only a summary."}"#);
        assert_eq!(outline.title, "Segment 1");
        assert_eq!(outline.summary, "Only a summary.");
        assert!(outline.open_questions.is_empty());
    }

    #[test]
    fn decode_coerces_non_list_open_questions() {
        let outline =
            SegmentOutline::decode(1, r#"{"title":"T","summary":"S","open_questions":"one?"}"#);
        assert_eq!(outline.open_questions, vec!["one?"]);
    }

    #[test]
    fn decode_caps_open_questions_at_three() {
        let outline = SegmentOutline::decode(
            1,
            r#"{"title":"T","summary":"S","open_questions":["a","b","c","d","e"]}"#,
        );
        assert_eq!(outline.open_questions.len(), 3);
    }
}
