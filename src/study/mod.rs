//! Segment-grounded study operations: Q&A, quizzes, reports, and
//! recommendations. Every operation reads the persisted segments, builds one
//! grounding context string, and issues exactly one model call — or returns
//! a sentinel when nothing has been segmented yet.

use anyhow::{Context, Result};
use chrono::Utc;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::db::{Database, QuizRecord, Segment};
use crate::llm::{ChatMessage, ModelService};

/// Returned by the free-text operations when no segments exist yet. A cheap
/// short-circuit: no model call is made.
pub const NOT_READY: &str = "No lecture summary is available yet. Run segmentation once some \
frames have been captured, then try again.";

const ANSWER_SYSTEM_PROMPT: &str = "You are a patient teaching assistant. Answer using only the \
lecture notes provided. If the notes do not cover the question, say so honestly instead of \
inventing an answer.";

const QUIZ_SYSTEM_PROMPT: &str = "You are preparing a short review quiz. Based on the lecture \
content provided, reply with a JSON array of 2-5 multiple-choice questions. Each element must \
contain \"question\", \"options\" (exactly 4 strings), \"correct_index\" (an integer from 0 to \
3), and \"explanation\".";

const REPORT_SYSTEM_PROMPT: &str = "Write a study report for the student based on this lecture \
outline. Structure it with the markdown headings \"Core Content\", \"Common Points of \
Confusion\", and \"Suggested Practice\".";

const RECOMMENDATIONS_SYSTEM_PROMPT: &str = "You are a study-planning advisor. Based on this \
lecture outline, recommend follow-up material: topics worth exploring next, the kinds of \
resources to look for, and how to review before the next class. Reply as a markdown list.";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuizItem {
    pub question: String,
    pub options: Vec<String>,
    pub correct_index: u32,
    #[serde(default)]
    pub explanation: String,
}

/// Answer a free-form question grounded in the session's segment summaries.
pub async fn answer_question(
    db: &Database,
    model: &dyn ModelService,
    session_id: &str,
    question: &str,
) -> Result<String> {
    let segments = db.get_segments_for_session(session_id).await?;
    if segments.is_empty() {
        return Ok(NOT_READY.to_string());
    }

    let context = grounding_context(&segments);
    let messages = vec![
        ChatMessage::system(ANSWER_SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "Lecture notes:\n\n{context}\n\nStudent question: {question}"
        )),
    ];

    let answer = model.complete(&messages, 512, 0.2).await?;
    Ok(answer)
}

/// Generate a short multiple-choice quiz over the session's segments.
///
/// Malformed model output degrades to a single sentinel item so callers
/// always receive a well-formed quiz; both outcomes are persisted as an
/// audit record. An unsegmented session yields an empty list and no call.
pub async fn build_quiz(
    db: &Database,
    model: &dyn ModelService,
    session_id: &str,
) -> Result<Vec<QuizItem>> {
    let segments = db.get_segments_for_session(session_id).await?;
    if segments.is_empty() {
        return Ok(Vec::new());
    }

    let context = grounding_context(&segments);
    let messages = vec![
        ChatMessage::system(QUIZ_SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "Lecture content:\n{context}\n\nWrite 2-5 multiple-choice questions."
        )),
    ];

    let raw = model.complete(&messages, 800, 0.4).await?;
    let items = decode_quiz(&raw);

    let record = QuizRecord {
        id: None,
        session_id: session_id.to_string(),
        created_at: Utc::now(),
        content: serde_json::to_string(&items).context("failed to serialize quiz items")?,
    };
    db.insert_quiz(&record).await?;

    Ok(items)
}

/// One structured report over the whole lecture outline. Not persisted.
pub async fn build_report(
    db: &Database,
    model: &dyn ModelService,
    session_id: &str,
) -> Result<String> {
    grounded_completion(db, model, session_id, REPORT_SYSTEM_PROMPT, 1200, 0.3).await
}

/// Free-form study recommendations over the outline. Not persisted.
pub async fn build_recommendations(
    db: &Database,
    model: &dyn ModelService,
    session_id: &str,
) -> Result<String> {
    grounded_completion(db, model, session_id, RECOMMENDATIONS_SYSTEM_PROMPT, 800, 0.4).await
}

async fn grounded_completion(
    db: &Database,
    model: &dyn ModelService,
    session_id: &str,
    system_prompt: &str,
    max_output_tokens: u32,
    temperature: f32,
) -> Result<String> {
    let segments = db.get_segments_for_session(session_id).await?;
    if segments.is_empty() {
        return Ok(NOT_READY.to_string());
    }

    let messages = vec![
        ChatMessage::system(system_prompt),
        ChatMessage::user(outline_context(&segments)),
    ];

    let text = model
        .complete(&messages, max_output_tokens, temperature)
        .await?;
    Ok(text)
}

fn grounding_context(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|segment| format!("## {}\n{}", segment.title, segment.summary))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn outline_context(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|segment| format!("{}. {}: {}", segment.idx, segment.title, segment.summary))
        .collect::<Vec<_>>()
        .join("\n")
}

fn decode_quiz(raw: &str) -> Vec<QuizItem> {
    match serde_json::from_str::<Vec<QuizItem>>(raw) {
        Ok(items) if !items.is_empty() => items,
        Ok(_) => fallback_quiz(),
        Err(err) => {
            warn!("quiz output was not structured ({err}), using fallback item");
            fallback_quiz()
        }
    }
}

fn fallback_quiz() -> Vec<QuizItem> {
    vec![QuizItem {
        question: "The model did not return a structured quiz. Try again shortly.".to_string(),
        options: vec!["Could not parse the model output".to_string()],
        correct_index: 0,
        explanation: String::new(),
    }]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(idx: i64, title: &str, summary: &str) -> Segment {
        Segment {
            id: None,
            session_id: "s".into(),
            idx,
            title: title.into(),
            summary: summary.into(),
            open_questions: Vec::new(),
        }
    }

    #[test]
    fn grounding_context_joins_with_blank_lines() {
        let segments = vec![segment(1, "Intro", "What the course covers."), segment(2, "Detail", "The hard part.")];
        assert_eq!(
            grounding_context(&segments),
            "## Intro\nWhat the course covers.\n\n## Detail\nThe hard part."
        );
    }

    #[test]
    fn outline_context_numbers_segments() {
        let segments = vec![segment(1, "Intro", "A."), segment(2, "Detail", "B.")];
        assert_eq!(outline_context(&segments), "1. Intro: A.\n2. Detail: B.");
    }

    #[test]
    fn decode_quiz_accepts_structured_items() {
        let raw = r#"[{"question":"Q?","options":["a","b","c","d"],"correct_index":2,"explanation":"because"}]"#;
        let items = decode_quiz(raw);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].correct_index, 2);
        assert_eq!(items[0].options.len(), 4);
    }

    #[test]
    fn decode_quiz_falls_back_on_malformed_output() {
        let items = decode_quiz("I cannot produce JSON today.");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].options.len(), 1);
        assert_eq!(items[0].correct_index, 0);
    }

    #[test]
    fn decode_quiz_treats_empty_list_as_malformed() {
        let items = decode_quiz("[]");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].correct_index, 0);
    }
}
