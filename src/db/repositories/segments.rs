use anyhow::{Context, Result};
use rusqlite::{params, Row};

use crate::db::{connection::Database, helpers::parse_open_questions, models::Segment};

fn row_to_segment(row: &Row) -> Result<Segment> {
    let open_questions: String = row.get("open_questions")?;

    Ok(Segment {
        id: row.get("id")?,
        session_id: row.get("session_id")?,
        idx: row.get("idx")?,
        title: row.get("title")?,
        summary: row.get("summary")?,
        open_questions: parse_open_questions(&open_questions),
    })
}

impl Database {
    /// Replace the session's whole segment set in one transaction, so readers
    /// never observe a partially rebuilt segmentation.
    pub async fn replace_segments(&self, session_id: &str, segments: &[Segment]) -> Result<()> {
        let session_id = session_id.to_string();
        let segments = segments.to_vec();
        self.execute(move |conn| {
            let tx = conn.transaction()?;

            tx.execute(
                "DELETE FROM segments WHERE session_id = ?1",
                params![session_id],
            )?;

            for segment in &segments {
                let open_questions = serde_json::to_string(&segment.open_questions)
                    .context("failed to serialize open questions")?;
                tx.execute(
                    "INSERT INTO segments (session_id, idx, title, summary, open_questions)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        segment.session_id,
                        segment.idx,
                        segment.title,
                        segment.summary,
                        open_questions,
                    ],
                )?;
            }

            tx.commit()?;
            Ok(())
        })
        .await
    }

    /// All segments for a session ordered by their 1-based index.
    pub async fn get_segments_for_session(&self, session_id: &str) -> Result<Vec<Segment>> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, session_id, idx, title, summary, open_questions
                 FROM segments
                 WHERE session_id = ?1
                 ORDER BY idx ASC",
            )?;

            let mut rows = stmt.query(params![session_id])?;
            let mut segments = Vec::new();
            while let Some(row) = rows.next()? {
                segments.push(row_to_segment(row)?);
            }

            Ok(segments)
        })
        .await
    }
}
