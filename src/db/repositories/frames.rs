use anyhow::Result;
use rusqlite::{params, Row};

use crate::db::{connection::Database, helpers::parse_datetime, models::Frame};

fn row_to_frame(row: &Row) -> Result<Frame> {
    let captured_at: String = row.get("captured_at")?;

    Ok(Frame {
        id: row.get("id")?,
        session_id: row.get("session_id")?,
        captured_at: parse_datetime(&captured_at, "captured_at")?,
        image_path: row.get("image_path")?,
    })
}

impl Database {
    pub async fn insert_frame(&self, frame: &Frame) -> Result<()> {
        let record = frame.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO frames (session_id, captured_at, image_path)
                 VALUES (?1, ?2, ?3)",
                params![
                    record.session_id,
                    record.captured_at.to_rfc3339(),
                    record.image_path,
                ],
            )?;
            Ok(())
        })
        .await
    }

    /// All frames for a session, oldest first. The rowid breaks ties between
    /// captures that land on the same second.
    pub async fn get_frames_for_session(&self, session_id: &str) -> Result<Vec<Frame>> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, session_id, captured_at, image_path
                 FROM frames
                 WHERE session_id = ?1
                 ORDER BY captured_at ASC, id ASC",
            )?;

            let mut rows = stmt.query(params![session_id])?;
            let mut frames = Vec::new();
            while let Some(row) = rows.next()? {
                frames.push(row_to_frame(row)?);
            }

            Ok(frames)
        })
        .await
    }
}
