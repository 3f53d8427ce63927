use anyhow::Result;
use rusqlite::{params, Row};

use crate::db::{connection::Database, helpers::parse_datetime, models::QuizRecord};

fn row_to_quiz(row: &Row) -> Result<QuizRecord> {
    let created_at: String = row.get("created_at")?;

    Ok(QuizRecord {
        id: row.get("id")?,
        session_id: row.get("session_id")?,
        created_at: parse_datetime(&created_at, "created_at")?,
        content: row.get("content")?,
    })
}

impl Database {
    pub async fn insert_quiz(&self, quiz: &QuizRecord) -> Result<()> {
        let record = quiz.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO quizzes (session_id, created_at, content)
                 VALUES (?1, ?2, ?3)",
                params![
                    record.session_id,
                    record.created_at.to_rfc3339(),
                    record.content,
                ],
            )?;
            Ok(())
        })
        .await
    }

    pub async fn get_quizzes_for_session(&self, session_id: &str) -> Result<Vec<QuizRecord>> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, session_id, created_at, content
                 FROM quizzes
                 WHERE session_id = ?1
                 ORDER BY created_at ASC",
            )?;

            let mut rows = stmt.query(params![session_id])?;
            let mut quizzes = Vec::new();
            while let Some(row) = rows.next()? {
                quizzes.push(row_to_quiz(row)?);
            }

            Ok(quizzes)
        })
        .await
    }
}
