use std::{collections::HashSet, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use chrono::Utc;
use log::{error, info};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    capture::{CaptureContext, CaptureRegistry, PrimaryDisplayGrabber, ScreenGrabber},
    config::{ModelConfig, ModelConfigInfo, ModelConfigStore},
    db::{Database, Segment, Session, SessionMode},
    llm::{HttpModelClient, ModelService},
    segmenter, study, transcribe,
};

/// The core's upward-facing contract: session lifecycle, capture control,
/// segmentation, and the segment-grounded study operations. Transport layers
/// (HTTP, UI) sit on top of this and own nothing themselves.
pub struct LectureService {
    db: Database,
    registry: CaptureRegistry,
    grabber: Arc<dyn ScreenGrabber>,
    model: Arc<dyn ModelService>,
    config: Arc<ModelConfigStore>,
    captures_dir: PathBuf,
    segmenting: Arc<Mutex<HashSet<String>>>,
}

impl LectureService {
    /// Production wiring: SQLite store, primary-display grabber, and the
    /// HTTP model client, all rooted under `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let config = Arc::new(ModelConfigStore::new(data_dir.join("model_config.json"))?);
        let model = Arc::new(HttpModelClient::new(Arc::clone(&config))?);
        Self::with_backends(data_dir, Arc::new(PrimaryDisplayGrabber), model, config)
    }

    /// Wiring seam for tests and alternative backends.
    pub fn with_backends(
        data_dir: impl Into<PathBuf>,
        grabber: Arc<dyn ScreenGrabber>,
        model: Arc<dyn ModelService>,
        config: Arc<ModelConfigStore>,
    ) -> Result<Self> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let db = Database::new(data_dir.join("classpilot.sqlite3"))?;

        Ok(Self {
            db,
            registry: CaptureRegistry::new(),
            grabber,
            model,
            config,
            captures_dir: data_dir.join("captures"),
            segmenting: Arc::new(Mutex::new(HashSet::new())),
        })
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Create a session and, unless the mode says otherwise, start its
    /// capture worker at the mode-adjusted interval.
    pub async fn create_session(
        &self,
        course_name: &str,
        mode: SessionMode,
        interval_secs: u64,
    ) -> Result<Session> {
        let session = Session {
            id: Uuid::new_v4().to_string(),
            course_name: course_name.to_string(),
            mode,
            created_at: Utc::now(),
        };
        self.db.insert_session(&session).await?;

        if let Some(interval) = mode.capture_interval(interval_secs) {
            let ctx = CaptureContext {
                db: self.db.clone(),
                grabber: Arc::clone(&self.grabber),
                session_dir: self.captures_dir.join(&session.id),
            };
            self.registry.start(&session.id, interval, ctx).await?;
        } else {
            info!("session {} created in light mode, capture disabled", session.id);
        }

        Ok(session)
    }

    /// Signal the session's capture worker to stop. Idempotent.
    pub async fn stop_session(&self, session_id: &str) -> Result<()> {
        self.registry.stop(session_id).await;
        Ok(())
    }

    pub async fn session(&self, session_id: &str) -> Result<Option<Session>> {
        self.db.get_session(session_id).await
    }

    pub async fn capture_active(&self, session_id: &str) -> bool {
        self.registry.is_active(session_id).await
    }

    /// Kick off a background (re)segmentation. Returns `false` without doing
    /// anything when one is already in flight for the session: the
    /// delete-and-reinsert sequence must never race itself.
    pub async fn trigger_segmentation(&self, session_id: &str) -> Result<bool> {
        {
            let mut busy = self.segmenting.lock().await;
            if !busy.insert(session_id.to_string()) {
                info!("segmentation already in flight for session {session_id}");
                return Ok(false);
            }
        }

        let db = self.db.clone();
        let model = Arc::clone(&self.model);
        let busy = Arc::clone(&self.segmenting);
        let session_dir = self.captures_dir.join(session_id);
        let session_id = session_id.to_string();

        tokio::spawn(async move {
            let transcript = transcribe::lecture_transcript(&session_dir);
            let result = segmenter::build_segments(
                &db,
                model.as_ref(),
                &session_id,
                &transcript,
                segmenter::DEFAULT_BATCH_SIZE,
            )
            .await;

            if let Err(err) = result {
                error!("segmentation failed for session {session_id}: {err:?}");
            }

            busy.lock().await.remove(&session_id);
        });

        Ok(true)
    }

    pub async fn list_segments(&self, session_id: &str) -> Result<Vec<Segment>> {
        self.db.get_segments_for_session(session_id).await
    }

    pub async fn ask(&self, session_id: &str, question: &str) -> Result<String> {
        study::answer_question(&self.db, self.model.as_ref(), session_id, question).await
    }

    pub async fn generate_quiz(&self, session_id: &str) -> Result<Vec<study::QuizItem>> {
        study::build_quiz(&self.db, self.model.as_ref(), session_id).await
    }

    pub async fn generate_report(&self, session_id: &str) -> Result<String> {
        study::build_report(&self.db, self.model.as_ref(), session_id).await
    }

    pub async fn generate_recommendations(&self, session_id: &str) -> Result<String> {
        study::build_recommendations(&self.db, self.model.as_ref(), session_id).await
    }

    pub fn model_config(&self) -> ModelConfigInfo {
        self.config.info()
    }

    pub fn set_model_config(&self, base_url: &str, api_key: &str, model: &str) -> Result<()> {
        self.config.update(ModelConfig {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }
}
