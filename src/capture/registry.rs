use std::{collections::HashMap, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use log::{debug, info};
use tokio::sync::Mutex;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::db::Database;

use super::grabber::ScreenGrabber;
use super::worker::capture_loop;

/// Everything a capture worker needs besides its session id and interval.
pub struct CaptureContext {
    pub db: Database,
    pub grabber: Arc<dyn ScreenGrabber>,
    pub session_dir: PathBuf,
}

struct WorkerEntry {
    worker_id: Uuid,
    cancel_token: CancellationToken,
}

/// Tracks at most one capture worker per session id.
///
/// The map is the only shared mutable state in the pipeline. Workers that end
/// on their own (capture failure) remove their own entry, keyed by worker id
/// so a dying worker can never evict a successor started after it.
#[derive(Clone, Default)]
pub struct CaptureRegistry {
    workers: Arc<Mutex<HashMap<String, WorkerEntry>>>,
}

impl CaptureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a worker for the session; a second call for the same id while
    /// one is registered is a no-op.
    pub async fn start(
        &self,
        session_id: &str,
        interval: Duration,
        ctx: CaptureContext,
    ) -> Result<()> {
        let mut workers = self.workers.lock().await;
        if workers.contains_key(session_id) {
            debug!("capture already active for session {session_id}");
            return Ok(());
        }

        std::fs::create_dir_all(&ctx.session_dir).with_context(|| {
            format!(
                "failed to create capture directory {}",
                ctx.session_dir.display()
            )
        })?;

        let worker_id = Uuid::new_v4();
        let cancel_token = CancellationToken::new();
        workers.insert(
            session_id.to_string(),
            WorkerEntry {
                worker_id,
                cancel_token: cancel_token.clone(),
            },
        );

        let map = Arc::clone(&self.workers);
        let session_id = session_id.to_string();
        info!("capture started for session {session_id} at {interval:?} interval");
        tokio::spawn(async move {
            capture_loop(
                session_id.clone(),
                interval,
                ctx.db,
                ctx.grabber,
                ctx.session_dir,
                cancel_token,
            )
            .await;

            let mut workers = map.lock().await;
            if workers
                .get(&session_id)
                .is_some_and(|entry| entry.worker_id == worker_id)
            {
                workers.remove(&session_id);
            }
        });

        Ok(())
    }

    /// Signal the session's worker to stop. Cooperative: the in-flight sample
    /// may finish, but no new tick starts. No-op when nothing is registered.
    pub async fn stop(&self, session_id: &str) {
        match self.workers.lock().await.remove(session_id) {
            Some(entry) => {
                entry.cancel_token.cancel();
                info!("capture stop signalled for session {session_id}");
            }
            None => debug!("no capture worker registered for session {session_id}"),
        }
    }

    pub async fn is_active(&self, session_id: &str) -> bool {
        self.workers.lock().await.contains_key(session_id)
    }

    pub async fn active_count(&self) -> usize {
        self.workers.lock().await.len()
    }
}
