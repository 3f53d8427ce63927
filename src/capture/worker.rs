use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use image::{codecs::jpeg::JpegEncoder, DynamicImage};
use log::{debug, error, info, warn};
use tokio::time::{Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::db::{Database, Frame};

use super::grabber::ScreenGrabber;
use super::phash::{compute_phash, exceeds_change_threshold};

const CAPTURE_TIMEOUT_SECS: u64 = 10;
const JPEG_QUALITY: u8 = 50;

/// Background sampling loop for one session. Runs until the token is
/// cancelled or a capture error ends it; the caller handles deregistration
/// after this future resolves.
pub(crate) async fn capture_loop(
    session_id: String,
    interval: Duration,
    db: Database,
    grabber: Arc<dyn ScreenGrabber>,
    session_dir: PathBuf,
    cancel_token: CancellationToken,
) {
    // First sample lands one full interval after start, not immediately.
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut last_accepted_phash: Option<String> = None;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let timestamp = Utc::now();
                let fut = sample_once(
                    &session_id,
                    timestamp,
                    &db,
                    &grabber,
                    &session_dir,
                    &mut last_accepted_phash,
                );

                match tokio::time::timeout(Duration::from_secs(CAPTURE_TIMEOUT_SECS), fut).await {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => {
                        // No restart: a fresh start request resumes capture.
                        error!("capture failed for session {session_id}, stopping worker: {err:?}");
                        break;
                    }
                    Err(_) => {
                        warn!(
                            "capture timed out (> {CAPTURE_TIMEOUT_SECS}s) for session {session_id}, stopping worker"
                        );
                        break;
                    }
                }
            }
            _ = cancel_token.cancelled() => {
                info!("capture loop for session {session_id} shutting down");
                break;
            }
        }
    }
}

async fn sample_once(
    session_id: &str,
    timestamp: DateTime<Utc>,
    db: &Database,
    grabber: &Arc<dyn ScreenGrabber>,
    session_dir: &Path,
    last_accepted_phash: &mut Option<String>,
) -> Result<()> {
    let grabber = Arc::clone(grabber);
    let rgba = tokio::task::spawn_blocking(move || grabber.grab())
        .await
        .context("screen grab worker join failed")??;

    let img = DynamicImage::ImageRgba8(rgba);
    let (phash, img) = tokio::task::spawn_blocking(move || {
        let phash = compute_phash(&img);
        (phash, img)
    })
    .await
    .context("phash worker join failed")?;

    // Compare against the last *accepted* frame, not the last sampled one:
    // a slow fade still registers once it drifts past the threshold.
    if let Some(previous) = last_accepted_phash.as_deref() {
        if !exceeds_change_threshold(previous, &phash) {
            debug!("frame unchanged for session {session_id}, skipping");
            return Ok(());
        }
    }

    let image_path = session_dir.join(format!("{}.jpg", timestamp.format("%Y%m%d_%H%M%S")));
    let path_for_encode = image_path.clone();
    tokio::task::spawn_blocking(move || write_jpeg(&img, &path_for_encode))
        .await
        .context("jpeg encode worker join failed")??;

    let frame = Frame {
        id: None,
        session_id: session_id.to_string(),
        captured_at: timestamp,
        image_path: image_path.to_string_lossy().into_owned(),
    };
    db.insert_frame(&frame)
        .await
        .context("failed to persist frame")?;

    debug!(
        "accepted frame for session {session_id} at {}",
        timestamp.to_rfc3339()
    );
    *last_accepted_phash = Some(phash);

    Ok(())
}

fn write_jpeg(img: &DynamicImage, path: &Path) -> Result<()> {
    let rgb = img.to_rgb8();
    let file = File::create(path)
        .with_context(|| format!("failed to create frame file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY)
        .encode_image(&rgb)
        .context("failed to encode frame as JPEG")?;
    writer.flush().context("failed to flush frame file")?;
    Ok(())
}
