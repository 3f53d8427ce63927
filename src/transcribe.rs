use std::path::Path;

use log::warn;

/// Audio transcription stub. Until a speech backend is wired in, every
/// session runs vision-only: the transcript is empty and the segmenter
/// grounds itself in captured frames alone.
pub fn lecture_transcript(session_capture_dir: &Path) -> String {
    warn!(
        "audio transcription unavailable for {}; continuing with captures only",
        session_capture_dir.display()
    );
    String::new()
}
