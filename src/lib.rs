pub mod capture;
pub mod config;
pub mod db;
pub mod llm;
pub mod segmenter;
pub mod service;
pub mod study;
pub mod transcribe;

pub use db::{Database, Frame, QuizRecord, Segment, Session, SessionMode};
pub use service::LectureService;

/// Initialize logging from RUST_LOG. Safe to call more than once; later
/// calls are ignored.
pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .try_init();
}
