pub mod frame;
pub mod quiz;
pub mod segment;
pub mod session;

pub use frame::Frame;
pub use quiz::QuizRecord;
pub use segment::Segment;
pub use session::{Session, SessionMode};
