pub mod grabber;
pub mod phash;
pub mod registry;
mod worker;

pub use grabber::{PrimaryDisplayGrabber, ScreenGrabber};
pub use registry::{CaptureContext, CaptureRegistry};
