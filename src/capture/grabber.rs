use anyhow::{Context, Result};
use image::RgbaImage;
use xcap::Monitor;

/// Screen capture seam. The worker only ever needs raw pixels of the primary
/// display; tests substitute scripted implementations.
pub trait ScreenGrabber: Send + Sync {
    fn grab(&self) -> Result<RgbaImage>;
}

/// Captures the primary monitor (or the first one when no monitor reports
/// itself as primary).
pub struct PrimaryDisplayGrabber;

impl ScreenGrabber for PrimaryDisplayGrabber {
    fn grab(&self) -> Result<RgbaImage> {
        let monitors = Monitor::all().context("failed to enumerate displays")?;
        let monitor = monitors
            .iter()
            .find(|monitor| monitor.is_primary())
            .or_else(|| monitors.first())
            .context("no display available to capture")?;

        let shot = monitor
            .capture_image()
            .context("failed to capture the primary display")?;

        // Rebuild through from_raw so the rest of the crate only ever sees
        // our own `image` types.
        let (width, height) = (shot.width(), shot.height());
        RgbaImage::from_raw(width, height, shot.into_raw())
            .context("captured image had an unexpected buffer size")
    }
}
