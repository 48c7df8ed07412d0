use std::sync::Arc;

use anyhow::Result;
use snaplate_types::CaptureRegion;

use crate::bitmap::Bitmap;

/// Source of screen pixels for OCR
pub trait ScreenCapture: Send + Sync {
    /// Capture `region`, or the whole primary monitor when `None`
    fn capture(&self, region: Option<CaptureRegion>) -> Result<Bitmap>;
}

/// Capture for targets without a screen grabber
pub struct UnsupportedCapture;

impl ScreenCapture for UnsupportedCapture {
    fn capture(&self, _region: Option<CaptureRegion>) -> Result<Bitmap> {
        anyhow::bail!("screen capture is only supported on Windows")
    }
}

/// Placement of one monitor on the virtual desktop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorBounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub primary: bool,
}

impl MonitorBounds {
    fn contains(&self, region: &CaptureRegion) -> bool {
        let (left, top) = (i64::from(region.x), i64::from(region.y));
        let right = left + i64::from(region.width);
        let bottom = top + i64::from(region.height);
        left >= i64::from(self.x)
            && top >= i64::from(self.y)
            && right <= i64::from(self.x) + i64::from(self.width)
            && bottom <= i64::from(self.y) + i64::from(self.height)
    }
}

/// Index of the monitor to grab: the one fully containing `region`, else the
/// primary one, else the first.
pub fn select_monitor(monitors: &[MonitorBounds], region: Option<&CaptureRegion>) -> Option<usize> {
    region
        .and_then(|region| monitors.iter().position(|m| m.contains(region)))
        .or_else(|| monitors.iter().position(|m| m.primary))
        .or_else(|| (!monitors.is_empty()).then_some(0))
}

/// Screen grabber of the current target
pub fn platform_capture() -> Arc<dyn ScreenCapture> {
    #[cfg(windows)]
    return Arc::new(XcapCapture);
    #[cfg(not(windows))]
    return Arc::new(UnsupportedCapture);
}

#[cfg(windows)]
pub use self::xcap_capture::XcapCapture;

#[cfg(windows)]
mod xcap_capture {
    use anyhow::{Context, Result};
    use snaplate_types::CaptureRegion;
    use xcap::Monitor;

    use super::{MonitorBounds, ScreenCapture, select_monitor};
    use crate::bitmap::Bitmap;

    /// Monitor capture through xcap, cropped in memory
    pub struct XcapCapture;

    impl ScreenCapture for XcapCapture {
        fn capture(&self, region: Option<CaptureRegion>) -> Result<Bitmap> {
            let monitors = Monitor::all().context("Failed to get monitors")?;
            let bounds: Vec<MonitorBounds> = monitors
                .iter()
                .map(|m| MonitorBounds {
                    x: m.x(),
                    y: m.y(),
                    width: m.width(),
                    height: m.height(),
                    primary: m.is_primary(),
                })
                .collect();

            let index = select_monitor(&bounds, region.as_ref()).context("No monitor found")?;
            let monitor = &monitors[index];
            let image = monitor.capture_image().context("Failed to capture screen")?;

            let Some(region) = region else {
                return Ok(Bitmap::try_from(image)?);
            };

            let x = region.x.saturating_sub(monitor.x()).max(0) as u32;
            let y = region.y.saturating_sub(monitor.y()).max(0) as u32;
            let cropped =
                xcap::image::imageops::crop_imm(&image, x, y, region.width, region.height).to_image();

            Ok(Bitmap::try_from(cropped)?)
        }
    }
}
