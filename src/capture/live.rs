//! Live camera preview.

use super::CaptureCoordinator;
use crate::backend::Frame;
use crate::error::Result;

/// Somewhere to show preview frames.
///
/// The coordinator polls `cancelled` once per frame, so implementations should
/// not block waiting for input.
pub trait FrameDisplay {
    fn show(&mut self, frame: &Frame, camera_id: u32) -> std::io::Result<()>;

    /// Returns true once the user asked to stop watching.
    fn cancelled(&mut self) -> std::io::Result<bool>;
}

impl CaptureCoordinator<'_> {
    /// Streams frames from `camera_id` to `display` until the user cancels or
    /// the camera stops delivering frames. Returns the number of frames shown.
    ///
    /// The camera is released before returning, including when the display
    /// fails.
    pub fn watch_live_video(&self, camera_id: u32, display: &mut dyn FrameDisplay) -> Result<u64> {
        let mut camera = self.backends.video.open(camera_id)?;
        let mut shown: u64 = 0;

        tracing::info!("Watching camera {}", camera_id);
        loop {
            let frame = match camera.read_frame() {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::warn!("Live view of camera {} ended: {}", camera_id, e);
                    break;
                }
            };

            display.show(&frame, camera_id)?;
            shown += 1;

            if display.cancelled()? {
                tracing::info!("Live view of camera {} closed by user", camera_id);
                break;
            }
        }

        Ok(shown)
    }
}
