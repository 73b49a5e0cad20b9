//! Camera access through nokhwa.

use super::{Frame, PixelOrder, VideoSource, VideoSystem};
use crate::error::{CaptureError, Result};
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;

/// Opens cameras by ordinal index using the platform's native backend.
#[derive(Debug, Default)]
pub struct NokhwaVideoSystem;

impl NokhwaVideoSystem {
    pub fn new() -> Self {
        Self
    }
}

impl VideoSystem for NokhwaVideoSystem {
    fn open(&self, index: u32) -> Result<Box<dyn VideoSource>> {
        let format = RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);

        let mut camera = Camera::new(CameraIndex::Index(index), format)
            .map_err(|e| CaptureError::camera(index, format!("failed to open: {e}")))?;

        camera
            .open_stream()
            .map_err(|e| CaptureError::camera(index, format!("failed to start stream: {e}")))?;

        let camera_format = camera.camera_format();
        tracing::debug!(
            "Camera {} opened: {}x{} @ {}fps, format={:?}",
            index,
            camera_format.resolution().width(),
            camera_format.resolution().height(),
            camera_format.frame_rate(),
            camera_format.format()
        );

        Ok(Box::new(NokhwaSource { index, camera }))
    }
}

struct NokhwaSource {
    index: u32,
    camera: Camera,
}

impl VideoSource for NokhwaSource {
    fn resolution(&self) -> (u32, u32) {
        let resolution = self.camera.camera_format().resolution();
        (resolution.width(), resolution.height())
    }

    fn fps(&self) -> f64 {
        self.camera.camera_format().frame_rate() as f64
    }

    fn read_frame(&mut self) -> Result<Frame> {
        let buffer = self
            .camera
            .frame()
            .map_err(|e| CaptureError::camera(self.index, format!("frame read failed: {e}")))?;

        let image = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| CaptureError::camera(self.index, format!("frame decode failed: {e}")))?;

        Ok(Frame {
            width: image.width(),
            height: image.height(),
            order: PixelOrder::Rgb,
            data: image.into_raw(),
        })
    }
}

impl Drop for NokhwaSource {
    fn drop(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            tracing::warn!("Error stopping camera {} stream: {}", self.index, e);
        }
        tracing::debug!("Camera {} released", self.index);
    }
}
