//! Single-frame capture.

use super::CaptureCoordinator;
use crate::backend::{Frame, PixelOrder};
use crate::error::{CaptureError, Result};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

impl CaptureCoordinator<'_> {
    /// Opens the camera, reads one frame and releases the camera.
    ///
    /// The returned frame is always in RGB order.
    pub fn capture_still_image(&self, camera_id: u32) -> Result<Frame> {
        let frame = {
            let mut camera = self.backends.video.open(camera_id)?;
            camera
                .read_frame()
                .map_err(|e| CaptureError::camera(camera_id, format!("could not capture image: {e}")))?
        };

        tracing::info!(
            "Captured {}x{} image from camera {}",
            frame.width,
            frame.height,
            camera_id
        );
        Ok(frame.into_rgb())
    }
}

/// Writes a frame as an 8-bit RGB PNG.
pub fn save_png(frame: &Frame, path: &Path) -> Result<()> {
    let rgb;
    let frame = if frame.order == PixelOrder::Rgb {
        frame
    } else {
        rgb = frame.clone().into_rgb();
        &rgb
    };

    let file = File::create(path).map_err(|e| CaptureError::write(path, e))?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), frame.width, frame.height);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);

    let mut writer = encoder
        .write_header()
        .map_err(|e| CaptureError::write(path, e))?;
    writer
        .write_image_data(&frame.data)
        .map_err(|e| CaptureError::write(path, e))?;
    writer.finish().map_err(|e| CaptureError::write(path, e))?;

    tracing::info!("Image saved: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::{FakeAudioSystem, FakeCamera, FakeVideoSink, FakeVideoSystem};
    use crate::backend::Backends;

    fn backends_with(video: FakeVideoSystem) -> Backends {
        Backends {
            audio: Box::new(FakeAudioSystem::default()),
            video: Box::new(video),
            sink: Box::new(FakeVideoSink::default()),
        }
    }

    #[test]
    fn test_still_image_converts_bgr_to_rgb() {
        let backends = backends_with(FakeVideoSystem::with_cameras([(
            1,
            FakeCamera::new(4, 2).order(PixelOrder::Bgr),
        )]));
        let coordinator = CaptureCoordinator::new(&backends, ".");

        let frame = coordinator.capture_still_image(1).unwrap();

        assert_eq!(frame.order, PixelOrder::Rgb);
        assert_eq!((frame.width, frame.height), (4, 2));
        assert_eq!(frame.rgb_at(0, 0), [30, 20, 10]);
    }

    #[test]
    fn test_still_image_failures_release_camera() {
        let video = FakeVideoSystem::with_cameras([(0, FakeCamera::new(4, 2).frames(0))]);
        let tracker = video.tracker.clone();
        let backends = backends_with(video);
        let coordinator = CaptureCoordinator::new(&backends, ".");

        let no_frame = coordinator.capture_still_image(0).unwrap_err();
        assert!(matches!(no_frame, CaptureError::DeviceUnavailable { .. }));

        let missing = coordinator.capture_still_image(5).unwrap_err();
        assert!(matches!(missing, CaptureError::DeviceUnavailable { .. }));

        assert_eq!(tracker.live(), 0);
        assert_eq!(tracker.peak(), 1);
    }

    #[test]
    fn test_save_png_round_trips_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("still.png");
        let frame = Frame {
            width: 2,
            height: 1,
            order: PixelOrder::Bgr,
            data: vec![1, 2, 3, 4, 5, 6],
        };

        save_png(&frame, &path).unwrap();

        let decoder = png::Decoder::new(File::open(&path).unwrap());
        let mut reader = decoder.read_info().unwrap();
        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buf).unwrap();
        assert_eq!((info.width, info.height), (2, 1));
        assert_eq!(info.color_type, png::ColorType::Rgb);
        assert_eq!(&buf[..info.buffer_size()], &[3, 2, 1, 6, 5, 4]);
    }
}
