//! Save a single camera frame as PNG.

use super::Context;
use crate::capture::save_png;
use std::path::PathBuf;

/// Default file for a snapshot of `camera_id`.
pub fn snapshot_file(camera_id: u32) -> String {
    format!("captura_cam{camera_id}.png")
}

/// Captures one frame from `camera_id` and writes it as PNG.
///
/// Writes to `output` if given, otherwise to `captura_cam<id>.png` in the
/// configured output directory. Returns the path written.
///
/// # Errors
/// - If the camera is unavailable or delivers no frame
/// - If the PNG cannot be written
pub fn handle_snapshot(
    ctx: &Context,
    camera_id: u32,
    output: Option<PathBuf>,
) -> anyhow::Result<PathBuf> {
    let coordinator = ctx.coordinator();
    let path = output.unwrap_or_else(|| coordinator.output_path(&snapshot_file(camera_id)));

    let frame = coordinator.capture_still_image(camera_id)?;
    save_png(&frame, &path)?;

    println!(
        "Image from camera {} ({}x{}) saved to {}",
        camera_id,
        frame.width,
        frame.height,
        path.display()
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::FakeCamera;
    use crate::commands::testing;

    #[test]
    fn test_snapshot_writes_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = testing::context(Vec::new(), vec![(2, FakeCamera::new(4, 3))], dir.path());

        let path = handle_snapshot(&ctx, 2, None).unwrap();

        assert_eq!(path, dir.path().join("captura_cam2.png"));
        assert!(path.exists());
    }

    #[test]
    fn test_snapshot_of_missing_camera_fails() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = testing::context(Vec::new(), Vec::new(), dir.path());

        let err = handle_snapshot(&ctx, 0, Some(dir.path().join("x.png"))).unwrap_err();

        assert!(err.to_string().contains("camera 0"));
        assert!(!dir.path().join("x.png").exists());
    }
}
