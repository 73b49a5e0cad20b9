//! Record a discovered camera/microphone pair.

use super::Context;
use crate::capture::{audio_only_file, pair_base_name, CaptureCoordinator, CaptureResult};
use crate::devices::DevicePair;
use std::path::PathBuf;

/// What a pair recording produced.
#[derive(Debug, Clone, PartialEq)]
pub enum PairRecording {
    /// The pair has a camera: video plus audio
    AudioVideo(CaptureResult),
    /// The pair has no camera: audio only
    AudioOnly(PathBuf),
}

/// Records the pair at 1-based position `number`.
///
/// # Errors
/// - If discovery has no pair at that position
/// - If the camera or microphone cannot be opened
pub fn handle_record(
    ctx: &Context,
    number: usize,
    duration: Option<f64>,
) -> anyhow::Result<PairRecording> {
    let inventory = ctx.discover();
    let pair = inventory.pair(number).ok_or_else(|| {
        anyhow::anyhow!(
            "No device pair #{number} ({} pair(s) found). Run 'camic list-devices' to see them.",
            inventory.pairs().len()
        )
    })?;

    let duration = ctx.duration(duration);
    println!("Recording device #{number} for {duration} seconds...");
    let recording = record_pair(&ctx.coordinator(), pair, number, duration)?;
    println!("{}", describe(&recording));
    Ok(recording)
}

/// Records one pair: audio+video when it has a camera, audio only otherwise.
pub fn record_pair(
    coordinator: &CaptureCoordinator<'_>,
    pair: &DevicePair,
    number: usize,
    duration: f64,
) -> anyhow::Result<PairRecording> {
    let mic_id = pair.microphone.id;

    match &pair.camera {
        Some(camera) => {
            tracing::info!(
                "Recording device #{}: camera {} + microphone {}",
                number,
                camera.id,
                mic_id
            );
            let result = coordinator.capture_video_with_audio(
                camera.id,
                mic_id,
                duration,
                &pair_base_name(number),
            )?;
            Ok(PairRecording::AudioVideo(result))
        }
        None => {
            tracing::info!("Device #{} has no camera; recording audio only", number);
            let output = coordinator.output_path(&audio_only_file(mic_id));
            let path = coordinator.capture_audio(mic_id, duration, Some(&output))?;
            Ok(PairRecording::AudioOnly(path))
        }
    }
}

/// One-line summary of a pair recording for the terminal.
pub fn describe(recording: &PairRecording) -> String {
    match recording {
        PairRecording::AudioOnly(path) => format!("Audio saved to {}", path.display()),
        PairRecording::AudioVideo(result) => {
            let video = result
                .video_path
                .as_ref()
                .map_or_else(|| "failed".to_string(), |p| p.display().to_string());
            let audio = result
                .audio_path
                .as_ref()
                .map_or_else(|| "failed".to_string(), |p| p.display().to_string());
            format!(
                "Recording completed: {} frames in {:.1}s. Video: {}, Audio: {}",
                result.frames_captured, result.elapsed_seconds, video, audio
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::{FakeCamera, FakeMic};
    use crate::commands::testing;
    use std::time::Duration;

    #[test]
    fn test_record_pair_with_camera() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = testing::context(
            vec![FakeMic::new("USB Camera: Audio")],
            vec![(
                0,
                FakeCamera::new(4, 4).frame_interval(Duration::from_millis(10)),
            )],
            dir.path(),
        );

        let recording = handle_record(&ctx, 1, Some(0.1)).unwrap();

        let PairRecording::AudioVideo(result) = recording else {
            panic!("expected an audio+video recording");
        };
        assert_eq!(
            result.video_path,
            Some(dir.path().join("grabacion_dispositivo1_cam0_mic0.avi"))
        );
        assert_eq!(
            result.audio_path,
            Some(dir.path().join("grabacion_dispositivo1_mic0.wav"))
        );
    }

    #[test]
    fn test_record_pair_without_camera_falls_back_to_audio() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = testing::context(
            vec![FakeMic::new("USB Camera: Audio"), FakeMic::new("2- USB Camera")],
            vec![(0, FakeCamera::new(4, 4))],
            dir.path(),
        );

        let recording = handle_record(&ctx, 2, Some(0.05)).unwrap();

        assert_eq!(
            recording,
            PairRecording::AudioOnly(dir.path().join("solo_audio_mic1.wav"))
        );
        assert!(describe(&recording).starts_with("Audio saved to"));
    }

    #[test]
    fn test_record_unknown_pair_fails() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = testing::context(vec![FakeMic::new("USB Camera")], Vec::new(), dir.path());

        assert!(handle_record(&ctx, 0, Some(0.1)).is_err());
        assert!(handle_record(&ctx, 2, Some(0.1)).is_err());
    }
}
