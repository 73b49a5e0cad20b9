//! Capture Coordinator.
//!
//! Runs still, audio, audio+video and live-view captures against the host
//! backends. The coordinator holds no device state: callers pass device ids
//! from a discovery pass, and every handle a capture acquires is released
//! before the capture returns.

pub mod audio;
pub mod live;
pub mod still;
pub mod video;

use crate::backend::{Backends, StreamSpec};
use std::path::PathBuf;

pub use live::FrameDisplay;
pub use still::save_png;

/// Fixed audio capture format: mono, 16-bit signed, 44.1 kHz, 1024-sample blocks.
pub const AUDIO_FORMAT: StreamSpec = StreamSpec {
    channels: 1,
    sample_rate: 44_100,
    block_size: 1024,
};

/// Nominal container frame rate, regardless of what the camera delivers.
pub const VIDEO_FPS: f64 = 20.0;

/// Codec tag written into AVI recordings.
pub const VIDEO_FOURCC: [u8; 4] = *b"XVID";

/// Frames between progress log lines while recording video.
const PROGRESS_INTERVAL: u64 = 10;

/// Longest capture accepted from the command line or the config file.
pub const MAX_DURATION_SECS: f64 = 3600.0;

/// Whether `secs` is a usable capture duration.
pub fn is_valid_duration(secs: f64) -> bool {
    secs.is_finite() && secs > 0.0 && secs <= MAX_DURATION_SECS
}

/// Caps `secs` at [`MAX_DURATION_SECS`]. NaN is passed through.
pub fn clamp_duration(secs: f64) -> f64 {
    if secs > MAX_DURATION_SECS {
        MAX_DURATION_SECS
    } else {
        secs
    }
}

/// Outcome of an audio+video recording.
///
/// Audio and video are captured independently for the same nominal duration;
/// they are not timestamp-aligned.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureResult {
    pub audio_path: Option<PathBuf>,
    pub video_path: Option<PathBuf>,
    pub frames_captured: u64,
    pub elapsed_seconds: f64,
}

/// Default file for a single-microphone recording.
pub fn single_mic_file(mic_id: u32) -> String {
    format!("grabacion_mic_{mic_id}.wav")
}

/// File for one microphone of a concurrent recording.
pub fn concurrent_mic_file(mic_id: u32) -> String {
    format!("grabacion_microfono_{mic_id}.wav")
}

/// File for an audio-only recording of a pair without camera.
pub fn audio_only_file(mic_id: u32) -> String {
    format!("solo_audio_mic{mic_id}.wav")
}

/// Video and audio files for a pair recording.
pub fn pair_files(base: &str, camera_id: u32, mic_id: u32) -> (String, String) {
    (
        format!("{base}_cam{camera_id}_mic{mic_id}.avi"),
        format!("{base}_mic{mic_id}.wav"),
    )
}

/// Base name for a pair recorded by its 1-based position.
pub fn pair_base_name(number: usize) -> String {
    format!("grabacion_dispositivo{number}")
}

/// Drives captures against a set of backends, writing into `output_dir`.
pub struct CaptureCoordinator<'a> {
    backends: &'a Backends,
    output_dir: PathBuf,
}

impl<'a> CaptureCoordinator<'a> {
    pub fn new(backends: &'a Backends, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            backends,
            output_dir: output_dir.into(),
        }
    }

    /// Resolves a file name against the output directory.
    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_names() {
        assert_eq!(single_mic_file(3), "grabacion_mic_3.wav");
        assert_eq!(concurrent_mic_file(7), "grabacion_microfono_7.wav");
        assert_eq!(audio_only_file(2), "solo_audio_mic2.wav");
        assert_eq!(
            pair_files("grabacion", 0, 5),
            (
                "grabacion_cam0_mic5.avi".to_string(),
                "grabacion_mic5.wav".to_string()
            )
        );
        assert_eq!(pair_base_name(1), "grabacion_dispositivo1");
    }
}
