//! Audio+video recording.
//!
//! The video loop runs on the calling thread while the microphone records on
//! its own thread. The two share only the nominal duration; frames and audio
//! blocks are not aligned to each other.

use super::audio::record_microphone;
use super::{
    clamp_duration, pair_files, CaptureCoordinator, CaptureResult, PROGRESS_INTERVAL,
    VIDEO_FOURCC, VIDEO_FPS,
};
use crate::backend::VideoSpec;
use crate::error::{CaptureError, Result};
use std::thread;
use std::time::Instant;

impl CaptureCoordinator<'_> {
    /// Records video from `camera_id` and audio from `mic_id` at the same time.
    ///
    /// Writes `<base>_cam<cam>_mic<mic>.avi` and `<base>_mic<mic>.wav`. The
    /// video loop stops once the duration has elapsed or a frame read fails;
    /// the elapsed check happens between frames, so the recording may overrun
    /// by up to one frame interval. The camera and the encoder are released
    /// only after the audio thread has finished. Durations above
    /// [`super::MAX_DURATION_SECS`] are capped.
    ///
    /// # Errors
    /// - `DeviceUnavailable` if the camera cannot be opened (audio is not started)
    /// - `Encoder` if the video container cannot be created
    pub fn capture_video_with_audio(
        &self,
        camera_id: u32,
        mic_id: u32,
        duration_secs: f64,
        base_name: &str,
    ) -> Result<CaptureResult> {
        let duration_secs = clamp_duration(duration_secs);
        let (video_file, audio_file) = pair_files(base_name, camera_id, mic_id);
        let video_path = self.output_path(&video_file);
        let audio_path = self.output_path(&audio_file);

        let mut camera = self.backends.video.open(camera_id)?;
        let (width, height) = camera.resolution();
        let spec = VideoSpec {
            width,
            height,
            fps: VIDEO_FPS,
            fourcc: VIDEO_FOURCC,
        };
        let mut encoder = self.backends.sink.create(&video_path, &spec)?;

        tracing::info!(
            "Recording camera {} ({}x{}) with microphone {} for {}s",
            camera_id,
            width,
            height,
            mic_id,
            duration_secs
        );

        let audio = self.backends.audio.as_ref();
        let (frames_captured, elapsed_seconds, audio_outcome) = thread::scope(|scope| {
            let audio_task = thread::Builder::new()
                .name(format!("mic-{mic_id}"))
                .spawn_scoped(scope, || {
                    record_microphone(audio, mic_id, duration_secs, &audio_path)
                });

            let started = Instant::now();
            let mut frames: u64 = 0;

            while started.elapsed().as_secs_f64() < duration_secs {
                let frame = match camera.read_frame() {
                    Ok(frame) => frame,
                    Err(e) => {
                        tracing::warn!("Video recording stopped early: {}", e);
                        break;
                    }
                };

                if let Err(e) = encoder.write_frame(&frame) {
                    tracing::error!("Failed to write video frame: {}", e);
                    break;
                }
                frames += 1;

                if frames % PROGRESS_INTERVAL == 0 {
                    tracing::info!(
                        "Recording... {:.1}s of {}s elapsed ({} frames)",
                        started.elapsed().as_secs_f64(),
                        duration_secs,
                        frames
                    );
                }
            }
            let elapsed = started.elapsed().as_secs_f64();

            let audio_outcome = match audio_task {
                Ok(handle) => handle.join().unwrap_or_else(|_| {
                    Err(CaptureError::Backend(format!(
                        "recording thread for microphone {mic_id} panicked"
                    )))
                }),
                Err(e) => Err(CaptureError::Backend(format!(
                    "failed to start recording thread for microphone {mic_id}: {e}"
                ))),
            };

            (frames, elapsed, audio_outcome)
        });

        drop(camera);
        let video_path = match encoder.finish() {
            Ok(()) => Some(video_path),
            Err(e) => {
                tracing::error!("Failed to finalize video: {}", e);
                None
            }
        };

        let audio_path = match audio_outcome {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!("Audio recording from microphone {} failed: {}", mic_id, e);
                None
            }
        };

        tracing::info!(
            "Recording completed: {} frames in {:.2}s, video: {:?}, audio: {:?}",
            frames_captured,
            elapsed_seconds,
            video_path,
            audio_path
        );

        Ok(CaptureResult {
            audio_path,
            video_path,
            frames_captured,
            elapsed_seconds,
        })
    }
}
