//! Video container writer backed by an ffmpeg child process.
//!
//! Raw RGB frames are piped to ffmpeg's stdin and encoded into an AVI
//! container using the requested fourcc. Binary discovery checks standard
//! installation locations before falling back to a PATH search.

use super::{Frame, VideoEncoder, VideoSink, VideoSpec};
use crate::error::{CaptureError, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

/// Creates ffmpeg-backed encoders.
#[derive(Debug, Default)]
pub struct FfmpegVideoSink;

impl FfmpegVideoSink {
    pub fn new() -> Self {
        Self
    }
}

/// Maps a fourcc to the ffmpeg encoder that produces it.
fn encoder_for(fourcc: &str) -> &'static str {
    match fourcc {
        "XVID" | "DIVX" | "FMP4" => "mpeg4",
        "MJPG" => "mjpeg",
        "H264" | "X264" | "AVC1" => "libx264",
        _ => "mpeg4",
    }
}

impl VideoSink for FfmpegVideoSink {
    fn create(&self, path: &Path, spec: &VideoSpec) -> Result<Box<dyn VideoEncoder>> {
        let ffmpeg = find_ffmpeg()?;
        let fourcc = spec.fourcc_str();

        let child = Command::new(&ffmpeg)
            .args(["-loglevel", "error", "-y"])
            .args(["-f", "rawvideo", "-pixel_format", "rgb24"])
            .args(["-video_size", &format!("{}x{}", spec.width, spec.height)])
            .args(["-framerate", &spec.fps.to_string()])
            .args(["-i", "-"])
            .args(["-c:v", encoder_for(&fourcc), "-vtag", &fourcc, "-q:v", "5"])
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| CaptureError::Encoder(format!("failed to start ffmpeg: {e}")))?;

        tracing::info!(
            "Started ffmpeg encoder: {}x{} @ {}fps, fourcc={}, output: {}",
            spec.width,
            spec.height,
            spec.fps,
            fourcc,
            path.display()
        );

        Ok(Box::new(FfmpegEncoder {
            child: Some(child),
            width: spec.width,
            height: spec.height,
            path: path.to_path_buf(),
            frames: 0,
        }))
    }
}

struct FfmpegEncoder {
    child: Option<Child>,
    width: u32,
    height: u32,
    path: PathBuf,
    frames: u64,
}

impl VideoEncoder for FfmpegEncoder {
    fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        if frame.width != self.width || frame.height != self.height {
            return Err(CaptureError::Encoder(format!(
                "frame is {}x{}, container expects {}x{}",
                frame.width, frame.height, self.width, self.height
            )));
        }

        let stdin = self
            .child
            .as_mut()
            .and_then(|child| child.stdin.as_mut())
            .ok_or_else(|| CaptureError::Encoder("encoder already closed".to_string()))?;

        let rgb = frame.clone().into_rgb();
        stdin
            .write_all(&rgb.data)
            .map_err(|e| CaptureError::write(&self.path, e))?;
        self.frames += 1;
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };

        // Closing stdin signals end of input.
        drop(child.stdin.take());
        let output = child
            .wait_with_output()
            .map_err(|e| CaptureError::Encoder(format!("failed to wait for ffmpeg: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!("ffmpeg exited with {}: {}", output.status, stderr);
            return Err(CaptureError::Encoder(format!("ffmpeg failed: {}", stderr.trim())));
        }

        tracing::info!(
            "Video saved: {} ({} frames)",
            self.path.display(),
            self.frames
        );
        Ok(())
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            tracing::warn!("Discarding unfinished video {}", self.path.display());
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Locates the ffmpeg binary on the system.
///
/// Checks platform install locations first, then the PATH.
pub fn find_ffmpeg() -> Result<PathBuf> {
    let candidates: &[&str] = if cfg!(target_os = "macos") {
        &["/opt/homebrew/bin/ffmpeg", "/usr/local/bin/ffmpeg", "/usr/bin/ffmpeg"]
    } else if cfg!(target_os = "linux") {
        &["/usr/bin/ffmpeg", "/usr/local/bin/ffmpeg", "/snap/bin/ffmpeg"]
    } else if cfg!(target_os = "windows") {
        &[
            "C:\\ffmpeg\\bin\\ffmpeg.exe",
            "C:\\Program Files\\ffmpeg\\bin\\ffmpeg.exe",
        ]
    } else {
        &[]
    };

    if let Some(path) = candidates.iter().map(PathBuf::from).find(|p| p.exists()) {
        tracing::debug!("Found ffmpeg at: {}", path.display());
        return Ok(path);
    }

    let search = if cfg!(target_os = "windows") { "where" } else { "which" };
    let output = Command::new(search)
        .arg("ffmpeg")
        .output()
        .map_err(|e| CaptureError::Encoder(format!("failed to search PATH for ffmpeg: {e}")))?;

    if output.status.success() {
        let stdout = String::from_utf8_lossy(&output.stdout);
        if let Some(line) = stdout.lines().next().filter(|l| !l.trim().is_empty()) {
            let path = PathBuf::from(line.trim());
            tracing::debug!("Found ffmpeg in PATH at: {}", path.display());
            return Ok(path);
        }
    }

    Err(CaptureError::Encoder(
        "ffmpeg not found. Install it (brew install ffmpeg / apt install ffmpeg) to record video"
            .to_string(),
    ))
}
