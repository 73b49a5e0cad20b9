//! Host capture backends.
//!
//! The registry and the capture coordinator never talk to cpal, nokhwa or
//! ffmpeg directly. They go through the traits below, so every device, stream,
//! camera and encoder handle is an owned value that releases its OS resource
//! when dropped. Real implementations live in the submodules; `fake` provides
//! in-memory hosts with live-handle counters for tests.

pub mod cpal_audio;
pub mod ffmpeg;
pub mod nokhwa_video;

#[cfg(test)]
pub mod fake;

use crate::error::Result;
use std::path::Path;

pub use cpal_audio::CpalAudioSystem;
pub use ffmpeg::FfmpegVideoSink;
pub use nokhwa_video::NokhwaVideoSystem;

/// An input-capable device as reported by the audio subsystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDeviceInfo {
    /// Host-assigned ordinal, not stable across OS sessions
    pub id: u32,
    pub name: String,
    /// Maximum number of input channels (0 for output-only devices)
    pub input_channels: u16,
}

/// Sample layout requested when opening an input stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSpec {
    pub channels: u16,
    pub sample_rate: u32,
    /// Samples per blocking read
    pub block_size: usize,
}

/// Entry point to the audio subsystem. Shared across capture threads.
pub trait AudioSystem: Send + Sync {
    /// Acquires a fresh subsystem handle.
    ///
    /// Sessions are not shared between concurrent captures; every capture
    /// connects on its own and the handle is released when the session drops.
    fn connect(&self) -> Result<Box<dyn AudioSession>>;
}

/// One acquired audio-subsystem handle.
pub trait AudioSession {
    /// Lists every device the host knows about. Each entry fails on its own so
    /// a single broken device does not hide the rest.
    fn input_devices(&self) -> Result<Vec<Result<InputDeviceInfo>>>;

    /// Looks up a single device by id.
    fn device_info(&self, id: u32) -> Result<InputDeviceInfo>;

    /// Opens a blocking input stream. The stream cannot outlive the session.
    fn open_input(&self, id: u32, spec: &StreamSpec) -> Result<Box<dyn InputStream + '_>>;
}

/// A running input stream read one block at a time.
pub trait InputStream {
    /// Blocks until `block` is filled with mono i16 samples.
    ///
    /// `TransientStreamFault` means input was lost (overflow/overrun) but
    /// `block` still holds `block.len()` samples and the stream remains usable.
    /// Any other error is fatal for the stream.
    fn read_block(&mut self, block: &mut [i16]) -> Result<()>;
}

/// Channel order of a frame's packed 8-bit pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelOrder {
    Rgb,
    Bgr,
}

/// A single decoded video frame, three bytes per pixel, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub order: PixelOrder,
    pub data: Vec<u8>,
}

impl Frame {
    /// Converts the frame to canonical RGB channel order.
    pub fn into_rgb(mut self) -> Frame {
        if self.order == PixelOrder::Bgr {
            for pixel in self.data.chunks_exact_mut(3) {
                pixel.swap(0, 2);
            }
            self.order = PixelOrder::Rgb;
        }
        self
    }

    /// Returns the RGB value at (x, y), regardless of the stored order.
    pub fn rgb_at(&self, x: u32, y: u32) -> [u8; 3] {
        let offset = ((y as usize * self.width as usize) + x as usize) * 3;
        match self.data.get(offset..offset + 3) {
            Some(&[a, b, c]) => match self.order {
                PixelOrder::Rgb => [a, b, c],
                PixelOrder::Bgr => [c, b, a],
            },
            _ => [0, 0, 0],
        }
    }
}

/// Entry point to the video-capture subsystem.
pub trait VideoSystem: Send + Sync {
    /// Opens the camera at `index` for exclusive use.
    fn open(&self, index: u32) -> Result<Box<dyn VideoSource>>;
}

/// An open camera. Released when dropped.
pub trait VideoSource {
    /// Frame size reported by the device at open time.
    fn resolution(&self) -> (u32, u32);

    /// Nominal frame rate reported by the device.
    fn fps(&self) -> f64;

    /// Blocks until the next frame is available.
    fn read_frame(&mut self) -> Result<Frame>;
}

/// Container parameters for a video recording.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoSpec {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub fourcc: [u8; 4],
}

impl VideoSpec {
    pub fn fourcc_str(&self) -> String {
        String::from_utf8_lossy(&self.fourcc).into_owned()
    }
}

/// Factory for video container writers.
pub trait VideoSink: Send + Sync {
    fn create(&self, path: &Path, spec: &VideoSpec) -> Result<Box<dyn VideoEncoder>>;
}

/// An open video container. Dropping it without `finish` discards the output.
pub trait VideoEncoder {
    /// Appends one frame. Frames are written in the order they are given.
    fn write_frame(&mut self, frame: &Frame) -> Result<()>;

    /// Flushes and closes the container.
    fn finish(self: Box<Self>) -> Result<()>;
}

/// The set of host backends a session works with.
pub struct Backends {
    pub audio: Box<dyn AudioSystem>,
    pub video: Box<dyn VideoSystem>,
    pub sink: Box<dyn VideoSink>,
}

impl Backends {
    /// Backends talking to the real audio subsystem, cameras and ffmpeg.
    pub fn native() -> Self {
        Self {
            audio: Box::new(CpalAudioSystem::new()),
            video: Box::new(NokhwaVideoSystem::new()),
            sink: Box::new(FfmpegVideoSink::new()),
        }
    }
}
