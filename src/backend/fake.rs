//! In-memory hosts for exercising discovery and capture without hardware.
//!
//! Every fake handle bumps a shared live counter when acquired and drops it
//! when released, so tests can assert that nothing leaks on any path.

use super::{
    AudioSession, AudioSystem, Frame, InputDeviceInfo, InputStream, PixelOrder, StreamSpec,
    VideoEncoder, VideoSink, VideoSource, VideoSpec, VideoSystem,
};
use crate::error::{CaptureError, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Counts handles that are currently acquired.
#[derive(Debug, Clone, Default)]
pub struct HandleTracker {
    live: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl HandleTracker {
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn acquire(&self) -> HandleGuard {
        let now = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        HandleGuard {
            live: Arc::clone(&self.live),
        }
    }
}

#[derive(Debug)]
struct HandleGuard {
    live: Arc<AtomicUsize>,
}

impl Drop for HandleGuard {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// How a fake microphone behaves.
#[derive(Debug, Clone, PartialEq)]
pub enum MicBehavior {
    /// Every block reads cleanly
    Healthy,
    /// Every n-th block reports an overflow
    FaultEvery(usize),
    /// Opening the stream always fails
    FailOpen,
    /// Reads fail fatally after this many blocks
    DieAfter(usize),
    /// Querying the device fails during enumeration
    QueryFails,
}

#[derive(Debug, Clone)]
pub struct FakeMic {
    pub name: String,
    pub input_channels: u16,
    pub behavior: MicBehavior,
    pub block_delay: Duration,
}

impl FakeMic {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            input_channels: 1,
            behavior: MicBehavior::Healthy,
            block_delay: Duration::ZERO,
        }
    }

    pub fn channels(mut self, channels: u16) -> Self {
        self.input_channels = channels;
        self
    }

    pub fn behavior(mut self, behavior: MicBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn block_delay(mut self, delay: Duration) -> Self {
        self.block_delay = delay;
        self
    }
}

/// A fake audio host. Device ids are positions in `mics`.
#[derive(Debug, Default)]
pub struct FakeAudioSystem {
    pub mics: Vec<FakeMic>,
    pub unavailable: bool,
    pub tracker: HandleTracker,
    /// Number of successful `connect` calls
    pub connections: Arc<AtomicUsize>,
}

impl FakeAudioSystem {
    pub fn with_mics(mics: Vec<FakeMic>) -> Self {
        Self {
            mics,
            ..Self::default()
        }
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }
}

impl AudioSystem for FakeAudioSystem {
    fn connect(&self) -> Result<Box<dyn AudioSession>> {
        if self.unavailable {
            return Err(CaptureError::Backend("audio subsystem unavailable".to_string()));
        }
        self.connections.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            mics: self.mics.clone(),
            tracker: self.tracker.clone(),
            _guard: self.tracker.acquire(),
        }))
    }
}

struct FakeSession {
    mics: Vec<FakeMic>,
    tracker: HandleTracker,
    _guard: HandleGuard,
}

impl FakeSession {
    fn mic(&self, id: u32) -> Result<&FakeMic> {
        self.mics
            .get(id as usize)
            .ok_or_else(|| CaptureError::microphone(id, "no such device"))
    }
}

impl AudioSession for FakeSession {
    fn input_devices(&self) -> Result<Vec<Result<InputDeviceInfo>>> {
        Ok(self
            .mics
            .iter()
            .enumerate()
            .map(|(index, _)| self.device_info(index as u32))
            .collect())
    }

    fn device_info(&self, id: u32) -> Result<InputDeviceInfo> {
        let mic = self.mic(id)?;
        if mic.behavior == MicBehavior::QueryFails {
            return Err(CaptureError::microphone(id, "query failed"));
        }
        Ok(InputDeviceInfo {
            id,
            name: mic.name.clone(),
            input_channels: mic.input_channels,
        })
    }

    fn open_input(&self, id: u32, _spec: &StreamSpec) -> Result<Box<dyn InputStream + '_>> {
        let mic = self.mic(id)?;
        if mic.behavior == MicBehavior::FailOpen {
            return Err(CaptureError::microphone(id, "stream refused to open"));
        }
        Ok(Box::new(FakeStream {
            id,
            behavior: mic.behavior.clone(),
            delay: mic.block_delay,
            blocks_read: 0,
            _guard: self.tracker.acquire(),
        }))
    }
}

struct FakeStream {
    id: u32,
    behavior: MicBehavior,
    delay: Duration,
    blocks_read: usize,
    _guard: HandleGuard,
}

impl InputStream for FakeStream {
    fn read_block(&mut self, block: &mut [i16]) -> Result<()> {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.blocks_read += 1;

        match self.behavior {
            MicBehavior::DieAfter(limit) if self.blocks_read > limit => {
                return Err(CaptureError::microphone(self.id, "device unplugged"))
            }
            MicBehavior::FaultEvery(n) if n > 0 && self.blocks_read % n == 0 => {
                block.fill(0);
                return Err(CaptureError::TransientStreamFault("overflow".to_string()));
            }
            _ => {}
        }

        // Tag samples with the device id so files can be told apart.
        block.fill(self.id as i16 + 1);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct FakeCamera {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// Frames available before reads start failing (None = unlimited)
    pub frames: Option<usize>,
    pub frame_interval: Duration,
    pub order: PixelOrder,
}

impl FakeCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            fps: 30.0,
            frames: None,
            frame_interval: Duration::ZERO,
            order: PixelOrder::Rgb,
        }
    }

    pub fn frames(mut self, frames: usize) -> Self {
        self.frames = Some(frames);
        self
    }

    pub fn frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    pub fn order(mut self, order: PixelOrder) -> Self {
        self.order = order;
        self
    }
}

/// A fake video host keyed by camera index.
#[derive(Debug, Default)]
pub struct FakeVideoSystem {
    pub cameras: BTreeMap<u32, FakeCamera>,
    pub tracker: HandleTracker,
    /// Live handle count observed at the moment of every open attempt
    pub live_at_open: Mutex<Vec<(u32, usize)>>,
}

impl FakeVideoSystem {
    pub fn with_cameras(cameras: impl IntoIterator<Item = (u32, FakeCamera)>) -> Self {
        Self {
            cameras: cameras.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn opens(&self) -> Vec<(u32, usize)> {
        self.live_at_open
            .lock()
            .map(|opens| opens.clone())
            .unwrap_or_default()
    }
}

impl VideoSystem for FakeVideoSystem {
    fn open(&self, index: u32) -> Result<Box<dyn VideoSource>> {
        if let Ok(mut opens) = self.live_at_open.lock() {
            opens.push((index, self.tracker.live()));
        }
        let camera = self
            .cameras
            .get(&index)
            .ok_or_else(|| CaptureError::camera(index, "no such camera"))?;
        Ok(Box::new(FakeSource {
            index,
            camera: camera.clone(),
            served: 0,
            _guard: self.tracker.acquire(),
        }))
    }
}

struct FakeSource {
    index: u32,
    camera: FakeCamera,
    served: usize,
    _guard: HandleGuard,
}

impl VideoSource for FakeSource {
    fn resolution(&self) -> (u32, u32) {
        (self.camera.width, self.camera.height)
    }

    fn fps(&self) -> f64 {
        self.camera.fps
    }

    fn read_frame(&mut self) -> Result<Frame> {
        if !self.camera.frame_interval.is_zero() {
            std::thread::sleep(self.camera.frame_interval);
        }
        if let Some(limit) = self.camera.frames {
            if self.served >= limit {
                return Err(CaptureError::camera(self.index, "no frame"));
            }
        }
        self.served += 1;

        let pixels = (self.camera.width * self.camera.height) as usize;
        let data = [10u8, 20, 30].repeat(pixels);
        Ok(Frame {
            width: self.camera.width,
            height: self.camera.height,
            order: self.camera.order,
            data,
        })
    }
}

/// Records encoded frames per output path; `finish` writes a marker file.
#[derive(Debug, Default)]
pub struct FakeVideoSink {
    pub tracker: HandleTracker,
    pub written: Arc<Mutex<BTreeMap<PathBuf, usize>>>,
    pub fail_create: bool,
}

impl VideoSink for FakeVideoSink {
    fn create(&self, path: &Path, spec: &VideoSpec) -> Result<Box<dyn VideoEncoder>> {
        if self.fail_create {
            return Err(CaptureError::Encoder("encoder unavailable".to_string()));
        }
        Ok(Box::new(FakeEncoder {
            path: path.to_path_buf(),
            spec: *spec,
            frames: 0,
            written: Arc::clone(&self.written),
            _guard: self.tracker.acquire(),
        }))
    }
}

struct FakeEncoder {
    path: PathBuf,
    spec: VideoSpec,
    frames: usize,
    written: Arc<Mutex<BTreeMap<PathBuf, usize>>>,
    _guard: HandleGuard,
}

impl VideoEncoder for FakeEncoder {
    fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        if frame.width != self.spec.width || frame.height != self.spec.height {
            return Err(CaptureError::Encoder("frame size mismatch".to_string()));
        }
        self.frames += 1;
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<()> {
        std::fs::write(&self.path, format!("{} frames", self.frames))
            .map_err(|e| CaptureError::write(&self.path, e))?;
        if let Ok(mut written) = self.written.lock() {
            written.insert(self.path.clone(), self.frames);
        }
        Ok(())
    }
}
