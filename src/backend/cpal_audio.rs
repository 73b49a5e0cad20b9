//! Audio subsystem backed by cpal.
//!
//! Device ids are ordinals into the host's full device list, the way the OS
//! audio API numbers them. cpal is callback driven, so the input stream feeds a
//! bounded channel from the callback and `read_block` drains it, giving the
//! coordinator a blocking, block-at-a-time reader.

use super::{AudioSession, AudioSystem, InputDeviceInfo, InputStream, StreamSpec};
use crate::error::{CaptureError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::sync::Arc;
use std::time::Duration;

#[cfg(target_os = "linux")]
use std::fs::OpenOptions;
#[cfg(target_os = "linux")]
use std::os::unix::io::AsRawFd;
#[cfg(target_os = "linux")]
use std::sync::{Mutex, PoisonError};

/// Held for the whole save/redirect/restore window; fd 2 is process-wide.
#[cfg(target_os = "linux")]
static STDERR_REDIRECT: Mutex<()> = Mutex::new(());

/// Callback buffers held between the audio thread and the reader.
const CHANNEL_DEPTH: usize = 64;

/// Longest wait for one block before the device is considered dead.
const READ_TIMEOUT: Duration = Duration::from_secs(2);

/// Connects to the platform's default cpal host.
#[derive(Debug, Default)]
pub struct CpalAudioSystem;

impl CpalAudioSystem {
    pub fn new() -> Self {
        Self
    }
}

impl AudioSystem for CpalAudioSystem {
    fn connect(&self) -> Result<Box<dyn AudioSession>> {
        let host = quiet_stderr(|| Ok(cpal::default_host()))?;
        tracing::debug!("Connected to audio host {:?}", host.id());
        Ok(Box::new(CpalSession { host }))
    }
}

struct CpalSession {
    host: cpal::Host,
}

impl CpalSession {
    fn devices(&self) -> Result<Vec<cpal::Device>> {
        quiet_stderr(|| {
            self.host
                .devices()
                .map(|devices| devices.collect())
                .map_err(|e| CaptureError::Backend(format!("failed to enumerate audio devices: {e}")))
        })
    }

    fn device(&self, id: u32) -> Result<cpal::Device> {
        self.devices()?
            .into_iter()
            .nth(id as usize)
            .ok_or_else(|| CaptureError::microphone(id, "no such device"))
    }
}

/// Builds the device description, treating devices without input configs as
/// having zero input channels.
fn describe(id: u32, device: &cpal::Device) -> Result<InputDeviceInfo> {
    let name = device
        .name()
        .map_err(|e| CaptureError::microphone(id, format!("name query failed: {e}")))?;

    let input_channels = device
        .supported_input_configs()
        .map(|configs| configs.map(|c| c.channels()).max().unwrap_or(0))
        .unwrap_or(0);

    Ok(InputDeviceInfo {
        id,
        name,
        input_channels,
    })
}

impl AudioSession for CpalSession {
    fn input_devices(&self) -> Result<Vec<Result<InputDeviceInfo>>> {
        let devices = self.devices()?;
        quiet_stderr(|| {
            Ok(devices
                .iter()
                .enumerate()
                .map(|(index, device)| describe(index as u32, device))
                .collect())
        })
    }

    fn device_info(&self, id: u32) -> Result<InputDeviceInfo> {
        let device = self.device(id)?;
        describe(id, &device)
    }

    fn open_input(&self, id: u32, spec: &StreamSpec) -> Result<Box<dyn InputStream + '_>> {
        let device = self.device(id)?;
        let stream = quiet_stderr(|| CpalInputStream::open(id, &device, spec))?;
        Ok(Box::new(stream))
    }
}

/// A playing cpal input stream plus the receiving end of its sample channel.
struct CpalInputStream {
    id: u32,
    stream: cpal::Stream,
    receiver: Receiver<Vec<i16>>,
    pending: VecDeque<i16>,
    overflowed: Arc<AtomicBool>,
}

impl CpalInputStream {
    fn open(id: u32, device: &cpal::Device, spec: &StreamSpec) -> Result<Self> {
        let wanted_rate = cpal::SampleRate(spec.sample_rate);

        // Run at the requested rate using the device's own channel layout and
        // sample format; downmixing happens in the callback.
        let range = device
            .supported_input_configs()
            .map_err(|e| CaptureError::microphone(id, format!("no input configurations: {e}")))?
            .filter(|range| {
                range.min_sample_rate() <= wanted_rate && range.max_sample_rate() >= wanted_rate
            })
            .min_by_key(|range| {
                let format_rank = match range.sample_format() {
                    SampleFormat::I16 => 0,
                    SampleFormat::F32 => 1,
                    _ => 2,
                };
                (range.channels().abs_diff(spec.channels), format_rank)
            })
            .ok_or_else(|| {
                CaptureError::microphone(id, format!("does not support {} Hz input", spec.sample_rate))
            })?;

        let supported = range.with_sample_rate(wanted_rate);
        let sample_format = supported.sample_format();
        let device_channels = supported.channels() as usize;
        let config: cpal::StreamConfig = supported.into();

        tracing::debug!(
            "Opening microphone {}: {}Hz, {} channels, {:?}",
            id,
            spec.sample_rate,
            device_channels,
            sample_format
        );

        let (sender, receiver) = mpsc::sync_channel(CHANNEL_DEPTH);
        let overflowed = Arc::new(AtomicBool::new(false));

        let stream = match sample_format {
            SampleFormat::I16 => build_stream::<i16>(device, &config, device_channels, sender, &overflowed),
            SampleFormat::U16 => build_stream::<u16>(device, &config, device_channels, sender, &overflowed),
            SampleFormat::I32 => build_stream::<i32>(device, &config, device_channels, sender, &overflowed),
            SampleFormat::F32 => build_stream::<f32>(device, &config, device_channels, sender, &overflowed),
            other => {
                return Err(CaptureError::microphone(
                    id,
                    format!("unsupported sample format {other:?}"),
                ))
            }
        }
        .map_err(|e| CaptureError::microphone(id, format!("failed to build input stream: {e}")))?;

        stream
            .play()
            .map_err(|e| CaptureError::microphone(id, format!("failed to start input stream: {e}")))?;

        Ok(Self {
            id,
            stream,
            receiver,
            pending: VecDeque::new(),
            overflowed,
        })
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    channels: usize,
    sender: SyncSender<Vec<i16>>,
    overflowed: &Arc<AtomicBool>,
) -> std::result::Result<cpal::Stream, cpal::BuildStreamError>
where
    T: SizedSample,
    i16: FromSample<T>,
{
    let data_overflow = Arc::clone(overflowed);
    let error_overflow = Arc::clone(overflowed);

    device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            let mono = downmix(data, channels);
            match sender.try_send(mono) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => data_overflow.store(true, Ordering::Relaxed),
                // Reader is gone; the stream is about to be dropped.
                Err(TrySendError::Disconnected(_)) => {}
            }
        },
        move |err| {
            tracing::warn!("Audio stream error: {}", err);
            error_overflow.store(true, Ordering::Relaxed);
        },
        None,
    )
}

/// Averages interleaved channels into mono i16 samples.
fn downmix<T>(data: &[T], channels: usize) -> Vec<i16>
where
    T: Sample,
    i16: FromSample<T>,
{
    if channels <= 1 {
        return data.iter().map(|&s| s.to_sample::<i16>()).collect();
    }

    data.chunks_exact(channels)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| s.to_sample::<i16>() as i32).sum();
            (sum / channels as i32) as i16
        })
        .collect()
}

impl InputStream for CpalInputStream {
    fn read_block(&mut self, block: &mut [i16]) -> Result<()> {
        while self.pending.len() < block.len() {
            match self.receiver.recv_timeout(READ_TIMEOUT) {
                Ok(chunk) => self.pending.extend(chunk),
                Err(RecvTimeoutError::Timeout) => {
                    return Err(CaptureError::microphone(self.id, "no audio data received"))
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(CaptureError::Backend(format!(
                        "input stream for microphone {} closed",
                        self.id
                    )))
                }
            }
        }

        let len = block.len();
        for (slot, sample) in block.iter_mut().zip(self.pending.drain(..len)) {
            *slot = sample;
        }

        if self.overflowed.swap(false, Ordering::Relaxed) {
            return Err(CaptureError::TransientStreamFault(format!(
                "input overflow on microphone {}",
                self.id
            )));
        }
        Ok(())
    }
}

impl Drop for CpalInputStream {
    fn drop(&mut self) {
        if let Err(e) = self.stream.pause() {
            tracing::debug!("Failed to pause input stream {}: {}", self.id, e);
        }
        tracing::debug!("Input stream for microphone {} released", self.id);
    }
}

/// Temporarily redirects stderr to /dev/null while ALSA probes devices on Linux.
///
/// Callers on other threads wait for the current redirect to be undone, so
/// the saved descriptor is always the real stderr.
#[cfg(target_os = "linux")]
fn quiet_stderr<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let _redirect = STDERR_REDIRECT
        .lock()
        .unwrap_or_else(PoisonError::into_inner);

    let dev_null = OpenOptions::new()
        .write(true)
        .open("/dev/null")
        .map_err(|e| CaptureError::Backend(format!("failed to open /dev/null: {e}")))?;

    let saved_stderr = unsafe { libc::dup(libc::STDERR_FILENO) };
    if saved_stderr == -1 {
        // Probing still works, it is only noisier.
        return f();
    }

    if unsafe { libc::dup2(dev_null.as_raw_fd(), libc::STDERR_FILENO) } == -1 {
        unsafe { libc::close(saved_stderr) };
        return f();
    }

    let result = f();

    unsafe {
        libc::dup2(saved_stderr, libc::STDERR_FILENO);
        libc::close(saved_stderr);
    }

    result
}

#[cfg(not(target_os = "linux"))]
fn quiet_stderr<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downmix_mono_passthrough() {
        let data: [i16; 3] = [1, -2, 3];
        assert_eq!(downmix(&data, 1), vec![1, -2, 3]);
    }

    #[test]
    fn test_downmix_averages_stereo_pairs() {
        let data: [i16; 4] = [100, 300, -50, 50];
        assert_eq!(downmix(&data, 2), vec![200, 0]);
    }

    #[test]
    fn test_downmix_converts_float_samples() {
        let data: [f32; 2] = [0.0, 0.0];
        assert_eq!(downmix(&data, 1), vec![0, 0]);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_overlapping_quiet_stderr_restores_original_target() {
        use std::thread;
        use std::time::Duration;

        let stderr_target = || std::fs::read_link("/proc/self/fd/2").unwrap();
        let before = stderr_target();

        thread::scope(|scope| {
            scope.spawn(|| {
                quiet_stderr(|| {
                    thread::sleep(Duration::from_millis(100));
                    Ok(())
                })
            });
            thread::sleep(Duration::from_millis(20));
            scope.spawn(|| {
                quiet_stderr(|| {
                    thread::sleep(Duration::from_millis(200));
                    Ok(())
                })
            });
        });

        assert_eq!(stderr_target(), before);
    }
}
