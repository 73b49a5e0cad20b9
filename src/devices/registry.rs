//! Device Registry: enumeration and pairing.
//!
//! Enumeration is sequential and never fails as a whole. A device that cannot
//! be queried or opened is logged and skipped; an unavailable subsystem yields
//! an empty list.

use super::model::{AudioDevice, DeviceInventory, DevicePair, VideoDevice};
use crate::backend::{AudioSystem, Backends, VideoSystem};
use crate::config::DeviceConfig;

/// Pattern ranks at or beyond this value share the lowest pairing priority.
const LOWEST_PATTERN_PRIORITY: usize = 2;

/// Lists input devices whose name contains one of `patterns`.
///
/// Patterns are checked in order and the first match wins. Devices without
/// input channels are ignored. Results keep the host's enumeration order.
pub fn enumerate_microphones(audio: &dyn AudioSystem, patterns: &[String]) -> Vec<AudioDevice> {
    let session = match audio.connect() {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!("Audio subsystem unavailable: {}", e);
            return Vec::new();
        }
    };

    let devices = match session.input_devices() {
        Ok(devices) => devices,
        Err(e) => {
            tracing::warn!("Failed to enumerate audio devices: {}", e);
            return Vec::new();
        }
    };

    let mut microphones = Vec::new();
    for device in devices {
        let info = match device {
            Ok(info) => info,
            Err(e) => {
                tracing::warn!("Skipping audio device: {}", e);
                continue;
            }
        };

        if info.input_channels == 0 {
            continue;
        }

        let Some((rank, pattern)) = match_pattern(&info.name, patterns) else {
            continue;
        };

        tracing::info!(
            "Microphone {}: {}, {} channels (pattern '{}')",
            info.id,
            info.name,
            info.input_channels,
            pattern
        );

        microphones.push(AudioDevice {
            id: info.id,
            name: info.name,
            matched_pattern: pattern.clone(),
            pattern_rank: rank,
            input_channels: info.input_channels,
        });
    }

    microphones
}

/// Finds the pattern a device name is tagged with.
///
/// Patterns are checked in configured order and the first match wins, except
/// that a match contained in another matching pattern yields to it, so
/// "2- USB Camera" is not tagged with the shorter "USB Camera".
fn match_pattern<'a>(name: &str, patterns: &'a [String]) -> Option<(usize, &'a String)> {
    let candidates: Vec<(usize, &String)> = patterns
        .iter()
        .enumerate()
        .filter(|(_, pattern)| !pattern.is_empty() && name.contains(pattern.as_str()))
        .collect();

    candidates.iter().copied().find(|(_, pattern)| {
        !candidates
            .iter()
            .any(|(_, other)| other.len() > pattern.len() && other.contains(pattern.as_str()))
    })
}

/// Probes camera indices `0..max_index`.
///
/// A camera counts only if it opens and delivers a frame. Each handle is
/// released before the next index is probed.
pub fn enumerate_cameras(video: &dyn VideoSystem, max_index: u32) -> Vec<VideoDevice> {
    let mut cameras = Vec::new();

    for index in 0..max_index {
        let mut source = match video.open(index) {
            Ok(source) => source,
            Err(e) => {
                tracing::debug!("Camera {} not available: {}", index, e);
                continue;
            }
        };

        let (width, height) = source.resolution();
        let fps = source.fps();
        let probe = source.read_frame();
        drop(source);

        match probe {
            Ok(_) => {
                tracing::info!("Camera {} found: {}x{}, {} FPS", index, width, height, fps);
                cameras.push(VideoDevice {
                    id: index,
                    width,
                    height,
                    fps,
                });
            }
            Err(e) => {
                tracing::debug!("Camera {} opened but delivered no frame: {}", index, e);
            }
        }
    }

    cameras
}

/// Pairs microphones with cameras by position.
///
/// Microphones are ordered by pattern priority (primary, secondary, then
/// everything else) and id; cameras by id. The i-th microphone gets the i-th
/// camera. Extra microphones get no camera, extra cameras are dropped.
pub fn pair_devices(microphones: &[AudioDevice], cameras: &[VideoDevice]) -> Vec<DevicePair> {
    let mut ordered_mics: Vec<&AudioDevice> = microphones.iter().collect();
    ordered_mics.sort_by_key(|mic| (mic.pattern_rank.min(LOWEST_PATTERN_PRIORITY), mic.id));

    let mut ordered_cameras: Vec<&VideoDevice> = cameras.iter().collect();
    ordered_cameras.sort_by_key(|camera| camera.id);

    ordered_mics
        .into_iter()
        .enumerate()
        .map(|(position, mic)| {
            let camera = ordered_cameras.get(position).map(|c| (*c).clone());
            match &camera {
                Some(camera) => tracing::info!(
                    "Paired microphone {} ({}) with camera {}",
                    mic.id,
                    mic.matched_pattern,
                    camera.id
                ),
                None => tracing::info!(
                    "Microphone {} ({}) has no associated camera",
                    mic.id,
                    mic.matched_pattern
                ),
            }
            DevicePair {
                microphone: mic.clone(),
                camera,
            }
        })
        .collect()
}

/// Runs one complete discovery pass.
pub fn discover(backends: &Backends, config: &DeviceConfig) -> DeviceInventory {
    let microphones = enumerate_microphones(backends.audio.as_ref(), &config.name_patterns);
    let cameras = enumerate_cameras(backends.video.as_ref(), config.max_camera_index);
    let pairs = pair_devices(&microphones, &cameras);

    tracing::info!(
        "Discovery finished: {} microphones, {} cameras, {} pairs",
        microphones.len(),
        cameras.len(),
        pairs.len()
    );

    DeviceInventory {
        microphones,
        cameras,
        pairs,
    }
}
