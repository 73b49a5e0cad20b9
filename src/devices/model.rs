//! Values produced by a discovery pass.
//!
//! Nothing here is cached between passes: every enumeration builds fresh values
//! and callers pass them on explicitly.

/// A microphone whose name matched one of the configured patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioDevice {
    /// Host-assigned ordinal, not stable across OS sessions
    pub id: u32,
    pub name: String,
    /// The first configured pattern found in `name`
    pub matched_pattern: String,
    /// Position of `matched_pattern` in the configured pattern list
    pub pattern_rank: usize,
    pub input_channels: u16,
}

/// A camera that opened and delivered at least one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoDevice {
    /// Host-assigned ordinal
    pub id: u32,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

impl VideoDevice {
    pub fn resolution(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

/// A microphone and the camera positionally paired with it, if any.
///
/// Pairing is a heuristic based on pattern priority and index order. It does
/// not verify that both devices belong to the same physical unit.
#[derive(Debug, Clone, PartialEq)]
pub struct DevicePair {
    pub microphone: AudioDevice,
    pub camera: Option<VideoDevice>,
}

impl DevicePair {
    /// Short human-readable label used in listings and menus.
    pub fn label(&self) -> String {
        match &self.camera {
            Some(camera) => format!("Mic: {} + Camera {}", self.microphone.name, camera.id),
            None => format!("Mic: {} - no camera", self.microphone.name),
        }
    }
}

/// Result of one full discovery pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceInventory {
    pub microphones: Vec<AudioDevice>,
    pub cameras: Vec<VideoDevice>,
    pub pairs: Vec<DevicePair>,
}

impl DeviceInventory {
    /// Ids of every matched microphone, in enumeration order.
    pub fn microphone_ids(&self) -> Vec<u32> {
        self.microphones.iter().map(|m| m.id).collect()
    }

    /// First matched microphone whose name contains `pattern`.
    pub fn find_microphone(&self, pattern: &str) -> Option<&AudioDevice> {
        self.microphones.iter().find(|m| m.name.contains(pattern))
    }

    pub fn pairs(&self) -> &[DevicePair] {
        &self.pairs
    }

    /// The pair at a 1-based position, as shown to users.
    pub fn pair(&self, number: usize) -> Option<&DevicePair> {
        number.checked_sub(1).and_then(|index| self.pairs.get(index))
    }

    pub fn is_empty(&self) -> bool {
        self.microphones.is_empty()
    }
}
