//! Error taxonomy for device discovery and capture.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the capture backends and the capture coordinator.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The device cannot be opened, or opens but yields no usable data.
    #[error("device {device} unavailable: {reason}")]
    DeviceUnavailable { device: String, reason: String },

    /// Overflow or overrun while streaming. Never fatal for a capture.
    #[error("transient stream fault: {0}")]
    TransientStreamFault(String),

    /// The output container could not be written.
    #[error("failed to write {}: {reason}", path.display())]
    Write { path: PathBuf, reason: String },

    /// The video encoder failed to start or to finalize its output.
    #[error("video encoder error: {0}")]
    Encoder(String),

    /// The host audio or video subsystem itself failed.
    #[error("capture backend error: {0}")]
    Backend(String),

    /// The live viewer could not draw or read input.
    #[error("display error: {0}")]
    Display(#[from] std::io::Error),
}

impl CaptureError {
    pub fn microphone(id: u32, reason: impl Into<String>) -> Self {
        Self::DeviceUnavailable {
            device: format!("microphone {id}"),
            reason: reason.into(),
        }
    }

    pub fn camera(id: u32, reason: impl Into<String>) -> Self {
        Self::DeviceUnavailable {
            device: format!("camera {id}"),
            reason: reason.into(),
        }
    }

    pub fn write(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Write {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientStreamFault(_))
    }
}

pub type Result<T> = std::result::Result<T, CaptureError>;
