//! Application command handlers for camic.
//!
//! Each submodule handles one command. Handlers print user-facing messages
//! themselves; everything else goes to the log file.
//!
//! # Commands
//! - `list_devices`: Run discovery and print microphones, cameras and pairs
//! - `snapshot`: Save a single camera frame as PNG
//! - `record_audio`: Record one microphone to WAV
//! - `record_all`: Record several microphones concurrently
//! - `record`: Record a discovered camera/microphone pair
//! - `watch`: Live camera preview in the terminal
//! - `interactive`: Menu-driven discovery and capture (default)
//! - `config`: Open configuration file in user's preferred editor

pub mod config;
pub mod interactive;
pub mod list_devices;
pub mod record;
pub mod record_all;
pub mod record_audio;
pub mod snapshot;
pub mod watch;

pub use config::handle_config;
pub use interactive::handle_interactive;
pub use list_devices::handle_list_devices;
pub use record::handle_record;
pub use record_all::handle_record_all;
pub use record_audio::handle_record_audio;
pub use snapshot::handle_snapshot;
pub use watch::handle_watch;

use crate::backend::Backends;
use crate::capture::CaptureCoordinator;
use crate::config::CamicConfig;
use crate::devices::{self, DeviceInventory};

/// What every capture command runs against.
pub struct Context {
    pub backends: Backends,
    pub config: CamicConfig,
}

impl Context {
    pub fn new(backends: Backends, config: CamicConfig) -> Self {
        Self { backends, config }
    }

    pub fn coordinator(&self) -> CaptureCoordinator<'_> {
        CaptureCoordinator::new(&self.backends, &self.config.capture.output_dir)
    }

    /// Runs one full discovery pass with the configured patterns.
    pub fn discover(&self) -> DeviceInventory {
        devices::discover(&self.backends, &self.config.devices)
    }

    /// The requested duration, or the configured default.
    pub fn duration(&self, requested: Option<f64>) -> f64 {
        requested.unwrap_or(self.config.capture.default_duration_secs)
    }
}
