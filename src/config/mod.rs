//! Configuration management for camic.
//!
//! Loads the TOML settings file from the user's config directory.

pub mod file;

pub use file::{get_config_path, CamicConfig, CaptureConfig, DeviceConfig};
