//! Configuration file management for camic.
//!
//! Settings live in `~/.config/camic/camic.toml`. Every key has a default, so a
//! partial file (or an empty one) is valid.

use crate::capture::{is_valid_duration, MAX_DURATION_SECS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// How devices are discovered and matched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Ordered name patterns. A microphone is kept when its name contains one
    /// of them; earlier patterns pair first.
    #[serde(default = "default_name_patterns")]
    pub name_patterns: Vec<String>,
    /// Camera indices `0..max_camera_index` are probed.
    #[serde(default = "default_max_camera_index")]
    pub max_camera_index: u32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name_patterns: default_name_patterns(),
            max_camera_index: default_max_camera_index(),
        }
    }
}

fn default_name_patterns() -> Vec<String> {
    ["USB Camera", "2- USB Camera", "3- USB Camera"]
        .iter()
        .map(|p| p.to_string())
        .collect()
}

fn default_max_camera_index() -> u32 {
    4
}

/// Where and how long captures run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Directory that recordings and snapshots are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Duration used when a command does not specify one
    #[serde(default = "default_duration_secs")]
    pub default_duration_secs: f64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            default_duration_secs: default_duration_secs(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_duration_secs() -> f64 {
    5.0
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CamicConfig {
    #[serde(default)]
    pub devices: DeviceConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
}

impl CamicConfig {
    /// Loads configuration from `path`.
    ///
    /// # Errors
    /// - If the config file cannot be read
    /// - If the TOML is malformed or a value is out of range
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", path.display()))?;
        Self::parse(&content)
            .map_err(|e| anyhow::anyhow!("Invalid configuration in {}: {e}", path.display()))
    }

    /// Parses configuration from TOML text.
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: CamicConfig = toml::from_str(content)?;
        if config.devices.name_patterns.is_empty() {
            tracing::warn!("No microphone name patterns configured; no microphone will match");
        }
        if !is_valid_duration(config.capture.default_duration_secs) {
            anyhow::bail!(
                "capture.default_duration_secs must be between 0 and {MAX_DURATION_SECS}, got {}",
                config.capture.default_duration_secs
            );
        }
        Ok(config)
    }
}

/// Retrieves the path to the config file, creating its directory if needed.
///
/// # Errors
/// - If the home directory cannot be determined
/// - If the config directory cannot be created
pub fn get_config_path() -> anyhow::Result<PathBuf> {
    let config_dir = dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?
        .join(".config")
        .join("camic");

    fs::create_dir_all(&config_dir)
        .map_err(|e| anyhow::anyhow!("Failed to create config directory: {e}"))?;

    Ok(config_dir.join("camic.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = CamicConfig::parse("").unwrap();
        assert_eq!(config, CamicConfig::default());
        assert_eq!(
            config.devices.name_patterns,
            vec!["USB Camera", "2- USB Camera", "3- USB Camera"]
        );
        assert_eq!(config.devices.max_camera_index, 4);
        assert_eq!(config.capture.output_dir, PathBuf::from("."));
    }

    #[test]
    fn test_partial_config_overrides() {
        let config = CamicConfig::parse(
            r#"
            [devices]
            name_patterns = ["Webcam C920"]

            [capture]
            output_dir = "/tmp/recordings"
            "#,
        )
        .unwrap();

        assert_eq!(config.devices.name_patterns, vec!["Webcam C920"]);
        assert_eq!(config.devices.max_camera_index, 4);
        assert_eq!(config.capture.output_dir, PathBuf::from("/tmp/recordings"));
        assert_eq!(config.capture.default_duration_secs, 5.0);
    }

    #[test]
    fn test_rejects_out_of_range_duration() {
        assert!(CamicConfig::parse("[capture]\ndefault_duration_secs = 0.0").is_err());
        assert!(CamicConfig::parse("[capture]\ndefault_duration_secs = inf").is_err());
        assert!(CamicConfig::parse("[capture]\ndefault_duration_secs = nan").is_err());
        assert!(CamicConfig::parse("[capture]\ndefault_duration_secs = 1e15").is_err());
        assert!(CamicConfig::parse("[capture]\ndefault_duration_secs = 3600.0").is_ok());
        assert!(CamicConfig::parse("[devices]\nmax_camera_index = \"four\"").is_err());
    }

    #[test]
    fn test_embedded_template_parses() {
        let config = CamicConfig::parse(crate::setup::DEFAULT_CONFIG).unwrap();
        assert_eq!(config, CamicConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("camic.toml");
        fs::write(&path, "[devices]\nmax_camera_index = 2\n").unwrap();

        let config = CamicConfig::load_from(&path).unwrap();
        assert_eq!(config.devices.max_camera_index, 2);
        assert!(CamicConfig::load_from(&dir.path().join("missing.toml")).is_err());
    }
}
