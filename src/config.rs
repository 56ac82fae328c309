//! Plugin configuration.
//!
//! Runtime options for the capture session: default device format, output
//! storage, and recording preferences. Loaded from a TOML file next to the
//! host application, with safe defaults when the file is absent.

use crate::errors::CameraError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginConfig {
    pub camera: CameraConfig,
    pub storage: StorageConfig,
    pub recording: RecordingPrefs,
}

/// Capture device configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Requested capture resolution [width, height]
    pub default_resolution: [u32; 2],
    /// Requested frames per second
    pub default_fps: u32,
    /// Frames discarded after stream start while the sensor stabilizes
    pub warmup_frames: u32,
}

/// Output storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory where captures are written
    pub output_directory: String,
    /// Prefix for generated capture file names
    pub filename_prefix: String,
}

/// Video recording preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingPrefs {
    /// Enable fast-start MP4 layout (moov before mdat)
    pub fast_start: bool,
    /// Optional title metadata embedded in recordings
    pub title: Option<String>,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            storage: StorageConfig::default(),
            recording: RecordingPrefs::default(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            default_resolution: [1920, 1080],
            default_fps: 30,
            warmup_frames: 3,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_directory: "./captures".to_string(),
            filename_prefix: "capture".to_string(),
        }
    }
}

impl Default for RecordingPrefs {
    fn default() -> Self {
        Self {
            fast_start: true,
            title: None,
        }
    }
}

impl PluginConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, CameraError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            CameraError::EncodeOrWriteFailure(format!("Failed to read config file: {}", e))
        })?;

        let config: PluginConfig = toml::from_str(&contents).map_err(|e| {
            CameraError::EncodeOrWriteFailure(format!("Failed to parse config file: {}", e))
        })?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CameraError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                CameraError::EncodeOrWriteFailure(format!(
                    "Failed to create config directory: {}",
                    e
                ))
            })?;
        }

        let toml_string = toml::to_string_pretty(self).map_err(|e| {
            CameraError::EncodeOrWriteFailure(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path, toml_string).map_err(|e| {
            CameraError::EncodeOrWriteFailure(format!("Failed to write config file: {}", e))
        })?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Get default config file path
    pub fn default_path() -> PathBuf {
        PathBuf::from("camera-preview.toml")
    }

    /// Load from default location or fall back to defaults
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.camera.default_resolution[0] == 0 || self.camera.default_resolution[1] == 0 {
            return Err("Invalid default resolution".to_string());
        }
        if self.camera.default_fps == 0 || self.camera.default_fps > 240 {
            return Err("Invalid default FPS (must be 1-240)".to_string());
        }
        if self.camera.warmup_frames > 30 {
            return Err("Warmup frames must be at most 30".to_string());
        }

        if self.storage.output_directory.is_empty() {
            return Err("Output directory must not be empty".to_string());
        }
        if self.storage.filename_prefix.is_empty() {
            return Err("Filename prefix must not be empty".to_string());
        }

        Ok(())
    }
}
