//! Shared types used across the camera session controller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which physical camera a session should face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraDirection {
    Front,
    Rear,
}

impl CameraDirection {
    pub fn opposite(&self) -> Self {
        match self {
            CameraDirection::Front => CameraDirection::Rear,
            CameraDirection::Rear => CameraDirection::Front,
        }
    }
}

impl Default for CameraDirection {
    fn default() -> Self {
        CameraDirection::Rear
    }
}

impl std::fmt::Display for CameraDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraDirection::Front => write!(f, "front"),
            CameraDirection::Rear => write!(f, "rear"),
        }
    }
}

/// Physical orientation of a captured frame as reported by the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameOrientation {
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
}

impl FrameOrientation {
    pub fn is_landscape(&self) -> bool {
        matches!(
            self,
            FrameOrientation::LandscapeLeft | FrameOrientation::LandscapeRight
        )
    }
}

impl Default for FrameOrientation {
    fn default() -> Self {
        // Desktop sensors deliver unrotated landscape frames.
        FrameOrientation::LandscapeLeft
    }
}

/// Flash behavior requested for subsequent photo captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashMode {
    Off,
    On,
    Auto,
    Torch,
}

impl Default for FlashMode {
    fn default() -> Self {
        FlashMode::Off
    }
}

impl std::fmt::Display for FlashMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlashMode::Off => write!(f, "off"),
            FlashMode::On => write!(f, "on"),
            FlashMode::Auto => write!(f, "auto"),
            FlashMode::Torch => write!(f, "torch"),
        }
    }
}

impl std::str::FromStr for FlashMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "off" => Ok(FlashMode::Off),
            "on" => Ok(FlashMode::On),
            "auto" => Ok(FlashMode::Auto),
            "torch" => Ok(FlashMode::Torch),
            other => Err(format!("Unknown flash mode: {}", other)),
        }
    }
}

/// Capability summary of a selected capture device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceCapabilities {
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub has_torch: bool,
}

impl DeviceCapabilities {
    /// Clamp a requested zoom factor into the supported range.
    pub fn clamp_zoom(&self, factor: f32) -> f32 {
        if factor.is_nan() {
            return self.min_zoom;
        }
        factor.clamp(self.min_zoom, self.max_zoom)
    }
}

impl Default for DeviceCapabilities {
    fn default() -> Self {
        Self {
            min_zoom: 1.0,
            max_zoom: 1.0,
            has_torch: false,
        }
    }
}

/// Description of an enumerated capture device.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraDeviceInfo {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub capabilities: DeviceCapabilities,
}

impl CameraDeviceInfo {
    pub fn new(id: String, name: String) -> Self {
        Self {
            id,
            name,
            description: None,
            capabilities: DeviceCapabilities::default(),
        }
    }

    pub fn with_description(mut self, description: String) -> Self {
        self.description = Some(description);
        self
    }

    pub fn with_capabilities(mut self, capabilities: DeviceCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }
}

/// Requested capture format for opening a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraFormat {
    pub width: u32,
    pub height: u32,
    pub fps: f32,
}

impl CameraFormat {
    pub fn new(width: u32, height: u32, fps: f32) -> Self {
        Self { width, height, fps }
    }

    /// 1080p30, the default capture request.
    pub fn standard() -> Self {
        Self::new(1920, 1080, 30.0)
    }
}

impl Default for CameraFormat {
    fn default() -> Self {
        Self::standard()
    }
}

/// A single frame delivered by the platform layer. Pixel data is RGB24.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraFrame {
    pub id: String,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub device_id: String,
    pub timestamp: DateTime<Utc>,
    pub size_bytes: usize,
    pub orientation: FrameOrientation,
    /// True when the sensor already delivered a horizontally mirrored image.
    pub mirrored: bool,
}

impl CameraFrame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, device_id: String) -> Self {
        let size_bytes = data.len();
        Self {
            id: Uuid::new_v4().to_string(),
            width,
            height,
            data,
            device_id,
            timestamp: Utc::now(),
            size_bytes,
            orientation: FrameOrientation::default(),
            mirrored: false,
        }
    }

    pub fn with_orientation(mut self, orientation: FrameOrientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_mirrored(mut self, mirrored: bool) -> Self {
        self.mirrored = mirrored;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_opposite_round_trips() {
        assert_eq!(CameraDirection::Front.opposite(), CameraDirection::Rear);
        assert_eq!(CameraDirection::Rear.opposite(), CameraDirection::Front);
        assert_eq!(
            CameraDirection::Front.opposite().opposite(),
            CameraDirection::Front
        );
    }

    #[test]
    fn test_flash_mode_parsing() {
        assert_eq!("torch".parse::<FlashMode>().unwrap(), FlashMode::Torch);
        assert_eq!("OFF".parse::<FlashMode>().unwrap(), FlashMode::Off);
        assert!("strobe".parse::<FlashMode>().is_err());
    }

    #[test]
    fn test_zoom_clamp_respects_bounds() {
        let caps = DeviceCapabilities {
            min_zoom: 1.0,
            max_zoom: 4.0,
            has_torch: false,
        };
        assert_eq!(caps.clamp_zoom(0.5), 1.0);
        assert_eq!(caps.clamp_zoom(10.0), 4.0);
        assert_eq!(caps.clamp_zoom(2.5), 2.5);
        assert_eq!(caps.clamp_zoom(f32::NAN), 1.0);
    }

    #[test]
    fn test_frame_carries_metadata() {
        let frame = CameraFrame::new(vec![0u8; 12], 2, 2, "cam-0".to_string())
            .with_orientation(FrameOrientation::Portrait)
            .with_mirrored(true);
        assert_eq!(frame.size_bytes, 12);
        assert_eq!(frame.orientation, FrameOrientation::Portrait);
        assert!(frame.mirrored);
        assert!(!frame.id.is_empty());
    }

    #[test]
    fn test_default_frame_orientation_is_landscape() {
        assert!(FrameOrientation::default().is_landscape());
    }
}
