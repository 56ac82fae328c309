//! Resolution of the host-supplied options bag into validated capture settings.
//!
//! All parsing of host arguments happens here. Resolution never fails: unknown
//! keys are ignored and every missing field falls back to a documented default.

use crate::types::CameraDirection;
use serde::{Deserialize, Serialize};

/// How a finished photo is handed back to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultEncoding {
    /// Write a file and return a file:// URI.
    File,
    /// Return the JPEG bytes inline as a data URL.
    Base64,
}

impl Default for ResultEncoding {
    fn default() -> Self {
        ResultEncoding::File
    }
}

/// Capture profile selected through `set_quality`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityProfile {
    Low,
    Hq,
}

impl QualityProfile {
    /// JPEG quality (1-100) for photo encoding under this profile.
    ///
    /// The low profile caps quality regardless of the session's resolved
    /// quality setting so the two profiles produce visibly different output.
    pub fn jpeg_quality(&self, resolved_quality: f32) -> u8 {
        let base = (resolved_quality.clamp(0.0, 1.0) * 100.0).round() as u8;
        let base = base.max(1);
        match self {
            QualityProfile::Low => base.min(60),
            QualityProfile::Hq => base,
        }
    }
}

impl Default for QualityProfile {
    fn default() -> Self {
        QualityProfile::Hq
    }
}

impl std::str::FromStr for QualityProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(QualityProfile::Low),
            "hq" | "high" => Ok(QualityProfile::Hq),
            other => Err(format!("Unknown quality profile: {}", other)),
        }
    }
}

/// Validated, immutable settings for one preview session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureSettings {
    /// JPEG quality in [0, 1].
    pub quality: f32,
    pub direction: CameraDirection,
    pub result_encoding: ResultEncoding,
    pub target_width: Option<u32>,
    pub target_height: Option<u32>,
    pub should_resize: bool,
    pub should_correct_orientation: bool,
    pub force_portrait_orientation: bool,
    pub mirror_front_camera_result: bool,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            quality: 1.0,
            direction: CameraDirection::Rear,
            result_encoding: ResultEncoding::File,
            target_width: None,
            target_height: None,
            should_resize: false,
            should_correct_orientation: true,
            force_portrait_orientation: true,
            mirror_front_camera_result: true,
        }
    }
}

/// Raw option bag as received from the host. Every field is optional and
/// unrecognized keys are dropped during deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SettingsBag {
    quality: Option<f32>,
    direction: Option<CameraDirection>,
    result_encoding: Option<ResultEncoding>,
    target_width: Option<u32>,
    target_height: Option<u32>,
    should_correct_orientation: Option<bool>,
    force_portrait_orientation: Option<bool>,
    mirror_front_camera_result: Option<bool>,
}

impl CaptureSettings {
    /// Resolve a generic options value into validated settings.
    ///
    /// `None`, malformed values, and unknown keys all degrade to defaults;
    /// this function never fails.
    pub fn resolve(options: Option<serde_json::Value>) -> Self {
        let bag: SettingsBag = options
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_default();

        let quality = bag.quality.unwrap_or(1.0);
        let quality = if quality.is_nan() {
            1.0
        } else {
            quality.clamp(0.0, 1.0)
        };

        let target_width = bag.target_width.filter(|w| *w > 0);
        let target_height = bag.target_height.filter(|h| *h > 0);
        let should_resize = target_width.is_some() || target_height.is_some();

        Self {
            quality,
            direction: bag.direction.unwrap_or_default(),
            result_encoding: bag.result_encoding.unwrap_or_default(),
            target_width,
            target_height,
            should_resize,
            should_correct_orientation: bag.should_correct_orientation.unwrap_or(true),
            force_portrait_orientation: bag.force_portrait_orientation.unwrap_or(true),
            mirror_front_camera_result: bag.mirror_front_camera_result.unwrap_or(true),
        }
    }
}
