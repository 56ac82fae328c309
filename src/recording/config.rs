//! Recording configuration types

use crate::settings::QualityProfile;
use serde::{Deserialize, Serialize};

/// Resolution bound for a quality profile. Recordings are fitted within this
/// box, never upscaled.
pub fn profile_bounds(profile: QualityProfile) -> (u32, u32) {
    match profile {
        QualityProfile::Low => (1280, 720),
        QualityProfile::Hq => (1920, 1080),
    }
}

/// Target H.264 bitrate for a quality profile, in bits per second.
pub fn profile_bitrate(profile: QualityProfile) -> u32 {
    match profile {
        QualityProfile::Low => 2_500_000,
        QualityProfile::Hq => 10_000_000,
    }
}

/// Encoded dimensions for a sensor frame under a quality profile.
///
/// The frame is fitted within the profile bound preserving aspect ratio,
/// then aligned down to a multiple of 16 for the encoder. Frames already
/// inside the bound keep their size apart from alignment.
pub fn target_dimensions(frame_width: u32, frame_height: u32, profile: QualityProfile) -> (u32, u32) {
    let (max_width, max_height) = profile_bounds(profile);

    let scale = if frame_width == 0 || frame_height == 0 {
        1.0
    } else {
        let sx = max_width as f64 / frame_width as f64;
        let sy = max_height as f64 / frame_height as f64;
        sx.min(sy).min(1.0)
    };

    let align = |v: f64| -> u32 { (((v.round() as u32) / 16) * 16).max(16) };
    (
        align(frame_width as f64 * scale),
        align(frame_height as f64 * scale),
    )
}

/// Configuration for video recording
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingConfig {
    /// Video width in pixels
    pub width: u32,
    /// Video height in pixels
    pub height: u32,
    /// Frames per second
    pub fps: f64,
    /// Target bitrate in bits per second
    pub bitrate: u32,
    /// Enable fast-start for web streaming (moov before mdat)
    pub fast_start: bool,
    /// Optional title metadata
    pub title: Option<String>,
}

impl RecordingConfig {
    /// Create a new recording configuration with explicit dimensions
    pub fn new(width: u32, height: u32, fps: f64) -> Self {
        Self {
            width,
            height,
            fps,
            bitrate: 5_000_000,
            fast_start: true,
            title: None,
        }
    }

    /// Configuration for a sensor frame size under a quality profile.
    pub fn for_frame(
        frame_width: u32,
        frame_height: u32,
        fps: f64,
        profile: QualityProfile,
    ) -> Self {
        let (width, height) = target_dimensions(frame_width, frame_height, profile);
        Self {
            width,
            height,
            fps,
            bitrate: profile_bitrate(profile),
            fast_start: true,
            title: None,
        }
    }

    /// Set the title metadata
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set fast-start mode
    pub fn with_fast_start(mut self, enabled: bool) -> Self {
        self.fast_start = enabled;
        self
    }

    /// Set custom bitrate
    pub fn with_bitrate(mut self, bitrate: u32) -> Self {
        self.bitrate = bitrate;
        self
    }
}

/// Statistics returned after finishing a recording
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingStats {
    /// Total number of video frames written
    pub video_frames: u64,
    /// Duration in seconds
    pub duration_secs: f64,
    /// Total bytes written to file
    pub bytes_written: u64,
    /// Average frames per second achieved
    pub actual_fps: f64,
    /// Number of dropped frames (if any)
    pub dropped_frames: u64,
    /// Output file path
    pub output_path: String,
}

impl RecordingStats {
    /// Calculate the average bitrate achieved
    pub fn avg_bitrate(&self) -> f64 {
        if self.duration_secs > 0.0 {
            (self.bytes_written as f64 * 8.0) / self.duration_secs
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_dimensions_fit_within_profile_bound() {
        assert_eq!(target_dimensions(3840, 2160, QualityProfile::Hq), (1920, 1072));
        assert_eq!(target_dimensions(1920, 1080, QualityProfile::Low), (1280, 720));
    }

    #[test]
    fn test_target_dimensions_never_upscale() {
        assert_eq!(target_dimensions(640, 480, QualityProfile::Hq), (640, 480));
        assert_eq!(target_dimensions(320, 240, QualityProfile::Low), (320, 240));
    }

    #[test]
    fn test_target_dimensions_align_to_16() {
        let (width, height) = target_dimensions(1000, 562, QualityProfile::Hq);
        assert_eq!(width % 16, 0);
        assert_eq!(height % 16, 0);
        assert!(width <= 1000 && height <= 562);
    }

    #[test]
    fn test_target_dimensions_have_a_floor() {
        assert_eq!(target_dimensions(8, 8, QualityProfile::Low), (16, 16));
    }

    #[test]
    fn test_profile_bitrates_are_ordered() {
        assert!(profile_bitrate(QualityProfile::Low) < profile_bitrate(QualityProfile::Hq));
    }

    #[test]
    fn test_avg_bitrate() {
        let stats = RecordingStats {
            video_frames: 300,
            duration_secs: 10.0,
            bytes_written: 1_000_000,
            actual_fps: 30.0,
            dropped_frames: 0,
            output_path: "test.mp4".to_string(),
        };
        assert_eq!(stats.avg_bitrate(), 800_000.0);
    }
}
