//! Deterministic orientation and mirroring correction for captured frames.
//!
//! The transform is computed from the session settings and the raw frame
//! metadata alone; nothing here touches the hardware.

use crate::settings::CaptureSettings;
use crate::types::FrameOrientation;
use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// Rotation applied to a frame before emitting output, clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rotation {
    None,
    Rotate90,
    Rotate180,
    Rotate270,
}

/// The full correction applied to a captured frame: rotation first, then an
/// optional horizontal flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputTransform {
    pub rotation: Rotation,
    pub mirrored: bool,
}

impl OutputTransform {
    pub fn identity() -> Self {
        Self {
            rotation: Rotation::None,
            mirrored: false,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.rotation == Rotation::None && !self.mirrored
    }
}

/// Compute the correction for one captured frame.
///
/// Rules:
/// - With orientation correction disabled, the transform is always identity.
/// - Forced portrait rotates any non-portrait capture upright.
/// - The mirror flag requests selfie-style output for the front camera only;
///   the flip is emitted whenever the frame's current mirroring differs from
///   the requested end state, so pre-mirrored sensor output is normalized too.
pub fn compute_transform(
    settings: &CaptureSettings,
    captured: FrameOrientation,
    frame_mirrored: bool,
    is_front_camera: bool,
) -> OutputTransform {
    if !settings.should_correct_orientation {
        return OutputTransform::identity();
    }

    let rotation = if settings.force_portrait_orientation {
        match captured {
            FrameOrientation::Portrait => Rotation::None,
            FrameOrientation::PortraitUpsideDown => Rotation::Rotate180,
            FrameOrientation::LandscapeLeft => Rotation::Rotate90,
            FrameOrientation::LandscapeRight => Rotation::Rotate270,
        }
    } else {
        Rotation::None
    };

    let want_mirrored = is_front_camera && settings.mirror_front_camera_result;
    let mirrored = want_mirrored != frame_mirrored;

    OutputTransform { rotation, mirrored }
}

/// Apply a transform to decoded image data: rotation, then horizontal flip.
pub fn apply_transform(image: DynamicImage, transform: OutputTransform) -> DynamicImage {
    let rotated = match transform.rotation {
        Rotation::None => image,
        Rotation::Rotate90 => image.rotate90(),
        Rotation::Rotate180 => image.rotate180(),
        Rotation::Rotate270 => image.rotate270(),
    };

    if transform.mirrored {
        rotated.fliph()
    } else {
        rotated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::CaptureSettings;
    use image::{Rgb, RgbImage};

    fn settings(correct: bool, portrait: bool, mirror: bool) -> CaptureSettings {
        CaptureSettings {
            should_correct_orientation: correct,
            force_portrait_orientation: portrait,
            mirror_front_camera_result: mirror,
            ..CaptureSettings::default()
        }
    }

    #[test]
    fn test_correction_disabled_yields_identity() {
        let s = settings(false, true, true);
        let t = compute_transform(&s, FrameOrientation::LandscapeLeft, false, true);
        assert!(t.is_identity(), "disabled correction must not transform");
    }

    #[test]
    fn test_forced_portrait_rotates_landscape() {
        let s = settings(true, true, false);

        let left = compute_transform(&s, FrameOrientation::LandscapeLeft, false, false);
        assert_eq!(left.rotation, Rotation::Rotate90);

        let right = compute_transform(&s, FrameOrientation::LandscapeRight, false, false);
        assert_eq!(right.rotation, Rotation::Rotate270);

        let upside_down = compute_transform(&s, FrameOrientation::PortraitUpsideDown, false, false);
        assert_eq!(upside_down.rotation, Rotation::Rotate180);

        let upright = compute_transform(&s, FrameOrientation::Portrait, false, false);
        assert_eq!(upright.rotation, Rotation::None);
    }

    #[test]
    fn test_portrait_not_forced_keeps_rotation() {
        let s = settings(true, false, false);
        let t = compute_transform(&s, FrameOrientation::LandscapeLeft, false, false);
        assert_eq!(t.rotation, Rotation::None);
    }

    #[test]
    fn test_front_landscape_with_mirror_rotates_and_flips() {
        let s = settings(true, true, true);
        let t = compute_transform(&s, FrameOrientation::LandscapeLeft, false, true);
        assert_eq!(t.rotation, Rotation::Rotate90);
        assert!(t.mirrored, "front camera output should be mirrored");
    }

    #[test]
    fn test_mirror_disabled_rotates_only() {
        let s = settings(true, true, false);
        let t = compute_transform(&s, FrameOrientation::LandscapeLeft, false, true);
        assert_eq!(t.rotation, Rotation::Rotate90);
        assert!(!t.mirrored);
    }

    #[test]
    fn test_mirror_never_applies_to_rear_camera() {
        let s = settings(true, true, true);
        let t = compute_transform(&s, FrameOrientation::Portrait, false, false);
        assert!(!t.mirrored);
    }

    #[test]
    fn test_premirrored_sensor_output_is_normalized() {
        // Sensor already mirrored, host wants mirrored output: no extra flip.
        let s = settings(true, true, true);
        let t = compute_transform(&s, FrameOrientation::Portrait, true, true);
        assert!(!t.mirrored);

        // Sensor mirrored but mirroring disabled: flip back to unmirrored.
        let s = settings(true, true, false);
        let t = compute_transform(&s, FrameOrientation::Portrait, true, true);
        assert!(t.mirrored);
    }

    #[test]
    fn test_apply_rotate90_swaps_dimensions() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(4, 2));
        let out = apply_transform(
            img,
            OutputTransform {
                rotation: Rotation::Rotate90,
                mirrored: false,
            },
        );
        assert_eq!(out.width(), 2);
        assert_eq!(out.height(), 4);
    }

    #[test]
    fn test_apply_flip_moves_pixels() {
        let mut raw = RgbImage::new(2, 1);
        raw.put_pixel(0, 0, Rgb([255, 0, 0]));
        raw.put_pixel(1, 0, Rgb([0, 255, 0]));

        let out = apply_transform(
            DynamicImage::ImageRgb8(raw),
            OutputTransform {
                rotation: Rotation::None,
                mirrored: true,
            },
        );
        let out = out.to_rgb8();
        assert_eq!(out.get_pixel(0, 0).0, [0, 255, 0]);
        assert_eq!(out.get_pixel(1, 0).0, [255, 0, 0]);
    }

    #[test]
    fn test_apply_identity_is_noop() {
        let mut raw = RgbImage::new(2, 2);
        raw.put_pixel(1, 0, Rgb([9, 9, 9]));
        let img = DynamicImage::ImageRgb8(raw.clone());
        let out = apply_transform(img, OutputTransform::identity());
        assert_eq!(out.to_rgb8().as_raw(), raw.as_raw());
    }
}
