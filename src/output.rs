//! Capture output handling.
//!
//! The sink takes a raw sensor frame, applies orientation correction and
//! resizing, encodes JPEG at the session quality, and hands back either a
//! `file://` URI or a base64 data URL depending on the requested encoding.

use crate::config::StorageConfig;
use crate::errors::CameraError;
use crate::orientation;
use crate::settings::{CaptureSettings, QualityProfile, ResultEncoding};
use crate::types::CameraFrame;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub struct OutputSink {
    output_directory: PathBuf,
    filename_prefix: String,
}

impl OutputSink {
    pub fn from_config(storage: &StorageConfig) -> Self {
        Self {
            output_directory: PathBuf::from(&storage.output_directory),
            filename_prefix: storage.filename_prefix.clone(),
        }
    }

    /// Correct, crop, resize, encode, and store a photo frame.
    ///
    /// `zoom` is the session zoom factor. Backends without optical zoom
    /// deliver the full sensor frame, so factors above 1.0 are applied here
    /// as a centered crop.
    ///
    /// Returns the value for the finished event: a `file://` URI for file
    /// encoding, a `data:image/jpeg` URL for base64.
    pub fn process_photo(
        &self,
        frame: CameraFrame,
        settings: &CaptureSettings,
        profile: QualityProfile,
        zoom: f32,
        is_front_camera: bool,
    ) -> Result<String, CameraError> {
        let transform =
            orientation::compute_transform(settings, frame.orientation, frame.mirrored, is_front_camera);

        let image = frame_to_image(&frame)?;
        let mut image = orientation::apply_transform(image, transform);
        image = apply_zoom_crop(image, zoom);

        if settings.should_resize {
            if let Some((width, height)) = resize_target(
                image.width(),
                image.height(),
                settings.target_width,
                settings.target_height,
            ) {
                log::debug!(
                    "Resizing {}x{} capture to {}x{}",
                    image.width(),
                    image.height(),
                    width,
                    height
                );
                image = image.resize_exact(width, height, image::imageops::FilterType::Triangle);
            }
        }

        let jpeg = encode_jpeg(&image, profile.jpeg_quality(settings.quality))?;

        match settings.result_encoding {
            ResultEncoding::File => self.store_photo_file(&jpeg),
            ResultEncoding::Base64 => Ok(format!("data:image/jpeg;base64,{}", BASE64.encode(&jpeg))),
        }
    }

    fn store_photo_file(&self, jpeg: &[u8]) -> Result<String, CameraError> {
        std::fs::create_dir_all(&self.output_directory).map_err(|e| {
            CameraError::EncodeOrWriteFailure(format!(
                "Failed to create output directory {}: {}",
                self.output_directory.display(),
                e
            ))
        })?;

        let path = self.output_directory.join(format!(
            "{}_{}_{}.jpg",
            self.filename_prefix,
            chrono::Utc::now().format("%Y%m%d_%H%M%S"),
            Uuid::new_v4()
        ));

        std::fs::write(&path, jpeg).map_err(|e| {
            CameraError::EncodeOrWriteFailure(format!(
                "Failed to write {}: {}",
                path.display(),
                e
            ))
        })?;

        log::info!("Photo saved to {} ({} bytes)", path.display(), jpeg.len());
        Ok(file_uri(&path))
    }

    /// Reserve a path for a new video recording.
    pub fn video_output_path(&self) -> Result<PathBuf, CameraError> {
        std::fs::create_dir_all(&self.output_directory).map_err(|e| {
            CameraError::EncodeOrWriteFailure(format!(
                "Failed to create output directory {}: {}",
                self.output_directory.display(),
                e
            ))
        })?;

        Ok(self.output_directory.join(format!(
            "{}_{}_{}.mp4",
            self.filename_prefix,
            chrono::Utc::now().format("%Y%m%d_%H%M%S"),
            Uuid::new_v4()
        )))
    }
}

/// Absolute `file://` URI for a stored capture.
pub fn file_uri(path: &Path) -> String {
    let absolute = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    format!("file://{}", absolute.display())
}

fn frame_to_image(frame: &CameraFrame) -> Result<DynamicImage, CameraError> {
    let buffer = image::RgbImage::from_raw(frame.width, frame.height, frame.data.clone()).ok_or_else(
        || {
            CameraError::EncodeOrWriteFailure(format!(
                "Frame buffer size {} does not match {}x{}",
                frame.data.len(),
                frame.width,
                frame.height
            ))
        },
    )?;
    Ok(DynamicImage::ImageRgb8(buffer))
}

/// Centered crop emulating digital zoom for backends without optical zoom.
fn apply_zoom_crop(image: DynamicImage, zoom: f32) -> DynamicImage {
    if !(zoom > 1.01) {
        return image;
    }

    let crop_width = ((image.width() as f32 / zoom).round() as u32).max(1);
    let crop_height = ((image.height() as f32 / zoom).round() as u32).max(1);
    let x = (image.width() - crop_width) / 2;
    let y = (image.height() - crop_height) / 2;
    log::debug!(
        "Applying digital zoom {:.2}x: cropping {}x{} to {}x{}",
        zoom,
        image.width(),
        image.height(),
        crop_width,
        crop_height
    );
    image.crop_imm(x, y, crop_width, crop_height)
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, CameraError> {
    let mut jpeg = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut std::io::Cursor::new(&mut jpeg), quality);
    image
        .write_with_encoder(encoder)
        .map_err(|e| CameraError::EncodeOrWriteFailure(format!("JPEG encode failed: {}", e)))?;
    Ok(jpeg)
}

/// Output dimensions for a resize request, aspect ratio preserved.
///
/// With both targets set the image is fitted within the box. With one target
/// the other dimension follows the aspect ratio. Upscaling is never done.
/// `None` means the image is already small enough.
fn resize_target(
    width: u32,
    height: u32,
    target_width: Option<u32>,
    target_height: Option<u32>,
) -> Option<(u32, u32)> {
    if width == 0 || height == 0 {
        return None;
    }

    let scale = match (target_width, target_height) {
        (Some(tw), Some(th)) => {
            let sx = tw as f64 / width as f64;
            let sy = th as f64 / height as f64;
            sx.min(sy)
        }
        (Some(tw), None) => tw as f64 / width as f64,
        (None, Some(th)) => th as f64 / height as f64,
        (None, None) => return None,
    };

    if scale >= 1.0 {
        return None;
    }

    let new_width = ((width as f64 * scale).round() as u32).max(1);
    let new_height = ((height as f64 * scale).round() as u32).max(1);
    Some((new_width, new_height))
}
