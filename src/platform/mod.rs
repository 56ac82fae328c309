//! Platform capture backends.
//!
//! Each OS gets a thin wrapper over nokhwa; [`PlatformCamera`] dispatches to
//! whichever backend is compiled in. The mock backend is selected when
//! `CAMERA_PREVIEW_USE_MOCK` is set in the environment or when tests force it.

#[cfg(target_os = "linux")]
pub mod linux;
#[cfg(target_os = "macos")]
pub mod macos;
#[cfg(target_os = "windows")]
pub mod windows;

pub mod mock;

use crate::errors::CameraError;
use crate::types::{CameraDeviceInfo, CameraFormat, CameraFrame};
use std::sync::Mutex as SyncMutex;

/// True when capture should go through the mock backend.
pub fn mock_enabled() -> bool {
    if mock::is_forced() {
        return true;
    }
    match std::env::var("CAMERA_PREVIEW_USE_MOCK") {
        Ok(value) => value == "1" || value.eq_ignore_ascii_case("true"),
        Err(_) => false,
    }
}

/// Normalize a raw capture buffer to packed RGB24.
///
/// nokhwa can hand back MJPEG data even when RgbFormat was requested, so the
/// buffer is sniffed for a JPEG SOI marker and decoded when present. Decoded
/// dimensions are authoritative.
pub fn frame_to_rgb(
    raw: Vec<u8>,
    width: u32,
    height: u32,
) -> Result<(Vec<u8>, u32, u32), CameraError> {
    if raw.len() >= 3 && raw[0] == 0xFF && raw[1] == 0xD8 && raw[2] == 0xFF {
        log::debug!("Decoding MJPEG frame ({} bytes) to RGB", raw.len());

        let img = image::load_from_memory(&raw)
            .map_err(|e| CameraError::DeviceUnavailable(format!("Failed to decode MJPEG: {}", e)))?;

        let rgb = img.to_rgb8();
        let (w, h) = (rgb.width(), rgb.height());
        return Ok((rgb.into_raw(), w, h));
    }

    // Check if it's mostly zeros (invalid frame)
    if !raw.is_empty() {
        let non_zero_count = raw.iter().filter(|&&b| b != 0).count();
        let pct_nonzero = (non_zero_count as f64 / raw.len() as f64) * 100.0;
        if pct_nonzero < 1.0 {
            log::warn!("Frame appears to be mostly zeros - camera may not be ready");
        }
    }

    Ok((raw, width, height))
}

/// An opened camera on whichever backend is active.
pub enum PlatformCamera {
    #[cfg(target_os = "linux")]
    Linux(linux::LinuxCamera),
    #[cfg(target_os = "macos")]
    MacOS(macos::MacOSCamera),
    #[cfg(target_os = "windows")]
    Windows(windows::WindowsCamera),
    Mock(SyncMutex<mock::MockCamera>),
}

impl PlatformCamera {
    pub fn capture_frame(&self) -> Result<CameraFrame, CameraError> {
        match self {
            #[cfg(target_os = "linux")]
            PlatformCamera::Linux(camera) => camera.capture_frame(),
            #[cfg(target_os = "macos")]
            PlatformCamera::MacOS(camera) => camera.capture_frame(),
            #[cfg(target_os = "windows")]
            PlatformCamera::Windows(camera) => camera.capture_frame(),
            PlatformCamera::Mock(camera) => lock_mock(camera).capture_frame(),
        }
    }

    pub fn start_stream(&self) -> Result<(), CameraError> {
        match self {
            #[cfg(target_os = "linux")]
            PlatformCamera::Linux(camera) => camera.start_stream(),
            #[cfg(target_os = "macos")]
            PlatformCamera::MacOS(camera) => camera.start_stream(),
            #[cfg(target_os = "windows")]
            PlatformCamera::Windows(camera) => camera.start_stream(),
            PlatformCamera::Mock(camera) => lock_mock(camera).start_stream(),
        }
    }

    pub fn stop_stream(&self) -> Result<(), CameraError> {
        match self {
            #[cfg(target_os = "linux")]
            PlatformCamera::Linux(camera) => camera.stop_stream(),
            #[cfg(target_os = "macos")]
            PlatformCamera::MacOS(camera) => camera.stop_stream(),
            #[cfg(target_os = "windows")]
            PlatformCamera::Windows(camera) => camera.stop_stream(),
            PlatformCamera::Mock(camera) => lock_mock(camera).stop_stream(),
        }
    }

    pub fn is_available(&self) -> bool {
        match self {
            #[cfg(target_os = "linux")]
            PlatformCamera::Linux(camera) => camera.is_available(),
            #[cfg(target_os = "macos")]
            PlatformCamera::MacOS(camera) => camera.is_available(),
            #[cfg(target_os = "windows")]
            PlatformCamera::Windows(camera) => camera.is_available(),
            PlatformCamera::Mock(camera) => lock_mock(camera).is_available(),
        }
    }

    pub fn get_device_id(&self) -> String {
        match self {
            #[cfg(target_os = "linux")]
            PlatformCamera::Linux(camera) => camera.get_device_id().to_string(),
            #[cfg(target_os = "macos")]
            PlatformCamera::MacOS(camera) => camera.get_device_id().to_string(),
            #[cfg(target_os = "windows")]
            PlatformCamera::Windows(camera) => camera.get_device_id().to_string(),
            PlatformCamera::Mock(camera) => lock_mock(camera).get_device_id().to_string(),
        }
    }

    /// Forward a zoom request to the backend. The session applies zoom
    /// digitally as well, so backend failures are not fatal.
    pub fn set_zoom(&self, factor: f32) -> Result<(), CameraError> {
        match self {
            #[cfg(target_os = "linux")]
            PlatformCamera::Linux(camera) => camera.set_zoom(factor),
            #[cfg(target_os = "macos")]
            PlatformCamera::MacOS(camera) => camera.set_zoom(factor),
            #[cfg(target_os = "windows")]
            PlatformCamera::Windows(camera) => camera.set_zoom(factor),
            PlatformCamera::Mock(_) => Ok(()),
        }
    }

    pub fn set_focus_point(&self, x: f32, y: f32) -> Result<(), CameraError> {
        match self {
            #[cfg(target_os = "linux")]
            PlatformCamera::Linux(camera) => camera.set_focus_point(x, y),
            #[cfg(target_os = "macos")]
            PlatformCamera::MacOS(camera) => camera.set_focus_point(x, y),
            #[cfg(target_os = "windows")]
            PlatformCamera::Windows(camera) => camera.set_focus_point(x, y),
            PlatformCamera::Mock(_) => Ok(()),
        }
    }

    pub fn set_torch(&self, enabled: bool) -> Result<(), CameraError> {
        match self {
            #[cfg(target_os = "linux")]
            PlatformCamera::Linux(camera) => camera.set_torch(enabled),
            #[cfg(target_os = "macos")]
            PlatformCamera::MacOS(camera) => camera.set_torch(enabled),
            #[cfg(target_os = "windows")]
            PlatformCamera::Windows(camera) => camera.set_torch(enabled),
            PlatformCamera::Mock(_) => Ok(()),
        }
    }
}

fn lock_mock(camera: &SyncMutex<mock::MockCamera>) -> std::sync::MutexGuard<'_, mock::MockCamera> {
    camera
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Enumerate devices on the active backend.
pub fn list_devices() -> Result<Vec<CameraDeviceInfo>, CameraError> {
    if mock_enabled() {
        return Ok(mock::mock_devices());
    }

    #[cfg(target_os = "linux")]
    return linux::list_cameras();

    #[cfg(target_os = "macos")]
    return macos::list_cameras();

    #[cfg(target_os = "windows")]
    return windows::list_cameras();

    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    Err(CameraError::HardwareUnavailable(
        "Unsupported platform".to_string(),
    ))
}

/// Open a device on the active backend.
pub fn open_camera(
    device: &CameraDeviceInfo,
    format: &CameraFormat,
) -> Result<PlatformCamera, CameraError> {
    if mock_enabled() {
        let camera = mock::MockCamera::open(&device.id)?;
        return Ok(PlatformCamera::Mock(SyncMutex::new(camera)));
    }

    #[cfg(target_os = "linux")]
    return Ok(PlatformCamera::Linux(linux::open_camera(
        &device.id, format,
    )?));

    #[cfg(target_os = "macos")]
    return Ok(PlatformCamera::MacOS(macos::open_camera(
        &device.id, format,
    )?));

    #[cfg(target_os = "windows")]
    return Ok(PlatformCamera::Windows(windows::open_camera(
        &device.id, format,
    )?));

    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    Err(CameraError::HardwareUnavailable(
        "Unsupported platform".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_to_rgb_passes_raw_rgb_through() {
        let raw = vec![10u8, 20, 30, 40, 50, 60];
        let (data, width, height) = frame_to_rgb(raw.clone(), 2, 1).unwrap();
        assert_eq!(data, raw);
        assert_eq!((width, height), (2, 1));
    }

    #[test]
    fn test_frame_to_rgb_decodes_jpeg() {
        let mut jpeg = Vec::new();
        let img = image::RgbImage::from_fn(16, 8, |x, y| image::Rgb([x as u8 * 8, y as u8 * 16, 128]));
        image::DynamicImage::ImageRgb8(img)
            .write_to(
                &mut std::io::Cursor::new(&mut jpeg),
                image::ImageFormat::Jpeg,
            )
            .unwrap();
        assert_eq!(&jpeg[0..3], &[0xFF, 0xD8, 0xFF]);

        let (data, width, height) = frame_to_rgb(jpeg, 0, 0).unwrap();
        assert_eq!((width, height), (16, 8));
        assert_eq!(data.len(), 16 * 8 * 3);
    }

    #[test]
    fn test_forced_mock_mode_gates_backend() {
        let _guard = crate::test_support::lock();
        mock::force_mock_mode(true);
        assert!(mock_enabled());

        let devices = list_devices().unwrap();
        assert!(!devices.is_empty(), "mock backend should report devices");

        let camera = open_camera(&devices[0], &CameraFormat::standard()).unwrap();
        camera.start_stream().unwrap();
        let frame = camera.capture_frame().unwrap();
        assert!(frame.size_bytes > 0);
        camera.stop_stream().unwrap();

        mock::force_mock_mode(false);
    }
}
