use crate::errors::CameraError;
use crate::types::{CameraDeviceInfo, CameraFormat, CameraFrame};
use nokhwa::{
    pixel_format::RgbFormat,
    query,
    utils::{RequestedFormat, RequestedFormatType},
    Camera,
};
use std::sync::{Arc, Mutex};

/// List available cameras on Windows
pub fn list_cameras() -> Result<Vec<CameraDeviceInfo>, CameraError> {
    let mut all_cameras = Vec::new();

    // Try multiple backends to detect all camera types including virtual cameras
    let backends = vec![
        nokhwa::utils::ApiBackend::MediaFoundation,
        nokhwa::utils::ApiBackend::Auto,
    ];

    for backend in backends {
        match query(backend) {
            Ok(cameras) => {
                log::debug!("Found {} cameras using {:?} backend", cameras.len(), backend);

                // Filter duplicates based on camera name to avoid double-listing
                for camera_info in cameras {
                    let name = camera_info.human_name();
                    if !all_cameras
                        .iter()
                        .any(|existing: &nokhwa::utils::CameraInfo| existing.human_name() == name)
                    {
                        all_cameras.push(camera_info);
                    }
                }
            }
            Err(e) => {
                log::debug!("Backend {:?} failed: {}", backend, e);
            }
        }
    }

    if all_cameras.is_empty() {
        return Err(CameraError::HardwareUnavailable(
            "No cameras found on any backend".to_string(),
        ));
    }

    let mut device_list = Vec::new();
    for camera_info in all_cameras {
        let device =
            CameraDeviceInfo::new(camera_info.index().to_string(), camera_info.human_name())
                .with_description(camera_info.description().to_string());
        device_list.push(device);
    }

    Ok(device_list)
}

/// Windows camera wrapper over the MediaFoundation backend.
pub struct WindowsCamera {
    camera: Arc<Mutex<Camera>>,
    device_id: String,
    streaming: Arc<Mutex<bool>>,
}

/// Open a camera on Windows with the MediaFoundation backend.
pub fn open_camera(device_id: &str, _format: &CameraFormat) -> Result<WindowsCamera, CameraError> {
    let device_index = device_id
        .parse::<u32>()
        .map_err(|_| CameraError::DeviceUnavailable(format!("Invalid device ID: {}", device_id)))?;

    let requested_format =
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution);

    let camera = Camera::new(
        nokhwa::utils::CameraIndex::Index(device_index),
        requested_format,
    )
    .map_err(|e| CameraError::DeviceUnavailable(format!("Failed to open camera: {}", e)))?;

    Ok(WindowsCamera {
        camera: Arc::new(Mutex::new(camera)),
        device_id: device_id.to_string(),
        streaming: Arc::new(Mutex::new(false)),
    })
}

impl WindowsCamera {
    /// Capture frame from the Windows camera.
    ///
    /// nokhwa can return MJPEG data even when RgbFormat is requested, so the
    /// buffer is sniffed and decoded to RGB when needed.
    pub fn capture_frame(&self) -> Result<CameraFrame, CameraError> {
        let mut camera = self
            .camera
            .lock()
            .map_err(|_| CameraError::DeviceUnavailable("Failed to lock camera".to_string()))?;

        let frame = camera
            .frame()
            .map_err(|e| CameraError::DeviceUnavailable(format!("Failed to capture frame: {}", e)))?;

        let (data, width, height) = super::frame_to_rgb(
            frame.buffer_bytes().to_vec(),
            frame.resolution().width_x,
            frame.resolution().height_y,
        )?;

        Ok(CameraFrame::new(data, width, height, self.device_id.clone()))
    }

    pub fn get_device_id(&self) -> &str {
        &self.device_id
    }

    pub fn is_available(&self) -> bool {
        self.streaming.lock().map(|s| *s).unwrap_or(false)
    }

    pub fn start_stream(&self) -> Result<(), CameraError> {
        let mut camera = self
            .camera
            .lock()
            .map_err(|_| CameraError::DeviceUnavailable("Failed to lock camera".to_string()))?;

        camera
            .open_stream()
            .map_err(|e| CameraError::DeviceUnavailable(format!("Failed to start stream: {}", e)))?;

        if let Ok(mut streaming) = self.streaming.lock() {
            *streaming = true;
        }
        Ok(())
    }

    pub fn stop_stream(&self) -> Result<(), CameraError> {
        let mut camera = self
            .camera
            .lock()
            .map_err(|_| CameraError::DeviceUnavailable("Failed to lock camera".to_string()))?;

        camera
            .stop_stream()
            .map_err(|e| CameraError::DeviceUnavailable(format!("Failed to stop stream: {}", e)))?;

        if let Ok(mut streaming) = self.streaming.lock() {
            *streaming = false;
        }
        Ok(())
    }

    /// MediaFoundation zoom is not exposed by nokhwa, so zoom stays digital
    /// and the request is only recorded here.
    pub fn set_zoom(&self, factor: f32) -> Result<(), CameraError> {
        log::debug!("Windows camera {}: zoom {} noted", self.device_id, factor);
        Ok(())
    }

    pub fn set_focus_point(&self, x: f32, y: f32) -> Result<(), CameraError> {
        log::debug!(
            "Windows camera {}: focus point ({}, {}) noted",
            self.device_id,
            x,
            y
        );
        Ok(())
    }

    pub fn set_torch(&self, enabled: bool) -> Result<(), CameraError> {
        log::debug!("Windows camera {}: torch {} noted", self.device_id, enabled);
        Ok(())
    }
}

// Ensure the camera is properly cleaned up
impl Drop for WindowsCamera {
    fn drop(&mut self) {
        if let Ok(mut camera) = self.camera.lock() {
            let _ = camera.stop_stream();
        }
    }
}

// Thread-safe implementation
unsafe impl Send for WindowsCamera {}
unsafe impl Sync for WindowsCamera {}
