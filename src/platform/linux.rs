use crate::errors::CameraError;
use crate::types::{CameraDeviceInfo, CameraFormat, CameraFrame};
use nokhwa::{
    pixel_format::RgbFormat,
    query,
    utils::{RequestedFormat, RequestedFormatType},
    CallbackCamera,
};
use std::sync::{Arc, Mutex};

/// List available cameras on Linux
pub fn list_cameras() -> Result<Vec<CameraDeviceInfo>, CameraError> {
    let cameras = query(nokhwa::utils::ApiBackend::Video4Linux)
        .map_err(|e| CameraError::HardwareUnavailable(format!("Failed to query cameras: {}", e)))?;

    let mut device_list = Vec::new();
    for camera_info in cameras {
        let device =
            CameraDeviceInfo::new(camera_info.index().to_string(), camera_info.human_name())
                .with_description(camera_info.description().to_string());
        device_list.push(device);
    }

    Ok(device_list)
}

/// Linux camera wrapper over the V4L2 backend.
pub struct LinuxCamera {
    camera: Arc<Mutex<CallbackCamera>>,
    device_id: String,
}

/// Open a camera on Linux with the V4L2 backend.
pub fn open_camera(device_id: &str, _format: &CameraFormat) -> Result<LinuxCamera, CameraError> {
    let device_index = device_id
        .parse::<u32>()
        .map_err(|_| CameraError::DeviceUnavailable(format!("Invalid device ID: {}", device_id)))?;

    // Simple format request for V4L2
    let requested_format = RequestedFormat::new::<RgbFormat>(RequestedFormatType::None);

    let camera = CallbackCamera::new(
        nokhwa::utils::CameraIndex::Index(device_index),
        requested_format,
        |_| {},
    )
    .map_err(|e| CameraError::DeviceUnavailable(format!("Failed to open camera: {}", e)))?;

    Ok(LinuxCamera {
        camera: Arc::new(Mutex::new(camera)),
        device_id: device_id.to_string(),
    })
}

impl LinuxCamera {
    pub fn capture_frame(&self) -> Result<CameraFrame, CameraError> {
        let mut camera = self
            .camera
            .lock()
            .map_err(|_| CameraError::DeviceUnavailable("Failed to lock camera".to_string()))?;

        let frame = camera
            .poll_frame()
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
        self.camera
            .lock()
            .map(|c| c.is_stream_open())
            .unwrap_or(false)
    }

    pub fn start_stream(&self) -> Result<(), CameraError> {
        let mut camera = self
            .camera
            .lock()
            .map_err(|_| CameraError::DeviceUnavailable("Failed to lock camera".to_string()))?;

        camera
            .open_stream()
            .map_err(|e| CameraError::DeviceUnavailable(format!("Failed to start stream: {}", e)))?;

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

        Ok(())
    }

    /// V4L2 zoom is not wired through nokhwa, so zoom stays digital and the
    /// request is only recorded here.
    pub fn set_zoom(&self, factor: f32) -> Result<(), CameraError> {
        log::debug!("Linux camera {}: zoom {} noted", self.device_id, factor);
        Ok(())
    }

    pub fn set_focus_point(&self, x: f32, y: f32) -> Result<(), CameraError> {
        log::debug!(
            "Linux camera {}: focus point ({}, {}) noted",
            self.device_id,
            x,
            y
        );
        Ok(())
    }

    pub fn set_torch(&self, enabled: bool) -> Result<(), CameraError> {
        log::debug!("Linux camera {}: torch {} noted", self.device_id, enabled);
        Ok(())
    }
}

// Ensure the camera is properly cleaned up
impl Drop for LinuxCamera {
    fn drop(&mut self) {
        if let Ok(mut camera) = self.camera.lock() {
            let _ = camera.stop_stream();
        }
    }
}

// Thread-safe implementation
unsafe impl Send for LinuxCamera {}
unsafe impl Sync for LinuxCamera {}
