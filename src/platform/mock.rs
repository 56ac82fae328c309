//! Mock capture backend for hardware-free environments.
//!
//! Enabled by setting `CAMERA_PREVIEW_USE_MOCK=1` or by calling
//! [`force_mock_mode`] from tests. The mock is configurable enough to exercise
//! every session path: device sets, capture failures, sensor orientation, and
//! capture latency.

use crate::errors::CameraError;
use crate::types::{CameraDeviceInfo, CameraFrame, DeviceCapabilities, FrameOrientation};
use std::sync::Mutex as SyncMutex;
use std::time::Duration;

/// Which mock devices are plugged in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockDevices {
    FrontAndRear,
    FrontOnly,
    RearOnly,
    None,
}

#[derive(Debug, Clone)]
pub struct MockState {
    pub forced: bool,
    pub devices: MockDevices,
    pub open_fails: bool,
    pub capture_fails: bool,
    pub capture_delay: Duration,
    pub frame_orientation: FrameOrientation,
    pub frame_mirrored: bool,
    pub frame_size: (u32, u32),
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            forced: false,
            devices: MockDevices::FrontAndRear,
            open_fails: false,
            capture_fails: false,
            capture_delay: Duration::ZERO,
            frame_orientation: FrameOrientation::LandscapeLeft,
            frame_mirrored: false,
            frame_size: (640, 480),
        }
    }
}

lazy_static::lazy_static! {
    static ref MOCK_STATE: SyncMutex<MockState> = SyncMutex::new(MockState::default());
}

fn lock_state() -> std::sync::MutexGuard<'static, MockState> {
    MOCK_STATE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Adjust the mock configuration.
pub fn configure<F: FnOnce(&mut MockState)>(adjust: F) {
    adjust(&mut lock_state());
}

/// Reset the mock to its default configuration, keeping forced mode.
pub fn reset() {
    let mut state = lock_state();
    let forced = state.forced;
    *state = MockState::default();
    state.forced = forced;
}

/// Force mock mode on or off without touching the environment.
pub fn force_mock_mode(enabled: bool) {
    lock_state().forced = enabled;
}

pub fn is_forced() -> bool {
    lock_state().forced
}

fn snapshot() -> MockState {
    lock_state().clone()
}

/// Enumerate the configured mock devices.
pub fn mock_devices() -> Vec<CameraDeviceInfo> {
    let state = snapshot();

    let front = CameraDeviceInfo::new("mock-front".to_string(), "Mock Front Camera".to_string())
        .with_description("Synthetic user-facing camera".to_string())
        .with_capabilities(DeviceCapabilities {
            min_zoom: 1.0,
            max_zoom: 2.0,
            has_torch: false,
        });

    let rear = CameraDeviceInfo::new("mock-rear".to_string(), "Mock Rear Camera".to_string())
        .with_description("Synthetic environment-facing camera".to_string())
        .with_capabilities(DeviceCapabilities {
            min_zoom: 1.0,
            max_zoom: 4.0,
            has_torch: true,
        });

    match state.devices {
        MockDevices::FrontAndRear => vec![front, rear],
        MockDevices::FrontOnly => vec![front],
        MockDevices::RearOnly => vec![rear],
        MockDevices::None => Vec::new(),
    }
}

/// Synthetic camera producing gradient frames.
pub struct MockCamera {
    device_id: String,
    streaming: bool,
    frame_index: u64,
}

impl MockCamera {
    pub fn open(device_id: &str) -> Result<Self, CameraError> {
        let state = snapshot();
        if state.open_fails {
            return Err(CameraError::DeviceUnavailable(format!(
                "mock device {} refused to open",
                device_id
            )));
        }

        log::debug!("Opened mock camera {}", device_id);
        Ok(Self {
            device_id: device_id.to_string(),
            streaming: false,
            frame_index: 0,
        })
    }

    pub fn start_stream(&mut self) -> Result<(), CameraError> {
        self.streaming = true;
        Ok(())
    }

    pub fn stop_stream(&mut self) -> Result<(), CameraError> {
        self.streaming = false;
        Ok(())
    }

    pub fn is_available(&self) -> bool {
        self.streaming
    }

    pub fn get_device_id(&self) -> &str {
        &self.device_id
    }

    pub fn capture_frame(&mut self) -> Result<CameraFrame, CameraError> {
        if !self.streaming {
            return Err(CameraError::DeviceUnavailable(
                "mock stream is not open".to_string(),
            ));
        }

        let state = snapshot();
        if !state.capture_delay.is_zero() {
            std::thread::sleep(state.capture_delay);
        }
        if state.capture_fails {
            return Err(CameraError::DeviceUnavailable(
                "mock sensor fault".to_string(),
            ));
        }

        let (width, height) = state.frame_size;
        let data = gradient_frame(width, height, self.frame_index);
        self.frame_index = self.frame_index.wrapping_add(1);

        Ok(
            CameraFrame::new(data, width, height, self.device_id.clone())
                .with_orientation(state.frame_orientation)
                .with_mirrored(state.frame_mirrored),
        )
    }
}

/// RGB gradient with a per-frame phase so consecutive frames differ.
fn gradient_frame(width: u32, height: u32, index: u64) -> Vec<u8> {
    let mut data = Vec::with_capacity((width * height * 3) as usize);
    let phase = (index % 256) as u32;
    for y in 0..height {
        for x in 0..width {
            data.push(((x * 255) / width.max(1)) as u8);
            data.push(((y * 255) / height.max(1)) as u8);
            data.push(((x + y + phase) % 256) as u8);
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gradient_frame_size() {
        let data = gradient_frame(8, 4, 0);
        assert_eq!(data.len(), 8 * 4 * 3);
    }

    #[test]
    fn test_consecutive_frames_differ() {
        let first = gradient_frame(8, 4, 0);
        let second = gradient_frame(8, 4, 1);
        assert_ne!(first, second);
    }

    #[test]
    fn test_capture_requires_stream() {
        let _guard = crate::test_support::lock();
        reset();
        let mut camera = MockCamera::open("mock-rear").unwrap();
        assert!(camera.capture_frame().is_err());

        camera.start_stream().unwrap();
        let frame = camera.capture_frame().unwrap();
        assert_eq!(frame.width, 640);
        assert_eq!(frame.height, 480);
        assert_eq!(frame.device_id, "mock-rear");
    }

    #[test]
    fn test_device_set_is_configurable() {
        let _guard = crate::test_support::lock();
        reset();
        configure(|state| state.devices = MockDevices::FrontOnly);
        let devices = mock_devices();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].id, "mock-front");

        configure(|state| state.devices = MockDevices::None);
        assert!(mock_devices().is_empty());
        reset();
    }

    #[test]
    fn test_rear_mock_has_torch_and_wider_zoom() {
        let _guard = crate::test_support::lock();
        reset();
        let devices = mock_devices();
        let rear = devices.iter().find(|d| d.id == "mock-rear").unwrap();
        assert!(rear.capabilities.has_torch);
        assert_eq!(rear.capabilities.max_zoom, 4.0);

        let front = devices.iter().find(|d| d.id == "mock-front").unwrap();
        assert!(!front.capabilities.has_torch);
    }
}
