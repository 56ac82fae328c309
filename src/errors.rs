use std::fmt;

#[derive(Debug, Clone)]
pub enum CameraError {
    PermissionDenied(String),
    HardwareUnavailable(String),
    DeviceUnavailable(String),
    NotInitialized(String),
    AlreadyRunning(String),
    CaptureInProgress(String),
    RecordingInProgress(String),
    NotRecording(String),
    EncodeOrWriteFailure(String),
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CameraError::PermissionDenied(msg) => write!(f, "Camera permission denied: {}", msg),
            CameraError::HardwareUnavailable(msg) => {
                write!(f, "No camera hardware available: {}", msg)
            }
            CameraError::DeviceUnavailable(msg) => write!(f, "Camera device unavailable: {}", msg),
            CameraError::NotInitialized(msg) => write!(f, "Camera not initialized: {}", msg),
            CameraError::AlreadyRunning(msg) => write!(f, "Camera already running: {}", msg),
            CameraError::CaptureInProgress(msg) => write!(f, "Capture in progress: {}", msg),
            CameraError::RecordingInProgress(msg) => write!(f, "Recording in progress: {}", msg),
            CameraError::NotRecording(msg) => write!(f, "No active recording: {}", msg),
            CameraError::EncodeOrWriteFailure(msg) => {
                write!(f, "Failed to encode or write capture: {}", msg)
            }
        }
    }
}

impl std::error::Error for CameraError {}
