//! Device enumeration and direction-based selection.
//!
//! Desktop platforms do not report which way a camera faces, so selection
//! works off name markers first and falls back to enumeration order.

use crate::errors::CameraError;
use crate::platform;
use crate::types::{CameraDeviceInfo, CameraDirection};

/// Name fragments that identify a user-facing camera.
const FRONT_MARKERS: [&str; 4] = ["front", "user", "integrated", "facetime"];

/// Name fragments that identify an environment-facing camera.
const REAR_MARKERS: [&str; 4] = ["back", "rear", "environment", "world"];

fn matches_markers(device: &CameraDeviceInfo, markers: &[&str]) -> bool {
    let haystack = format!(
        "{} {}",
        device.name.to_lowercase(),
        device.description.as_deref().unwrap_or("").to_lowercase()
    );
    markers.iter().any(|marker| haystack.contains(marker))
}

fn marker_set(direction: CameraDirection) -> (&'static [&'static str], &'static [&'static str]) {
    match direction {
        CameraDirection::Front => (&FRONT_MARKERS, &REAR_MARKERS),
        CameraDirection::Rear => (&REAR_MARKERS, &FRONT_MARKERS),
    }
}

/// Pick the device for a direction from an enumerated list.
///
/// A device whose name carries a matching marker wins. Otherwise devices not
/// marked for the opposite direction are taken in enumeration order, with the
/// front camera first. An empty list means no camera hardware at all.
pub fn select_from(
    devices: &[CameraDeviceInfo],
    direction: CameraDirection,
) -> Result<CameraDeviceInfo, CameraError> {
    if devices.is_empty() {
        return Err(CameraError::HardwareUnavailable(
            "No cameras detected".to_string(),
        ));
    }

    let (wanted, opposite) = marker_set(direction);

    if let Some(device) = devices.iter().find(|d| matches_markers(d, wanted)) {
        return Ok(device.clone());
    }

    let neutral: Vec<&CameraDeviceInfo> = devices
        .iter()
        .filter(|d| !matches_markers(d, opposite))
        .collect();

    let picked = match direction {
        CameraDirection::Front => neutral.first(),
        CameraDirection::Rear => {
            if neutral.len() >= 2 {
                neutral.get(1)
            } else {
                neutral.first()
            }
        }
    };

    match picked {
        Some(device) => Ok((*device).clone()),
        None => Err(CameraError::DeviceUnavailable(format!(
            "No {} camera available",
            direction
        ))),
    }
}

/// Enumerate devices and pick the one for a direction.
pub fn select_device(direction: CameraDirection) -> Result<CameraDeviceInfo, CameraError> {
    let devices = platform::list_devices()?;
    let device = select_from(&devices, direction)?;
    log::info!(
        "Selected {} camera: {} ({})",
        direction,
        device.name,
        device.id
    );
    Ok(device)
}

/// Enumerate all devices on the active backend.
pub fn list_devices() -> Result<Vec<CameraDeviceInfo>, CameraError> {
    platform::list_devices()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(id: &str, name: &str) -> CameraDeviceInfo {
        CameraDeviceInfo::new(id.to_string(), name.to_string())
    }

    #[test]
    fn test_empty_list_is_hardware_unavailable() {
        let result = select_from(&[], CameraDirection::Rear);
        assert!(matches!(result, Err(CameraError::HardwareUnavailable(_))));
    }

    #[test]
    fn test_marker_match_wins_over_order() {
        let devices = vec![
            device("0", "USB Capture Dongle"),
            device("1", "Back Camera"),
            device("2", "Front Camera"),
        ];

        let rear = select_from(&devices, CameraDirection::Rear).unwrap();
        assert_eq!(rear.id, "1");

        let front = select_from(&devices, CameraDirection::Front).unwrap();
        assert_eq!(front.id, "2");
    }

    #[test]
    fn test_markers_are_case_insensitive() {
        let devices = vec![device("0", "FaceTime HD Camera")];
        let front = select_from(&devices, CameraDirection::Front).unwrap();
        assert_eq!(front.id, "0");
    }

    #[test]
    fn test_single_unmarked_device_serves_both_directions() {
        let devices = vec![device("0", "HD Webcam C920")];

        assert_eq!(
            select_from(&devices, CameraDirection::Front).unwrap().id,
            "0"
        );
        assert_eq!(
            select_from(&devices, CameraDirection::Rear).unwrap().id,
            "0"
        );
    }

    #[test]
    fn test_unmarked_devices_fall_back_to_order() {
        let devices = vec![device("0", "Webcam A"), device("1", "Webcam B")];

        assert_eq!(
            select_from(&devices, CameraDirection::Front).unwrap().id,
            "0"
        );
        assert_eq!(
            select_from(&devices, CameraDirection::Rear).unwrap().id,
            "1"
        );
    }

    #[test]
    fn test_opposite_marked_device_is_not_selected() {
        let devices = vec![device("0", "Front Camera")];
        let result = select_from(&devices, CameraDirection::Rear);
        assert!(matches!(result, Err(CameraError::DeviceUnavailable(_))));
    }

    #[test]
    fn test_description_markers_count() {
        let devices = vec![
            device("0", "Camera 1").with_description("rear module".to_string()),
            device("1", "Camera 2"),
        ];
        let rear = select_from(&devices, CameraDirection::Rear).unwrap();
        assert_eq!(rear.id, "0");
    }
}
