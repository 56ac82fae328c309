use crate::errors::CameraError;

/// Permission status enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PermissionStatus {
    /// Permission granted
    Granted,
    /// Permission denied
    Denied,
    /// Permission not determined (user hasn't been asked yet)
    NotDetermined,
    /// Permission restricted (parental controls, etc)
    Restricted,
}

impl std::fmt::Display for PermissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionStatus::Granted => write!(f, "granted"),
            PermissionStatus::Denied => write!(f, "denied"),
            PermissionStatus::NotDetermined => write!(f, "not_determined"),
            PermissionStatus::Restricted => write!(f, "restricted"),
        }
    }
}

/// Detailed permission information
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionInfo {
    pub status: PermissionStatus,
    pub message: String,
    pub can_request: bool,
}

/// Check camera permission status
/// Returns permission status for the current platform
pub fn check_permission() -> PermissionStatus {
    check_permission_detailed().status
}

/// Check camera permission status with detailed information
pub fn check_permission_detailed() -> PermissionInfo {
    if crate::platform::mock_enabled() {
        return PermissionInfo {
            status: PermissionStatus::Granted,
            message: "Mock backend active - no OS permission needed".to_string(),
            can_request: false,
        };
    }

    #[cfg(target_os = "windows")]
    {
        check_permission_windows()
    }

    #[cfg(target_os = "macos")]
    {
        check_permission_macos()
    }

    #[cfg(target_os = "linux")]
    {
        check_permission_linux()
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
    {
        PermissionInfo {
            status: PermissionStatus::NotDetermined,
            message: "Platform not supported".to_string(),
            can_request: false,
        }
    }
}

/// Ask the OS for camera access.
///
/// Only macOS has a programmatic request dialog. Windows and Linux return
/// guidance pointing at the relevant system setting.
pub async fn request_permission() -> Result<PermissionInfo, CameraError> {
    log::info!("Requesting camera permission");

    let current = check_permission_detailed();

    if current.status == PermissionStatus::Granted {
        log::info!("Permission already granted");
        return Ok(current);
    }

    if !current.can_request {
        log::warn!("Cannot request permission: {}", current.message);
        return Ok(current);
    }

    #[cfg(target_os = "macos")]
    {
        request_permission_macos().await
    }

    #[cfg(target_os = "windows")]
    {
        // Windows doesn't have programmatic permission request
        // User must enable in Settings > Privacy > Camera
        Ok(PermissionInfo {
            status: PermissionStatus::NotDetermined,
            message: "Please enable camera access in Windows Settings > Privacy > Camera"
                .to_string(),
            can_request: false,
        })
    }

    #[cfg(target_os = "linux")]
    {
        // Linux permissions are group-based
        // User must add themselves to video group
        Ok(PermissionInfo {
            status: PermissionStatus::NotDetermined,
            message: "Run: sudo usermod -a -G video $USER && newgrp video".to_string(),
            can_request: false,
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
    {
        Err(CameraError::PermissionDenied(
            "Platform not supported".to_string(),
        ))
    }
}

#[cfg(target_os = "windows")]
fn check_permission_windows() -> PermissionInfo {
    // On Windows 10+, camera access is controlled by Privacy settings
    // Check if we can enumerate devices as a proxy for permission
    use nokhwa::query;

    match query(nokhwa::utils::ApiBackend::Auto) {
        Ok(devices) if !devices.is_empty() => PermissionInfo {
            status: PermissionStatus::Granted,
            message: "Camera access granted via Windows Privacy settings".to_string(),
            can_request: false,
        },
        Ok(_) => PermissionInfo {
            status: PermissionStatus::NotDetermined,
            message: "No cameras found - permission may not be granted".to_string(),
            can_request: true,
        },
        Err(e) => PermissionInfo {
            status: PermissionStatus::Denied,
            message: format!("Camera access denied: {}", e),
            can_request: true,
        },
    }
}

#[cfg(target_os = "macos")]
fn check_permission_macos() -> PermissionInfo {
    use objc::runtime::{Class, Object};
    use objc::{msg_send, sel, sel_impl};
    use std::ffi::CString;

    unsafe {
        // Get AVCaptureDevice class
        let av_capture_device_class = Class::get("AVCaptureDevice");

        if av_capture_device_class.is_none() {
            return PermissionInfo {
                status: PermissionStatus::NotDetermined,
                message: "AVFoundation not available".to_string(),
                can_request: false,
            };
        }

        let av_capture_device_class = av_capture_device_class.unwrap();

        // Get media type for video
        let av_media_type_video = CString::new("vide").unwrap();
        let media_type: *mut Object =
            msg_send![av_capture_device_class, mediaTypeForString: av_media_type_video.as_ptr()];

        // Check authorization status
        let auth_status: i64 =
            msg_send![av_capture_device_class, authorizationStatusForMediaType: media_type];

        // AVAuthorizationStatus enum values:
        // 0 = NotDetermined
        // 1 = Restricted
        // 2 = Denied
        // 3 = Authorized

        match auth_status {
            3 => PermissionInfo {
                status: PermissionStatus::Granted,
                message: "Camera access authorized".to_string(),
                can_request: false,
            },
            2 => PermissionInfo {
                status: PermissionStatus::Denied,
                message: "Camera access denied - enable in System Preferences > Security & Privacy > Camera".to_string(),
                can_request: false,
            },
            1 => PermissionInfo {
                status: PermissionStatus::Restricted,
                message: "Camera access restricted by system policy".to_string(),
                can_request: false,
            },
            _ => PermissionInfo {
                status: PermissionStatus::NotDetermined,
                message: "Camera permission not yet requested".to_string(),
                can_request: true,
            },
        }
    }
}

#[cfg(target_os = "macos")]
async fn request_permission_macos() -> Result<PermissionInfo, CameraError> {
    log::info!("Requesting macOS camera permission");

    // The completion handler fires on an AVFoundation queue, so the whole
    // request-and-wait runs off the async runtime.
    let granted = tokio::task::spawn_blocking(|| {
        use block::ConcreteBlock;
        use objc::runtime::{Class, Object};
        use objc::{msg_send, sel, sel_impl};
        use std::ffi::CString;
        use std::sync::mpsc;
        use std::time::Duration;

        unsafe {
            let av_capture_device_class = Class::get("AVCaptureDevice").ok_or_else(|| {
                CameraError::PermissionDenied("AVFoundation not available".to_string())
            })?;

            let av_media_type_video = CString::new("vide").unwrap();
            let media_type: *mut Object = msg_send![
                av_capture_device_class,
                mediaTypeForString: av_media_type_video.as_ptr()
            ];

            let (tx, rx) = mpsc::channel();

            let tx_clone = tx.clone();
            let handler = ConcreteBlock::new(move |granted: bool| {
                let _ = tx_clone.send(granted);
            });
            // Copy the block to the heap so it survives the async callback
            let handler = handler.copy();

            // Request access (this will show system dialog)
            let _: () = msg_send![
                av_capture_device_class,
                requestAccessForMediaType: media_type
                completionHandler: &*handler
            ];

            // Wait for user response (with timeout)
            rx.recv_timeout(Duration::from_secs(60)).map_err(|_| {
                CameraError::PermissionDenied("Permission request timed out".to_string())
            })
        }
    })
    .await
    .map_err(|e| CameraError::PermissionDenied(format!("Permission task failed: {}", e)))??;

    if granted {
        log::info!("Camera permission granted");
        Ok(PermissionInfo {
            status: PermissionStatus::Granted,
            message: "Camera access authorized".to_string(),
            can_request: false,
        })
    } else {
        log::warn!("Camera permission denied");
        Ok(PermissionInfo {
            status: PermissionStatus::Denied,
            message: "Camera access denied by user".to_string(),
            can_request: false,
        })
    }
}

#[cfg(target_os = "linux")]
fn check_permission_linux() -> PermissionInfo {
    use std::fs;
    use std::path::Path;

    // Check if any video devices exist
    let video_devices: Vec<_> = (0..10)
        .map(|i| format!("/dev/video{}", i))
        .filter(|path| Path::new(path).exists())
        .collect();

    if video_devices.is_empty() {
        return PermissionInfo {
            status: PermissionStatus::NotDetermined,
            message: "No video devices found at /dev/video*".to_string(),
            can_request: false,
        };
    }

    // Check if we can read from first video device
    let first_device = &video_devices[0];
    match fs::metadata(first_device) {
        Ok(_metadata) => {
            // Check if we have read permission (via group membership)
            if check_linux_group_membership() {
                PermissionInfo {
                    status: PermissionStatus::Granted,
                    message: format!(
                        "Camera access granted (user in video group, {} found)",
                        first_device
                    ),
                    can_request: false,
                }
            } else {
                PermissionInfo {
                    status: PermissionStatus::Denied,
                    message: format!("Camera device {} exists but user not in video group - run: sudo usermod -a -G video $USER", first_device),
                    can_request: true,
                }
            }
        }
        Err(e) => PermissionInfo {
            status: PermissionStatus::Denied,
            message: format!("Cannot access {}: {}", first_device, e),
            can_request: true,
        },
    }
}

#[cfg(target_os = "linux")]
fn check_linux_group_membership() -> bool {
    use std::process::Command;

    // Check if user is in 'video' or 'plugdev' group
    let output = Command::new("groups").output().ok();

    if let Some(output) = output {
        if let Ok(groups) = String::from_utf8(output.stdout) {
            return groups.contains("video") || groups.contains("plugdev");
        }
    }

    // Fallback: assume permission if we can't check groups
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display_strings() {
        assert_eq!(PermissionStatus::Granted.to_string(), "granted");
        assert_eq!(PermissionStatus::Denied.to_string(), "denied");
        assert_eq!(PermissionStatus::NotDetermined.to_string(), "not_determined");
        assert_eq!(PermissionStatus::Restricted.to_string(), "restricted");
    }

    #[test]
    fn test_mock_backend_reports_granted() {
        let _guard = crate::test_support::lock();
        crate::platform::mock::force_mock_mode(true);
        let info = check_permission_detailed();
        assert_eq!(info.status, PermissionStatus::Granted);
        assert!(!info.can_request);
        crate::platform::mock::force_mock_mode(false);
    }

    #[test]
    fn test_permission_info_serializes_camel_case() {
        let info = PermissionInfo {
            status: PermissionStatus::Granted,
            message: "ok".to_string(),
            can_request: false,
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["status"], "Granted");
        assert_eq!(json["canRequest"], false);
    }
}
