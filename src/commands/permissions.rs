use crate::permissions::{self, PermissionInfo};
use tauri::command;

/// Check camera permission status without prompting the user.
#[command]
pub async fn check_camera_permission() -> Result<PermissionInfo, String> {
    log::debug!("Checking camera permission status");
    Ok(permissions::check_permission_detailed())
}

/// Request camera permission, showing the system prompt where the platform
/// supports one.
#[command]
pub async fn request_camera_permission() -> Result<PermissionInfo, String> {
    permissions::request_permission()
        .await
        .map_err(|e| e.to_string())
}
