use crate::session;
use crate::types::CameraDeviceInfo;
use tauri::command;

/// Start the camera preview session.
///
/// `options` is the host-supplied settings bag; missing or malformed values
/// fall back to defaults. Returns the resulting session state.
#[command]
pub async fn start_preview(options: Option<serde_json::Value>) -> Result<String, String> {
    match session::start_preview(options).await {
        Ok(state) => Ok(state.to_string()),
        Err(e) => {
            log::error!("Failed to start preview: {}", e);
            Err(e.to_string())
        }
    }
}

/// Stop the preview and release the camera.
#[command]
pub async fn stop_preview() -> Result<String, String> {
    match session::stop_preview().await {
        Ok(state) => Ok(state.to_string()),
        Err(e) => {
            log::error!("Failed to stop preview: {}", e);
            Err(e.to_string())
        }
    }
}

/// Switch between the front and rear camera. Returns the new direction.
#[command]
pub async fn flip_camera() -> Result<String, String> {
    match session::flip_camera().await {
        Ok(direction) => Ok(direction.to_string()),
        Err(e) => {
            log::error!("Failed to flip camera: {}", e);
            Err(e.to_string())
        }
    }
}

/// Current session state for diagnostics.
#[command]
pub async fn get_session_state() -> Result<String, String> {
    Ok(session::current_state().await.to_string())
}

/// Enumerate the cameras visible to the backend.
#[command]
pub async fn get_available_devices() -> Result<Vec<CameraDeviceInfo>, String> {
    let devices = tokio::task::spawn_blocking(crate::device::list_devices)
        .await
        .map_err(|e| format!("Device enumeration task failed: {}", e))?
        .map_err(|e| e.to_string())?;

    log::info!("Found {} camera devices", devices.len());
    Ok(devices)
}
