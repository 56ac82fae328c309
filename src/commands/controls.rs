use crate::session;
use crate::settings::QualityProfile;
use crate::types::FlashMode;
use serde::{Deserialize, Serialize};
use tauri::command;

/// Single-value response payload, matching the host-facing `{ result }` shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultPayload<T> {
    pub result: T,
}

/// Applied focus point in normalized coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusPoint {
    pub x: f32,
    pub y: f32,
}

/// Set the focus point of interest. Coordinates are clamped into [0, 1].
#[command]
pub async fn focus(x: f32, y: f32) -> Result<FocusPoint, String> {
    let (x, y) = session::focus(x, y).await.map_err(|e| e.to_string())?;
    Ok(FocusPoint { x, y })
}

/// Set the zoom factor. Returns the factor actually applied after clamping.
#[command]
pub async fn zoom(factor: f32) -> Result<ResultPayload<f32>, String> {
    let result = session::zoom(factor).await.map_err(|e| e.to_string())?;
    Ok(ResultPayload { result })
}

#[command]
pub async fn min_available_zoom() -> Result<ResultPayload<f32>, String> {
    let result = session::min_zoom().await.map_err(|e| e.to_string())?;
    Ok(ResultPayload { result })
}

#[command]
pub async fn max_available_zoom() -> Result<ResultPayload<f32>, String> {
    let result = session::max_zoom().await.map_err(|e| e.to_string())?;
    Ok(ResultPayload { result })
}

/// Flash modes the selected device supports.
#[command]
pub async fn get_flash_modes() -> Result<Vec<String>, String> {
    session::flash_modes().await.map_err(|e| e.to_string())
}

/// Record the flash mode for subsequent captures.
#[command]
pub async fn set_flash_mode(mode: String) -> Result<(), String> {
    let mode: FlashMode = mode.parse()?;
    session::set_flash_mode(mode).await.map_err(|e| e.to_string())
}

#[command]
pub async fn is_torch_on() -> Result<ResultPayload<bool>, String> {
    let result = session::is_torch_on().await.map_err(|e| e.to_string())?;
    Ok(ResultPayload { result })
}

/// Switch the torch lamp. Returns the resulting lamp state.
#[command]
pub async fn enable_torch(enable: bool) -> Result<ResultPayload<bool>, String> {
    let result = session::enable_torch(enable)
        .await
        .map_err(|e| e.to_string())?;
    Ok(ResultPayload { result })
}

#[command]
pub async fn is_torch_available() -> Result<ResultPayload<bool>, String> {
    let result = session::is_torch_available()
        .await
        .map_err(|e| e.to_string())?;
    Ok(ResultPayload { result })
}

/// Switch the capture quality profile (`low` or `hq`).
#[command]
pub async fn set_quality(quality: String) -> Result<(), String> {
    let profile: QualityProfile = quality.parse()?;
    session::set_quality(profile).await.map_err(|e| e.to_string())
}
