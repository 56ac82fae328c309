use crate::session;
use tauri::command;

/// Take a photo with the session's current settings.
///
/// Resolves once the capture is accepted; the result arrives through the
/// `capturePhotoFinished` event.
#[command]
pub async fn take_photo() -> Result<(), String> {
    session::take_photo().await.map_err(|e| e.to_string())
}

/// Alias of `take_photo`, preserved for hosts using the older name.
#[command]
pub async fn capture_photo() -> Result<(), String> {
    session::take_photo().await.map_err(|e| e.to_string())
}

/// Start recording video from the preview stream.
///
/// Resolves once the recording worker is running; the finished file arrives
/// through the `captureVideoFinished` event after `stop_record`.
#[command]
pub async fn start_record() -> Result<(), String> {
    match session::start_record().await {
        Ok(()) => Ok(()),
        Err(e) => {
            log::error!("Failed to start recording: {}", e);
            Err(e.to_string())
        }
    }
}

/// Stop the active recording and finalize the file.
#[command]
pub async fn stop_record() -> Result<(), String> {
    match session::stop_record().await {
        Ok(()) => Ok(()),
        Err(e) => {
            log::error!("Failed to stop recording: {}", e);
            Err(e.to_string())
        }
    }
}
