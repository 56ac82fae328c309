//! Camera preview plugin for Tauri applications
//!
//! This crate drives a camera preview session across desktop platforms:
//! preview lifecycle, photo capture, video recording, and the flash, torch,
//! zoom, and focus controls that go with them.
//!
//! # Features
//! - Cross-platform camera access (Windows, macOS, Linux)
//! - Single preview session with a strict lifecycle state machine
//! - Photo capture with orientation correction and mirroring
//! - H.264/MP4 video recording (behind the `recording` feature)
//! - Asynchronous capture results over app events
//! - Runtime permission checks and requests
//!
//! # Usage
//! Add this to your `Cargo.toml`:
//! ```toml
//! [dependencies]
//! tauri-plugin-camera-preview = { version = "0.1", features = ["recording"] }
//! tauri = "2.0"
//! ```
//!
//! Then in your Tauri app:
//! ```rust,ignore
//! fn main() {
//!     tauri::Builder::default()
//!         .plugin(tauri_plugin_camera_preview::init())
//!         .run(tauri::generate_context!())
//!         .expect("error while running tauri application");
//! }
//! ```
//!
//! Capture outcomes arrive asynchronously. Listen for
//! `capturePhotoFinished` and `captureVideoFinished` on the frontend; each
//! carries a `filePath` on success or an `errorMessage` on failure.
pub mod commands;
pub mod config;
pub mod device;
pub mod errors;
pub mod events;
pub mod orientation;
pub mod output;
pub mod permissions;
pub mod platform;
pub mod session;
pub mod settings;
pub mod types;

#[cfg(feature = "recording")]
pub mod recording;

// Re-exports for convenience
pub use errors::CameraError;
pub use events::{CaptureResult, PreviewEvent};
pub use session::SessionState;
pub use settings::{CaptureSettings, QualityProfile};
pub use types::{CameraDeviceInfo, CameraDirection, CameraFormat, CameraFrame, FlashMode};

use tauri::{
    plugin::{Builder, TauriPlugin},
    Emitter, Runtime,
};

/// Initialize the camera preview plugin with all commands.
pub fn init<R: Runtime>() -> TauriPlugin<R> {
    Builder::new("camera-preview")
        .invoke_handler(tauri::generate_handler![
            // Preview lifecycle commands
            commands::preview::start_preview,
            commands::preview::stop_preview,
            commands::preview::flip_camera,
            commands::preview::get_session_state,
            commands::preview::get_available_devices,
            // Capture commands
            commands::capture::take_photo,
            commands::capture::capture_photo,
            commands::capture::start_record,
            commands::capture::stop_record,
            // Control commands
            commands::controls::focus,
            commands::controls::zoom,
            commands::controls::min_available_zoom,
            commands::controls::max_available_zoom,
            commands::controls::get_flash_modes,
            commands::controls::set_flash_mode,
            commands::controls::is_torch_on,
            commands::controls::enable_torch,
            commands::controls::is_torch_available,
            commands::controls::set_quality,
            // Permission commands
            commands::permissions::check_camera_permission,
            commands::permissions::request_camera_permission,
        ])
        .setup(|app, _api| {
            log::info!("{} v{} initialized", NAME, VERSION);
            let handle = app.clone();
            tauri::async_runtime::spawn(async move {
                session::apply_config(config::PluginConfig::load_or_default()).await;
                forward_events(handle).await;
            });
            Ok(())
        })
        .build()
}

/// Forward capture events from the in-process bus to host app events.
async fn forward_events<R: Runtime>(app: tauri::AppHandle<R>) {
    use tokio::sync::broadcast::error::RecvError;

    let mut events = events::bus().subscribe();
    loop {
        match events.recv().await {
            Ok(event) => {
                if let Err(e) = app.emit(event.channel(), event.result().clone()) {
                    log::warn!("Failed to forward {} event: {}", event.channel(), e);
                }
            }
            Err(RecvError::Lagged(missed)) => {
                log::warn!("Event forwarder lagged; {} events dropped", missed);
            }
            Err(RecvError::Closed) => break,
        }
    }
}

/// Initialize logging for the camera session.
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "tauri_plugin_camera_preview=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::{Mutex, MutexGuard};

    static TEST_LOCK: Mutex<()> = Mutex::new(());

    /// Serialize tests that touch process-wide state: the mock camera
    /// configuration, the capture session, and the event bus.
    pub fn lock() -> MutexGuard<'static, ()> {
        TEST_LOCK
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
