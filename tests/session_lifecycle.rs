//! End-to-end walks over the host-facing command surface.
//!
//! Every test drives the mock capture backend, so no camera hardware or OS
//! permission grant is required. The commands share one process-wide session;
//! a file-local lock keeps the walks from interleaving.

#[cfg(test)]
mod session_lifecycle_tests {
    use std::sync::{Mutex, MutexGuard};
    use std::time::Duration;

    use tauri_plugin_camera_preview::commands::capture::{
        capture_photo, start_record, stop_record, take_photo,
    };
    use tauri_plugin_camera_preview::commands::controls::{
        enable_torch, focus, get_flash_modes, is_torch_available, is_torch_on, max_available_zoom,
        min_available_zoom, set_flash_mode, set_quality, zoom,
    };
    use tauri_plugin_camera_preview::commands::permissions::check_camera_permission;
    use tauri_plugin_camera_preview::commands::preview::{
        flip_camera, get_available_devices, get_session_state, start_preview, stop_preview,
    };
    use tauri_plugin_camera_preview::config::PluginConfig;
    use tauri_plugin_camera_preview::events::bus;
    use tauri_plugin_camera_preview::permissions::PermissionStatus;
    use tauri_plugin_camera_preview::platform::mock;
    use tauri_plugin_camera_preview::session;
    use tokio::time::timeout;

    const EVENT_WAIT: Duration = Duration::from_secs(5);

    static SERIAL: Mutex<()> = Mutex::new(());

    fn serial() -> MutexGuard<'static, ()> {
        SERIAL.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn reset_to_idle() {
        mock::force_mock_mode(true);
        mock::reset();
        session::shutdown().await;

        let mut config = PluginConfig::default();
        config.camera.warmup_frames = 0;
        config.camera.default_resolution = [320, 240];
        session::apply_config(config).await;
    }

    #[tokio::test]
    async fn test_stopped_session_accepts_a_fresh_start() {
        let _serial = serial();
        reset_to_idle().await;

        assert_eq!(get_session_state().await.unwrap(), "idle");
        assert_eq!(start_preview(None).await.unwrap(), "previewing");
        assert_eq!(get_session_state().await.unwrap(), "previewing");
        assert_eq!(stop_preview().await.unwrap(), "idle");

        assert_eq!(start_preview(None).await.unwrap(), "previewing");
        assert_eq!(stop_preview().await.unwrap(), "idle");
    }

    #[tokio::test]
    async fn test_idle_session_rejects_every_operation() {
        let _serial = serial();
        reset_to_idle().await;

        assert!(take_photo().await.is_err());
        assert!(capture_photo().await.is_err());
        assert!(start_record().await.is_err());
        assert!(stop_record().await.is_err());
        assert!(flip_camera().await.is_err());
        assert!(zoom(2.0).await.is_err());
        assert!(focus(0.5, 0.5).await.is_err());
        assert!(get_flash_modes().await.is_err());
        assert!(set_flash_mode("off".to_string()).await.is_err());
        assert!(enable_torch(true).await.is_err());
        assert!(is_torch_on().await.is_err());
        assert!(is_torch_available().await.is_err());
        assert!(min_available_zoom().await.is_err());
        assert!(max_available_zoom().await.is_err());
        assert!(set_quality("low".to_string()).await.is_err());

        let message = stop_preview().await.unwrap_err();
        assert!(
            message.contains("Preview has not been started"),
            "unexpected error text: {}",
            message
        );
        assert_eq!(get_session_state().await.unwrap(), "idle");
    }

    #[tokio::test]
    async fn test_photo_commands_write_files_and_emit_events() {
        let _serial = serial();
        reset_to_idle().await;

        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = PluginConfig::default();
        config.camera.warmup_frames = 0;
        config.camera.default_resolution = [320, 240];
        config.storage.output_directory = dir.path().display().to_string();
        config.storage.filename_prefix = "lifecycle".to_string();
        session::apply_config(config).await;

        start_preview(None).await.expect("preview should start");
        let mut events = bus().subscribe();

        take_photo().await.expect("take_photo should be accepted");
        let event = timeout(EVENT_WAIT, events.recv())
            .await
            .expect("photo event should arrive")
            .expect("bus should stay open");
        assert_eq!(event.channel(), "capturePhotoFinished");
        let result = event.result();
        assert!(result.is_success(), "got {:?}", result.error_message);

        let uri = result.file_path.as_deref().unwrap_or_default();
        assert!(uri.starts_with("file://"), "got {}", uri);
        let path = uri.trim_start_matches("file://");
        assert!(path.contains("lifecycle"), "prefix missing from {}", path);
        let written = std::fs::metadata(path).expect("photo file should exist");
        assert!(written.len() > 0, "photo file should not be empty");

        // The legacy alias behaves exactly like take_photo.
        capture_photo().await.expect("capture_photo should be accepted");
        let event = timeout(EVENT_WAIT, events.recv())
            .await
            .expect("alias event should arrive")
            .expect("bus should stay open");
        assert_eq!(event.channel(), "capturePhotoFinished");
        assert!(event.result().is_success());

        stop_preview().await.expect("preview should stop");
    }

    #[tokio::test]
    async fn test_front_direction_option_and_flip() {
        let _serial = serial();
        reset_to_idle().await;

        let state = start_preview(Some(serde_json::json!({ "direction": "front" })))
            .await
            .expect("front preview should start");
        assert_eq!(state, "previewing");

        assert_eq!(get_flash_modes().await.expect("modes"), vec!["off"]);
        assert!(!is_torch_available().await.expect("availability").result);

        assert_eq!(flip_camera().await.expect("flip"), "rear");
        assert_eq!(
            get_flash_modes().await.expect("modes"),
            vec!["off", "on", "auto", "torch"]
        );

        stop_preview().await.expect("preview should stop");
    }

    #[tokio::test]
    async fn test_control_payload_shapes_and_argument_parsing() {
        let _serial = serial();
        reset_to_idle().await;

        start_preview(None).await.expect("preview should start");

        assert_eq!(min_available_zoom().await.expect("min").result, 1.0);
        assert_eq!(max_available_zoom().await.expect("max").result, 4.0);
        assert_eq!(zoom(10.0).await.expect("zoom").result, 4.0);

        let point = focus(-0.2, 1.7).await.expect("focus");
        assert_eq!((point.x, point.y), (0.0, 1.0));

        assert!(is_torch_available().await.expect("availability").result);
        assert!(enable_torch(true).await.expect("torch on").result);
        assert!(is_torch_on().await.expect("lamp state").result);

        set_flash_mode("auto".to_string())
            .await
            .expect("valid flash mode");
        let parse_error = set_flash_mode("strobe".to_string()).await.unwrap_err();
        assert!(
            parse_error.contains("Unknown flash mode"),
            "got {}",
            parse_error
        );

        set_quality("low".to_string()).await.expect("valid profile");
        set_quality("high".to_string())
            .await
            .expect("high is an accepted spelling");
        let parse_error = set_quality("ultra".to_string()).await.unwrap_err();
        assert!(
            parse_error.contains("Unknown quality profile"),
            "got {}",
            parse_error
        );

        stop_preview().await.expect("preview should stop");
    }

    #[tokio::test]
    async fn test_mock_backend_grants_permission_and_lists_devices() {
        let _serial = serial();
        reset_to_idle().await;

        let info = check_camera_permission()
            .await
            .expect("permission check should succeed");
        assert_eq!(info.status, PermissionStatus::Granted);

        let devices = get_available_devices().await.expect("device listing");
        assert_eq!(devices.len(), 2, "mock exposes a front and a rear camera");
        assert!(devices.iter().any(|d| d.id == "mock-front"));
        assert!(devices.iter().any(|d| d.id == "mock-rear"));
    }
}
