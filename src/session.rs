//! The capture session state machine.
//!
//! One session exists per process, held in a global behind an async mutex so
//! exactly one session-affecting operation runs at a time. The lifecycle is
//! `Idle` or `Previewing`; pending photo and video captures are tracked in
//! separate slots and folded into the externally reported state. All hardware
//! I/O runs on the blocking pool, never on the caller's thread.

use crate::config::PluginConfig;
use crate::device;
use crate::errors::CameraError;
use crate::events::{bus, CaptureResult, PreviewEvent};
use crate::output::OutputSink;
use crate::permissions::{self, PermissionStatus};
use crate::platform::{self, PlatformCamera};
use crate::settings::{CaptureSettings, QualityProfile};
use crate::types::{CameraDeviceInfo, CameraDirection, CameraFormat, DeviceCapabilities, FlashMode};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

#[cfg(feature = "recording")]
use crate::recording::RecordingHandle;

/// Externally visible session state.
///
/// `Capturing` and `Recording` are projections: internally the session stays
/// in the `Previewing` lifecycle while captures are pending, which is what
/// allows a photo to be taken during an active recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Previewing,
    Capturing,
    Recording,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Previewing => write!(f, "previewing"),
            SessionState::Capturing => write!(f, "capturing"),
            SessionState::Recording => write!(f, "recording"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Idle,
    Previewing,
}

/// State owned by the process-wide session.
///
/// The camera handle is shared with capture workers through an `Arc`; the
/// session is the only place that opens or releases devices.
struct CaptureSession {
    lifecycle: Lifecycle,
    camera: Option<Arc<PlatformCamera>>,
    device: Option<CameraDeviceInfo>,
    direction: CameraDirection,
    settings: CaptureSettings,
    profile: QualityProfile,
    flash_mode: FlashMode,
    torch_on: bool,
    zoom: f32,
    photo_pending: bool,
    #[cfg(feature = "recording")]
    recording: Option<RecordingHandle>,
    config: PluginConfig,
}

impl CaptureSession {
    fn new(config: PluginConfig) -> Self {
        Self {
            lifecycle: Lifecycle::Idle,
            camera: None,
            device: None,
            direction: CameraDirection::default(),
            settings: CaptureSettings::default(),
            profile: QualityProfile::default(),
            flash_mode: FlashMode::Off,
            torch_on: false,
            zoom: 1.0,
            photo_pending: false,
            #[cfg(feature = "recording")]
            recording: None,
            config,
        }
    }

    fn state(&self) -> SessionState {
        if self.recording_active() {
            return SessionState::Recording;
        }
        if self.photo_pending {
            return SessionState::Capturing;
        }
        match self.lifecycle {
            Lifecycle::Idle => SessionState::Idle,
            Lifecycle::Previewing => SessionState::Previewing,
        }
    }

    fn recording_active(&self) -> bool {
        #[cfg(feature = "recording")]
        return self.recording.is_some();
        #[cfg(not(feature = "recording"))]
        false
    }

    fn require_previewing(&self) -> Result<(), CameraError> {
        if self.lifecycle == Lifecycle::Idle {
            return Err(CameraError::NotInitialized(
                "Preview has not been started".to_string(),
            ));
        }
        Ok(())
    }

    /// Guard for structural operations that would tear down the stream.
    fn require_not_busy(&self) -> Result<(), CameraError> {
        if self.photo_pending {
            return Err(CameraError::CaptureInProgress(
                "A photo capture is still pending".to_string(),
            ));
        }
        if self.recording_active() {
            return Err(CameraError::CaptureInProgress(
                "A recording is still active".to_string(),
            ));
        }
        Ok(())
    }

    fn capabilities(&self) -> DeviceCapabilities {
        self.device
            .as_ref()
            .map(|device| device.capabilities.clone())
            .unwrap_or_default()
    }

    fn preview_format(&self) -> CameraFormat {
        CameraFormat::new(
            self.config.camera.default_resolution[0],
            self.config.camera.default_resolution[1],
            self.config.camera.default_fps as f32,
        )
    }
}

lazy_static::lazy_static! {
    static ref SESSION: Arc<Mutex<CaptureSession>> =
        Arc::new(Mutex::new(CaptureSession::new(PluginConfig::default())));
}

/// Open a device and bring its stream up on the blocking pool.
///
/// The first few frames after stream start are discarded; cameras commonly
/// deliver dark or garbage frames while the sensor settles.
async fn open_and_stream(
    device: CameraDeviceInfo,
    format: CameraFormat,
    warmup_frames: u32,
) -> Result<Arc<PlatformCamera>, CameraError> {
    tokio::task::spawn_blocking(move || {
        let camera = platform::open_camera(&device, &format)?;
        camera.start_stream()?;
        for _ in 0..warmup_frames {
            if let Err(e) = camera.capture_frame() {
                log::debug!("Discarding warmup frame error: {}", e);
            }
        }
        Ok(Arc::new(camera))
    })
    .await
    .map_err(|e| CameraError::HardwareUnavailable(format!("Camera task failed: {}", e)))?
}

async fn release_camera(camera: Arc<PlatformCamera>) {
    let stopped = tokio::task::spawn_blocking(move || camera.stop_stream()).await;
    match stopped {
        Ok(Err(e)) => log::warn!("Stream did not stop cleanly: {}", e),
        Err(e) => log::warn!("Camera release task failed: {}", e),
        Ok(Ok(())) => {}
    }
}

/// Start the preview session.
///
/// Requests runtime permission when it has not been determined yet; the
/// session lock is held across that request, so no other operation can
/// interleave with the prompt.
pub async fn start_preview(options: Option<serde_json::Value>) -> Result<SessionState, CameraError> {
    let mut session = SESSION.lock().await;

    if session.lifecycle == Lifecycle::Previewing {
        return Err(CameraError::AlreadyRunning(
            "Preview is already running; stop it before starting another".to_string(),
        ));
    }

    let settings = CaptureSettings::resolve(options);
    log::info!(
        "Starting preview: direction={}, quality={:.2}, encoding={:?}",
        settings.direction,
        settings.quality,
        settings.result_encoding
    );

    match permissions::check_permission() {
        PermissionStatus::Granted => {}
        PermissionStatus::NotDetermined => {
            let info = permissions::request_permission().await?;
            if info.status != PermissionStatus::Granted {
                return Err(CameraError::PermissionDenied(info.message));
            }
        }
        PermissionStatus::Denied | PermissionStatus::Restricted => {
            return Err(CameraError::PermissionDenied(
                "Camera access is denied; enable it in system settings".to_string(),
            ));
        }
    }

    let device = device::select_device(settings.direction)?;
    let format = session.preview_format();
    let warmup = session.config.camera.warmup_frames;
    let camera = open_and_stream(device.clone(), format, warmup).await?;

    session.direction = settings.direction;
    session.settings = settings;
    session.zoom = device.capabilities.min_zoom;
    session.torch_on = false;
    session.flash_mode = FlashMode::Off;
    session.device = Some(device);
    session.camera = Some(camera);
    session.lifecycle = Lifecycle::Previewing;

    log::info!("Preview started with {} camera", session.direction);
    Ok(session.state())
}

/// Stop the preview and release the device.
pub async fn stop_preview() -> Result<SessionState, CameraError> {
    let mut session = SESSION.lock().await;
    session.require_previewing()?;
    session.require_not_busy()?;

    if let Some(camera) = session.camera.take() {
        release_camera(camera).await;
    }
    session.device = None;
    session.torch_on = false;
    session.flash_mode = FlashMode::Off;
    session.lifecycle = Lifecycle::Idle;

    log::info!("Preview stopped");
    Ok(session.state())
}

/// Take a photo with the session's current settings.
///
/// The call returns once the capture is accepted. The outcome arrives as a
/// single `capturePhotoFinished` event; a hardware failure during the capture
/// never fails this call.
pub async fn take_photo() -> Result<(), CameraError> {
    let mut session = SESSION.lock().await;
    session.require_previewing()?;
    if session.photo_pending {
        return Err(CameraError::CaptureInProgress(
            "A photo capture is already pending".to_string(),
        ));
    }

    let camera = match &session.camera {
        Some(camera) => Arc::clone(camera),
        None => {
            return Err(CameraError::NotInitialized(
                "No active camera device".to_string(),
            ))
        }
    };
    let settings = session.settings.clone();
    let profile = session.profile;
    let zoom = session.zoom;
    let is_front = session.direction == CameraDirection::Front;
    let sink = OutputSink::from_config(&session.config.storage);
    log::debug!(
        "Capturing photo: profile={:?}, zoom={:.2}, flash={}",
        profile,
        zoom,
        session.flash_mode
    );

    session.photo_pending = true;
    drop(session);

    tokio::spawn(async move {
        let outcome = tokio::task::spawn_blocking(move || {
            let frame = camera.capture_frame()?;
            sink.process_photo(frame, &settings, profile, zoom, is_front)
        })
        .await;

        let result = match outcome {
            Ok(Ok(uri)) => CaptureResult::success(uri),
            Ok(Err(e)) => CaptureResult::failure(e.to_string()),
            Err(e) => CaptureResult::failure(format!("Capture task failed: {}", e)),
        };

        SESSION.lock().await.photo_pending = false;
        bus().publish(PreviewEvent::PhotoFinished(result));
    });

    Ok(())
}

/// Start recording video from the active preview stream.
///
/// The call returns once the recording worker is running. Worker startup
/// failures are reported through a `captureVideoFinished` failure event
/// rather than a call rejection.
#[cfg(feature = "recording")]
pub async fn start_record() -> Result<(), CameraError> {
    let mut session = SESSION.lock().await;
    session.require_previewing()?;
    if session.recording.is_some() {
        return Err(CameraError::RecordingInProgress(
            "A recording is already active".to_string(),
        ));
    }

    let camera = match &session.camera {
        Some(camera) => Arc::clone(camera),
        None => {
            return Err(CameraError::NotInitialized(
                "No active camera device".to_string(),
            ))
        }
    };
    let sink = OutputSink::from_config(&session.config.storage);
    let fps = session.config.camera.default_fps;
    let profile = session.profile;
    let prefs = session.config.recording.clone();

    let spawned = sink
        .video_output_path()
        .and_then(|path| crate::recording::spawn_worker(camera, path, fps, profile, prefs));

    match spawned {
        Ok(handle) => {
            log::info!("Recording started: {}", handle.output_path().display());
            session.recording = Some(handle);
        }
        Err(e) => {
            log::error!("Recording failed to start: {}", e);
            bus().publish(PreviewEvent::VideoFinished(CaptureResult::failure(
                e.to_string(),
            )));
        }
    }
    Ok(())
}

#[cfg(not(feature = "recording"))]
pub async fn start_record() -> Result<(), CameraError> {
    let session = SESSION.lock().await;
    session.require_previewing()?;
    Err(CameraError::HardwareUnavailable(
        "Video recording support was not compiled into this build".to_string(),
    ))
}

/// Stop the active recording and finalize the file.
///
/// Emits exactly one `captureVideoFinished` event carrying the finished
/// file's URI or the finalization error.
#[cfg(feature = "recording")]
pub async fn stop_record() -> Result<(), CameraError> {
    let mut session = SESSION.lock().await;
    session.require_previewing()?;

    let handle = session
        .recording
        .take()
        .ok_or_else(|| CameraError::NotRecording("No recording is active".to_string()))?;

    handle.signal_stop();
    let wall = handle.elapsed();
    drop(session);

    let outcome = tokio::task::spawn_blocking(move || handle.join()).await;

    let result = match outcome {
        Ok(Ok(stats)) => {
            log::info!(
                "Recording finished: {} frames in {:.1}s ({:.1}s wall), {} dropped",
                stats.video_frames,
                stats.duration_secs,
                wall.as_secs_f64(),
                stats.dropped_frames
            );
            CaptureResult::success(crate::output::file_uri(std::path::Path::new(
                &stats.output_path,
            )))
        }
        Ok(Err(e)) => {
            log::error!("Recording failed after {:.1}s: {}", wall.as_secs_f64(), e);
            CaptureResult::failure(e.to_string())
        }
        Err(e) => CaptureResult::failure(format!("Recording finalization failed: {}", e)),
    };

    bus().publish(PreviewEvent::VideoFinished(result));
    Ok(())
}

#[cfg(not(feature = "recording"))]
pub async fn stop_record() -> Result<(), CameraError> {
    let session = SESSION.lock().await;
    session.require_previewing()?;
    Err(CameraError::NotRecording("No recording is active".to_string()))
}

/// Switch between the front and rear camera.
///
/// The replacement stream is fully opened before the previous device is
/// released; if no device exists for the opposite direction the current one
/// stays active.
pub async fn flip_camera() -> Result<CameraDirection, CameraError> {
    let mut session = SESSION.lock().await;
    session.require_previewing()?;
    session.require_not_busy()?;

    let target = session.direction.opposite();
    let device = device::select_device(target)?;
    let format = session.preview_format();
    let warmup = session.config.camera.warmup_frames;
    let camera = open_and_stream(device.clone(), format, warmup).await?;

    if let Some(old) = session.camera.take() {
        release_camera(old).await;
    }

    session.zoom = device.capabilities.clamp_zoom(session.zoom);
    session.torch_on = false;
    session.direction = target;
    session.device = Some(device);
    session.camera = Some(camera);

    log::info!("Flipped to {} camera", session.direction);
    Ok(session.direction)
}

/// Set the focus point of interest in normalized [0, 1] coordinates.
///
/// Best effort: devices without focus control accept and ignore the request.
/// Returns the clamped coordinates that were applied.
pub async fn focus(x: f32, y: f32) -> Result<(f32, f32), CameraError> {
    let session = SESSION.lock().await;
    session.require_previewing()?;

    let x = clamp_unit(x);
    let y = clamp_unit(y);
    if let Some(camera) = &session.camera {
        if let Err(e) = camera.set_focus_point(x, y) {
            log::warn!("Focus request not applied: {}", e);
        }
    }
    Ok((x, y))
}

fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        return 0.5;
    }
    value.clamp(0.0, 1.0)
}

/// Set the zoom factor, clamped into the device's supported range.
///
/// Returns the factor actually applied.
pub async fn zoom(factor: f32) -> Result<f32, CameraError> {
    let mut session = SESSION.lock().await;
    session.require_previewing()?;

    let applied = session.capabilities().clamp_zoom(factor);
    if applied != factor {
        log::debug!("Zoom factor {} clamped to {}", factor, applied);
    }
    session.zoom = applied;

    if let Some(camera) = &session.camera {
        if let Err(e) = camera.set_zoom(applied) {
            log::warn!("Zoom request not applied by backend: {}", e);
        }
    }
    Ok(applied)
}

pub async fn min_zoom() -> Result<f32, CameraError> {
    let session = SESSION.lock().await;
    session.require_previewing()?;
    Ok(session.capabilities().min_zoom)
}

pub async fn max_zoom() -> Result<f32, CameraError> {
    let session = SESSION.lock().await;
    session.require_previewing()?;
    Ok(session.capabilities().max_zoom)
}

/// Flash modes supported by the selected device.
pub async fn flash_modes() -> Result<Vec<String>, CameraError> {
    let session = SESSION.lock().await;
    session.require_previewing()?;
    Ok(available_flash_modes(session.capabilities().has_torch))
}

fn available_flash_modes(has_torch: bool) -> Vec<String> {
    if has_torch {
        vec![
            FlashMode::Off.to_string(),
            FlashMode::On.to_string(),
            FlashMode::Auto.to_string(),
            FlashMode::Torch.to_string(),
        ]
    } else {
        vec![FlashMode::Off.to_string()]
    }
}

/// Record the flash mode for subsequent captures.
///
/// Modes the device cannot honor fall back to off. Torch mode drives the
/// lamp immediately; the other modes have no effect until a capture runs.
pub async fn set_flash_mode(mode: FlashMode) -> Result<(), CameraError> {
    let mut session = SESSION.lock().await;
    session.require_previewing()?;

    let supported = session.capabilities().has_torch;
    let mode = if mode != FlashMode::Off && !supported {
        log::warn!(
            "Flash mode {} not supported without torch hardware; using off",
            mode
        );
        FlashMode::Off
    } else {
        mode
    };

    let torch = mode == FlashMode::Torch;
    if torch != session.torch_on {
        if let Some(camera) = &session.camera {
            if let Err(e) = camera.set_torch(torch) {
                log::warn!("Torch switch failed: {}", e);
            }
        }
        session.torch_on = torch;
    }
    session.flash_mode = mode;
    Ok(())
}

/// Switch the torch lamp on or off.
///
/// Returns the resulting lamp state; on devices without a torch this is a
/// no-op returning `false`.
pub async fn enable_torch(enable: bool) -> Result<bool, CameraError> {
    let mut session = SESSION.lock().await;
    session.require_previewing()?;

    if !session.capabilities().has_torch {
        log::debug!("Torch toggle ignored: selected device has no torch");
        return Ok(false);
    }

    if let Some(camera) = &session.camera {
        if let Err(e) = camera.set_torch(enable) {
            log::warn!("Torch switch failed: {}", e);
        }
    }
    session.torch_on = enable;
    Ok(enable)
}

pub async fn is_torch_on() -> Result<bool, CameraError> {
    let session = SESSION.lock().await;
    session.require_previewing()?;
    Ok(session.torch_on)
}

pub async fn is_torch_available() -> Result<bool, CameraError> {
    let session = SESSION.lock().await;
    session.require_previewing()?;
    Ok(session.capabilities().has_torch)
}

/// Switch the capture quality profile for subsequent photos and recordings.
pub async fn set_quality(profile: QualityProfile) -> Result<(), CameraError> {
    let mut session = SESSION.lock().await;
    session.require_previewing()?;
    session.profile = profile;
    log::info!("Capture quality profile set to {:?}", profile);
    Ok(())
}

pub async fn current_state() -> SessionState {
    SESSION.lock().await.state()
}

/// Replace the session configuration.
///
/// Invalid configurations are rejected and the previous one stays active.
pub async fn apply_config(config: PluginConfig) {
    if let Err(e) = config.validate() {
        log::warn!("Configuration rejected: {}", e);
        return;
    }
    SESSION.lock().await.config = config;
}

/// Release the camera and reset the session to its initial state.
///
/// Intended for host teardown. An active recording is stopped and its file
/// finalized, but no completion event is published; the host's listeners are
/// assumed gone.
pub async fn shutdown() {
    let mut session = SESSION.lock().await;

    #[cfg(feature = "recording")]
    if let Some(handle) = session.recording.take() {
        handle.signal_stop();
        let joined = tokio::task::spawn_blocking(move || handle.join()).await;
        if let Ok(Err(e)) = joined {
            log::warn!("Recording did not finalize cleanly during shutdown: {}", e);
        }
    }

    if let Some(camera) = session.camera.take() {
        release_camera(camera).await;
    }

    session.device = None;
    session.photo_pending = false;
    session.torch_on = false;
    session.flash_mode = FlashMode::Off;
    session.zoom = 1.0;
    session.settings = CaptureSettings::default();
    session.profile = QualityProfile::default();
    session.lifecycle = Lifecycle::Idle;
    log::debug!("Capture session shut down");
}
