//! Recording worker thread.
//!
//! Pulls frames from the active camera at the target rate, scales them to the
//! encoded size, and feeds the recorder until stopped. The recorder is built
//! inside the thread from the first captured frame, so output-file and encoder
//! failures surface through the worker result instead of the start call.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use super::config::{target_dimensions, RecordingConfig, RecordingStats};
use super::recorder::Recorder;
use crate::config::RecordingPrefs;
use crate::errors::CameraError;
use crate::platform::PlatformCamera;
use crate::settings::QualityProfile;

/// Give up after this many capture failures in a row.
const MAX_CONSECUTIVE_FAILURES: u32 = 10;

/// Handle to a running recording thread.
pub struct RecordingHandle {
    stop_flag: Arc<AtomicBool>,
    worker: JoinHandle<Result<RecordingStats, CameraError>>,
    output_path: PathBuf,
    started: Instant,
}

impl RecordingHandle {
    /// Ask the worker to stop after the frame it is on.
    pub fn signal_stop(&self) {
        self.stop_flag.store(true, Ordering::SeqCst);
    }

    /// Wait for the worker and collect the recording statistics.
    pub fn join(self) -> Result<RecordingStats, CameraError> {
        self.worker.join().map_err(|_| {
            CameraError::EncodeOrWriteFailure("Recording thread panicked".to_string())
        })?
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Start a recording worker for an already-streaming camera.
pub fn spawn_worker(
    camera: Arc<PlatformCamera>,
    output_path: PathBuf,
    fps: u32,
    profile: QualityProfile,
    prefs: RecordingPrefs,
) -> Result<RecordingHandle, CameraError> {
    let stop_flag = Arc::new(AtomicBool::new(false));
    let worker_flag = Arc::clone(&stop_flag);
    let worker_path = output_path.clone();

    let worker = std::thread::Builder::new()
        .name("camera-recording".to_string())
        .spawn(move || record_loop(camera, worker_path, fps, profile, prefs, worker_flag))
        .map_err(|e| {
            CameraError::EncodeOrWriteFailure(format!("Failed to spawn recording thread: {}", e))
        })?;

    Ok(RecordingHandle {
        stop_flag,
        worker,
        output_path,
        started: Instant::now(),
    })
}

fn record_loop(
    camera: Arc<PlatformCamera>,
    output_path: PathBuf,
    fps: u32,
    profile: QualityProfile,
    prefs: RecordingPrefs,
    stop_flag: Arc<AtomicBool>,
) -> Result<RecordingStats, CameraError> {
    let fps = fps.max(1) as f64;
    let frame_interval = Duration::from_secs_f64(1.0 / fps);

    // First frame sets the encoded dimensions.
    let first = capture_with_retries(&camera, &stop_flag)?;
    let (target_width, target_height) = target_dimensions(first.width, first.height, profile);

    let mut config =
        RecordingConfig::for_frame(first.width, first.height, fps, profile).with_fast_start(prefs.fast_start);
    if let Some(ref title) = prefs.title {
        config = config.with_title(title.clone());
    }

    let mut recorder = Recorder::new(&output_path, config)?;

    let mut consecutive_failures = 0u32;
    let mut pending = Some(first);

    loop {
        let tick = Instant::now();

        let frame = match pending.take() {
            Some(frame) => frame,
            None => match camera.capture_frame() {
                Ok(frame) => {
                    consecutive_failures = 0;
                    frame
                }
                Err(e) => {
                    consecutive_failures += 1;
                    log::warn!(
                        "Recording capture failed ({}/{}): {}",
                        consecutive_failures,
                        MAX_CONSECUTIVE_FAILURES,
                        e
                    );
                    if consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
                        return Err(CameraError::EncodeOrWriteFailure(format!(
                            "Camera stopped delivering frames: {}",
                            e
                        )));
                    }
                    sleep_remainder(tick, frame_interval);
                    if stop_flag.load(Ordering::SeqCst) {
                        break;
                    }
                    continue;
                }
            },
        };

        match scale_frame(&frame.data, frame.width, frame.height, target_width, target_height) {
            Some(rgb) => recorder.write_rgb_frame(&rgb, target_width, target_height)?,
            None => log::warn!(
                "Skipping frame with inconsistent buffer ({} bytes for {}x{})",
                frame.data.len(),
                frame.width,
                frame.height
            ),
        }

        if stop_flag.load(Ordering::SeqCst) {
            break;
        }
        sleep_remainder(tick, frame_interval);
        if stop_flag.load(Ordering::SeqCst) {
            break;
        }
    }

    let stats = recorder.finish()?;
    log::info!(
        "Recording finished: {} frames, {:.1}s, {} bytes at {}",
        stats.video_frames,
        stats.duration_secs,
        stats.bytes_written,
        stats.output_path
    );
    Ok(stats)
}

fn capture_with_retries(
    camera: &PlatformCamera,
    stop_flag: &AtomicBool,
) -> Result<crate::types::CameraFrame, CameraError> {
    let mut last_error = None;
    for _ in 0..MAX_CONSECUTIVE_FAILURES {
        if stop_flag.load(Ordering::SeqCst) {
            break;
        }
        match camera.capture_frame() {
            Ok(frame) => return Ok(frame),
            Err(e) => {
                last_error = Some(e);
                std::thread::sleep(Duration::from_millis(50));
            }
        }
    }
    Err(last_error.unwrap_or_else(|| {
        CameraError::EncodeOrWriteFailure("Recording stopped before the first frame".to_string())
    }))
}

/// Scale an RGB24 buffer to the encoded size. Returns None when the buffer
/// length does not match the claimed dimensions.
fn scale_frame(
    data: &[u8],
    width: u32,
    height: u32,
    target_width: u32,
    target_height: u32,
) -> Option<Vec<u8>> {
    if width == target_width && height == target_height {
        if data.len() == (width * height * 3) as usize {
            return Some(data.to_vec());
        }
        return None;
    }

    let buffer = image::RgbImage::from_raw(width, height, data.to_vec())?;
    let resized = image::imageops::resize(
        &buffer,
        target_width,
        target_height,
        image::imageops::FilterType::Triangle,
    );
    Some(resized.into_raw())
}

fn sleep_remainder(tick: Instant, frame_interval: Duration) {
    if let Some(remaining) = frame_interval.checked_sub(tick.elapsed()) {
        std::thread::sleep(remaining);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{self, mock};
    use crate::types::CameraFormat;

    #[test]
    fn test_scale_frame_passthrough_and_resize() {
        let data = vec![100u8; 64 * 48 * 3];
        let same = scale_frame(&data, 64, 48, 64, 48).expect("passthrough");
        assert_eq!(same.len(), data.len());

        let smaller = scale_frame(&data, 64, 48, 32, 16).expect("resize");
        assert_eq!(smaller.len(), 32 * 16 * 3);

        assert!(scale_frame(&data[..10], 64, 48, 64, 48).is_none());
    }

    #[test]
    fn test_worker_records_mock_frames() {
        let _guard = crate::test_support::lock();
        mock::force_mock_mode(true);
        mock::reset();
        mock::configure(|state| state.frame_size = (320, 240));

        let devices = platform::list_devices().expect("mock devices");
        let camera = Arc::new(
            platform::open_camera(&devices[0], &CameraFormat::standard()).expect("open mock"),
        );
        camera.start_stream().expect("stream");

        let dir = tempfile::tempdir().expect("tempdir");
        let output = dir.path().join("worker_test.mp4");

        let handle = spawn_worker(
            Arc::clone(&camera),
            output.clone(),
            30,
            QualityProfile::Low,
            RecordingPrefs::default(),
        )
        .expect("worker should spawn");

        std::thread::sleep(Duration::from_millis(400));
        handle.signal_stop();
        assert!(handle.elapsed() >= Duration::from_millis(400));
        let stats = handle.join().expect("recording should finish");

        assert!(stats.video_frames >= 1, "should have written frames");
        assert!(output.exists(), "output file should exist");
        assert!(
            std::fs::metadata(&output).expect("metadata").len() > 0,
            "output should not be empty"
        );

        camera.stop_stream().expect("stop stream");
        mock::force_mock_mode(false);
        mock::reset();
    }

    #[test]
    fn test_worker_reports_capture_failure() {
        let _guard = crate::test_support::lock();
        mock::force_mock_mode(true);
        mock::reset();
        mock::configure(|state| state.capture_fails = true);

        let devices = platform::list_devices().expect("mock devices");
        let camera = Arc::new(
            platform::open_camera(&devices[0], &CameraFormat::standard()).expect("open mock"),
        );
        camera.start_stream().expect("stream");

        let dir = tempfile::tempdir().expect("tempdir");
        let handle = spawn_worker(
            Arc::clone(&camera),
            dir.path().join("failing.mp4"),
            30,
            QualityProfile::Low,
            RecordingPrefs::default(),
        )
        .expect("worker should spawn");

        let result = handle.join();
        assert!(result.is_err(), "capture failures should fail the worker");

        mock::force_mock_mode(false);
        mock::reset();
    }
}
