//! Video recording pipeline.
//!
//! Frames from the active camera are encoded with openh264 and muxed into
//! MP4 with muxide. A dedicated worker thread owns the recorder for the
//! lifetime of one recording.
//!
//! # Example
//! ```rust,ignore
//! use tauri_plugin_camera_preview::recording::{Recorder, RecordingConfig};
//!
//! let config = RecordingConfig::new(1920, 1080, 30.0);
//! let mut recorder = Recorder::new("output.mp4", config)?;
//!
//! // In your frame capture loop:
//! recorder.write_rgb_frame(&rgb, 1920, 1080)?;
//!
//! // When done:
//! let stats = recorder.finish()?;
//! ```

mod config;
mod encoder;
mod recorder;
mod worker;

pub use config::{profile_bitrate, profile_bounds, target_dimensions, RecordingConfig, RecordingStats};
pub use encoder::{EncodedFrame, H264Encoder};
pub use recorder::Recorder;
pub use worker::{spawn_worker, RecordingHandle};
