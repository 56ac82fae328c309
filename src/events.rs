//! Asynchronous delivery of capture outcomes to the host.
//!
//! Capture completion is decoupled from the call that triggered it: the
//! session publishes exactly one terminal event per capture on an in-process
//! broadcast bus, and the plugin's setup hook forwards bus events to the host
//! application.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Terminal outcome of a photo or video capture. Exactly one field is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl CaptureResult {
    pub fn success(file_path: String) -> Self {
        Self {
            file_path: Some(file_path),
            error_message: None,
        }
    }

    pub fn failure(error_message: String) -> Self {
        Self {
            file_path: None,
            error_message: Some(error_message),
        }
    }

    pub fn is_success(&self) -> bool {
        self.file_path.is_some()
    }
}

/// Events emitted by the capture session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PreviewEvent {
    PhotoFinished(CaptureResult),
    VideoFinished(CaptureResult),
}

impl PreviewEvent {
    /// Host-facing event channel name.
    pub fn channel(&self) -> &'static str {
        match self {
            PreviewEvent::PhotoFinished(_) => "capturePhotoFinished",
            PreviewEvent::VideoFinished(_) => "captureVideoFinished",
        }
    }

    pub fn result(&self) -> &CaptureResult {
        match self {
            PreviewEvent::PhotoFinished(result) => result,
            PreviewEvent::VideoFinished(result) => result,
        }
    }
}

/// Broadcast event bus connecting the session to host forwarders and tests.
pub struct EventBus {
    sender: broadcast::Sender<PreviewEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events and get a receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<PreviewEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all subscribers, returning the receiver count.
    ///
    /// A bus without subscribers is not an error; the event is simply
    /// dropped, matching fire-and-forget delivery semantics.
    pub fn publish(&self, event: PreviewEvent) -> usize {
        match event.result().error_message.as_deref() {
            Some(message) => log::warn!("{} failed: {}", event.channel(), message),
            None => log::info!(
                "{}: {}",
                event.channel(),
                event.result().file_path.as_deref().unwrap_or_default()
            ),
        }

        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

lazy_static::lazy_static! {
    static ref EVENT_BUS: EventBus = EventBus::new(32);
}

/// The process-wide event bus used by the capture session.
pub fn bus() -> &'static EventBus {
    &EVENT_BUS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_result_is_exclusive() {
        let ok = CaptureResult::success("file:///tmp/a.jpg".to_string());
        assert!(ok.is_success());
        assert!(ok.error_message.is_none());

        let err = CaptureResult::failure("sensor fault".to_string());
        assert!(!err.is_success());
        assert!(err.file_path.is_none());
    }

    #[test]
    fn test_result_serializes_camel_case_without_empty_field() {
        let ok = CaptureResult::success("file:///tmp/a.jpg".to_string());
        let json = serde_json::to_string(&ok).unwrap();
        assert!(json.contains("filePath"));
        assert!(!json.contains("errorMessage"));

        let err = CaptureResult::failure("boom".to_string());
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("errorMessage"));
        assert!(!json.contains("filePath"));
    }

    #[test]
    fn test_event_channels() {
        let photo = PreviewEvent::PhotoFinished(CaptureResult::success("f".to_string()));
        let video = PreviewEvent::VideoFinished(CaptureResult::success("f".to_string()));
        assert_eq!(photo.channel(), "capturePhotoFinished");
        assert_eq!(video.channel(), "captureVideoFinished");
    }

    #[tokio::test]
    async fn test_publish_reaches_all_subscribers() {
        let bus = EventBus::new(8);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        let delivered = bus.publish(PreviewEvent::PhotoFinished(CaptureResult::success(
            "file:///tmp/photo.jpg".to_string(),
        )));
        assert_eq!(delivered, 2);

        for receiver in [&mut first, &mut second] {
            let event = receiver.recv().await.unwrap();
            assert_eq!(event.channel(), "capturePhotoFinished");
            assert!(event.result().is_success());
        }
    }

    #[test]
    fn test_publish_without_subscribers_is_dropped() {
        let bus = EventBus::new(8);
        let delivered = bus.publish(PreviewEvent::VideoFinished(CaptureResult::failure(
            "no listeners".to_string(),
        )));
        assert_eq!(delivered, 0);
    }
}
