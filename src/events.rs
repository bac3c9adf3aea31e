use crate::model::PersonRef;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Lifecycle events published while a check-in session runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum KioskEvent {
    /// Device position acquired and inside the geofence (or gating disabled)
    GatePassed {
        latitude: f64,
        longitude: f64,
        distance_m: Option<f64>,
    },
    /// Gate refused entry: out of radius or sensor failure
    GateBlocked { reason: String },
    /// Capture stream opened
    StreamStarted { device_id: String },
    /// Capture stream torn down, all tracks released
    StreamStopped,
    /// The scanner produced its one decode for this session
    CodeDecoded { code: String },
    /// An attendance record was written
    AttendanceRecorded { record_id: String, person: PersonRef },
    /// Submission was rejected; the session returns to idle
    SubmissionRejected { code: String, reason: String },
}

impl KioskEvent {
    /// Event type as a string for filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            KioskEvent::GatePassed { .. } => "gate_passed",
            KioskEvent::GateBlocked { .. } => "gate_blocked",
            KioskEvent::StreamStarted { .. } => "stream_started",
            KioskEvent::StreamStopped => "stream_stopped",
            KioskEvent::CodeDecoded { .. } => "code_decoded",
            KioskEvent::AttendanceRecorded { .. } => "attendance_recorded",
            KioskEvent::SubmissionRejected { .. } => "submission_rejected",
        }
    }
}

/// Broadcast bus decoupling the kiosk from UI/log consumers
pub struct EventBus {
    sender: broadcast::Sender<KioskEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish best-effort; lagging or absent receivers are not an error
    pub fn publish(&self, event: KioskEvent) {
        trace!(event_type = event.event_type(), "publishing kiosk event");
        if self.sender.send(event).is_err() {
            debug!("no active event subscribers");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<KioskEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_and_receive() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();

        bus.publish(KioskEvent::CodeDecoded {
            code: "2024001".to_string(),
        });

        match rx.recv().await.unwrap() {
            KioskEvent::CodeDecoded { code } => assert_eq!(code, "2024001"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_publish_without_subscribers_is_ok() {
        let bus = EventBus::new(8);
        bus.publish(KioskEvent::StreamStopped);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_event_type_names() {
        let event = KioskEvent::GateBlocked {
            reason: "out of radius".to_string(),
        };
        assert_eq!(event.event_type(), "gate_blocked");
    }
}
