use crate::attendance::{AttendanceService, SubmissionReceipt};
use crate::camera::{CameraBackend, CameraSessionManager, CaptureMode};
use crate::config::AbsensiConfig;
use crate::error::{AbsensiError, Result, SubmitError};
use crate::events::{EventBus, KioskEvent};
use crate::geofence::{GateVerdict, GeofenceGate, Position, PositionProvider};
use crate::model::AttendanceMethod;
use crate::notify::GuardianNotifier;
use crate::scanner::QrFrameScanner;
use crate::store::AttendanceStore;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Per-session scan state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStatus {
    Idle,
    Submitting,
    /// Terminal for the session; no further scans are accepted
    Success,
    Rejected,
}

/// Active tab of the check-in view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanTab {
    Qr,
    Face,
}

/// Outcome of one check-in attempt, surfaced to the UI
#[derive(Debug)]
pub enum CheckInOutcome {
    Recorded(SubmissionReceipt),
    OutOfRange { distance_m: f64 },
    Rejected { code: String, reason: String },
    Cancelled,
}

/// Drives one check-in session: geofence gate, camera session, QR polling
/// loop, submission. Owns the session's scan status and cancellation; a
/// successful submission ends the session for good.
pub struct CheckInKiosk {
    config: AbsensiConfig,
    position: Arc<dyn PositionProvider>,
    camera: CameraSessionManager,
    scanner: QrFrameScanner,
    service: AttendanceService,
    events: Arc<EventBus>,
    tab: ScanTab,
    status: ScanStatus,
    device_id: Option<String>,
    cancel: CancellationToken,
    last_gate_distance: Option<f64>,
}

impl CheckInKiosk {
    pub fn new(
        config: AbsensiConfig,
        position: Arc<dyn PositionProvider>,
        backend: Arc<dyn CameraBackend>,
        store: Arc<dyn AttendanceStore>,
        notifier: Arc<dyn GuardianNotifier>,
        events: Arc<EventBus>,
    ) -> Self {
        let camera = CameraSessionManager::new(backend, config.camera.clone());
        let scanner = QrFrameScanner::new(config.scanner.clone());
        let service = AttendanceService::new(store, notifier, &config.attendance);
        let device_id = config.camera.device_id.clone();

        Self {
            config,
            position,
            camera,
            scanner,
            service,
            events,
            tab: ScanTab::Qr,
            status: ScanStatus::Idle,
            device_id,
            cancel: CancellationToken::new(),
            last_gate_distance: None,
        }
    }

    pub fn status(&self) -> ScanStatus {
        self.status
    }

    pub fn tab(&self) -> ScanTab {
        self.tab
    }

    /// Token cancelling the current scan loop; cloned by teardown paths
    pub fn cancel_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Switching tabs cancels any in-flight scan and releases the camera.
    /// The next session gets a fresh cancellation token.
    pub fn switch_tab(&mut self, tab: ScanTab) {
        if tab == self.tab {
            return;
        }
        debug!(?tab, "switching scan tab");
        self.cancel.cancel();
        self.camera.stop();
        self.cancel = CancellationToken::new();
        self.tab = tab;
    }

    /// Explicit device choice; takes effect on the next session start
    pub fn select_device(&mut self, device_id: Option<String>) {
        if self.device_id != device_id {
            self.cancel.cancel();
            self.camera.stop();
            self.cancel = CancellationToken::new();
            self.device_id = device_id;
        }
    }

    /// Run one QR check-in attempt to completion
    pub async fn run_qr_session(&mut self) -> Result<CheckInOutcome> {
        if self.status != ScanStatus::Idle {
            return Err(AbsensiError::system(format!(
                "scan session is not idle: {:?}",
                self.status
            )));
        }
        self.tab = ScanTab::Qr;

        let position = match self.pass_gate().await? {
            Some(position) => position,
            None => {
                // Out of range; pass_gate already published the block
                return Ok(CheckInOutcome::OutOfRange {
                    distance_m: self.last_gate_distance.unwrap_or_default(),
                });
            }
        };

        self.camera
            .start(CaptureMode::QrScan, self.device_id.as_deref())
            .await?;
        if let Some(stream) = self.camera.stream_mut() {
            self.events.publish(KioskEvent::StreamStarted {
                device_id: stream.device_id().to_string(),
            });
        }

        let cancel = self.cancel.clone();
        let decoded = match self.camera.stream_mut() {
            Some(stream) => self.scanner.scan(stream, &cancel).await,
            None => {
                return Err(AbsensiError::component(
                    "camera",
                    "stream missing after start",
                ))
            }
        };

        // Camera hardware is released on every path out of the scan
        self.camera.stop();
        self.events.publish(KioskEvent::StreamStopped);

        let Some(code) = decoded else {
            return Ok(CheckInOutcome::Cancelled);
        };
        self.events.publish(KioskEvent::CodeDecoded { code: code.clone() });

        self.submit(&code, AttendanceMethod::Qr, position).await
    }

    /// Run one face check-in attempt. Face matching itself is an external
    /// concern; the kiosk verifies a live user-facing stream and submits
    /// the operator-confirmed code with method FACE.
    pub async fn run_face_session(&mut self, code: &str) -> Result<CheckInOutcome> {
        if self.status != ScanStatus::Idle {
            return Err(AbsensiError::system(format!(
                "scan session is not idle: {:?}",
                self.status
            )));
        }
        self.tab = ScanTab::Face;

        let position = match self.pass_gate().await? {
            Some(position) => position,
            None => {
                return Ok(CheckInOutcome::OutOfRange {
                    distance_m: self.last_gate_distance.unwrap_or_default(),
                });
            }
        };

        self.camera
            .start(CaptureMode::FaceCapture, self.device_id.as_deref())
            .await?;
        if let Some(stream) = self.camera.stream_mut() {
            self.events.publish(KioskEvent::StreamStarted {
                device_id: stream.device_id().to_string(),
            });
        }

        let live = match self.camera.stream_mut() {
            Some(stream) => stream.next_frame().await.is_some(),
            None => false,
        };
        self.camera.stop();
        self.events.publish(KioskEvent::StreamStopped);

        if !live {
            warn!("face capture stream produced no frame");
            return Ok(CheckInOutcome::Cancelled);
        }

        self.submit(code, AttendanceMethod::Face, position).await
    }

    async fn pass_gate(&mut self) -> Result<Option<Position>> {
        let gate = GeofenceGate::new(self.config.geofence.clone());
        let verdict = match gate.evaluate(self.position.as_ref()).await {
            Ok(verdict) => verdict,
            Err(e) => {
                // Sensor failure blocks entry; it is not an out-of-range pass
                self.events.publish(KioskEvent::GateBlocked {
                    reason: e.to_string(),
                });
                return Err(e.into());
            }
        };

        match verdict {
            GateVerdict::Pass {
                position,
                distance_m,
            } => {
                self.last_gate_distance = distance_m;
                self.events.publish(KioskEvent::GatePassed {
                    latitude: position.latitude,
                    longitude: position.longitude,
                    distance_m,
                });
                Ok(Some(position))
            }
            GateVerdict::OutOfRange {
                position,
                distance_m,
            } => {
                self.last_gate_distance = Some(distance_m);
                self.events.publish(KioskEvent::GateBlocked {
                    reason: format!(
                        "position {} is {:.0} m from school, radius {:.0} m",
                        position, distance_m, self.config.geofence.radius_meters
                    ),
                });
                Ok(None)
            }
        }
    }

    async fn submit(
        &mut self,
        code: &str,
        method: AttendanceMethod,
        position: Position,
    ) -> Result<CheckInOutcome> {
        self.status = ScanStatus::Submitting;
        let location = position.to_string();

        match self.service.submit_scan(code, method, &location).await {
            Ok(receipt) => {
                self.status = ScanStatus::Success;
                // No scan loop may outlive a completed session
                self.cancel.cancel();
                info!(record_id = %receipt.record_id, name = %receipt.person_name, "check-in complete");
                self.events.publish(KioskEvent::AttendanceRecorded {
                    record_id: receipt.record_id.clone(),
                    person: receipt.person.clone(),
                });
                Ok(CheckInOutcome::Recorded(receipt))
            }
            Err(e @ (SubmitError::NotRecognized { .. } | SubmitError::DuplicateScan { .. })) => {
                let reason = e.to_string();
                self.status = ScanStatus::Rejected;
                self.events.publish(KioskEvent::SubmissionRejected {
                    code: code.to_string(),
                    reason: reason.clone(),
                });
                // A rejection returns the session to idle for another attempt
                self.status = ScanStatus::Idle;
                Ok(CheckInOutcome::Rejected {
                    code: code.to_string(),
                    reason,
                })
            }
            Err(e) => {
                // Write failures surface to the user; the session stays
                // retryable
                self.status = ScanStatus::Idle;
                Err(e.into())
            }
        }
    }
}
