use super::device::{CameraBackend, CaptureMode, CaptureStream, DeviceDescriptor, StreamConstraints};
use crate::config::CameraConfig;
use crate::error::CameraError;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Owns at most one capture stream per client session. Starting a new
/// stream implicitly stops any prior one; every exit path releases all
/// hardware tracks.
pub struct CameraSessionManager {
    backend: Arc<dyn CameraBackend>,
    config: CameraConfig,
    stream: Option<Box<dyn CaptureStream>>,
}

impl CameraSessionManager {
    pub fn new(backend: Arc<dyn CameraBackend>, config: CameraConfig) -> Self {
        Self {
            backend,
            config,
            stream: None,
        }
    }

    pub async fn list_devices(&self) -> Result<Vec<DeviceDescriptor>, CameraError> {
        let devices = self.backend.enumerate().await?;
        debug!(count = devices.len(), "enumerated video input devices");
        Ok(devices)
    }

    /// Open a stream for the given mode, or for an explicitly chosen
    /// device id. If the explicit device is no longer valid the manager
    /// falls back to default constraints for the mode.
    pub async fn start(
        &mut self,
        mode: CaptureMode,
        device_id: Option<&str>,
    ) -> Result<(), CameraError> {
        // Exclusive ownership: never two concurrent streams per session
        self.stop();

        let constraints = StreamConstraints {
            device_id: device_id.map(str::to_string),
            facing: mode.preferred_facing(),
            width: self.config.resolution.0,
            height: self.config.resolution.1,
            fps: self.config.fps,
        };

        let stream = match self.backend.open(&constraints).await {
            Ok(stream) => stream,
            Err(CameraError::DeviceUnavailable { device_id: gone }) if device_id.is_some() => {
                warn!(
                    device_id = %gone,
                    "selected device no longer valid; retrying with default"
                );
                let fallback = StreamConstraints {
                    device_id: None,
                    ..constraints
                };
                self.backend.open(&fallback).await?
            }
            Err(e) => return Err(e),
        };

        info!(device_id = stream.device_id(), ?mode, "capture stream started");
        self.stream = Some(stream);
        Ok(())
    }

    /// Idempotent; always safe to call. Releases all hardware tracks and
    /// ends any pending frame poll (the stream yields None afterwards).
    pub fn stop(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.release();
            debug!(device_id = stream.device_id(), "capture stream released");
        }
    }

    pub fn is_active(&self) -> bool {
        self.stream.is_some()
    }

    /// Tracks still held across the session; zero after `stop`
    pub fn active_tracks(&self) -> usize {
        self.stream.as_ref().map_or(0, |s| s.active_tracks())
    }

    pub fn stream_mut(&mut self) -> Option<&mut (dyn CaptureStream + '_)> {
        match self.stream.as_mut() {
            Some(stream) => Some(stream.as_mut()),
            None => None,
        }
    }
}

impl Drop for CameraSessionManager {
    fn drop(&mut self) {
        // No dangling open tracks on teardown
        self.stop();
    }
}
