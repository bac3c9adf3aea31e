use crate::error::CameraError;
use crate::frame::VideoFrame;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Which way a device points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Facing {
    /// Toward the operator (selfie camera)
    User,
    /// Away from the operator (rear camera)
    Environment,
}

/// Logical capture mode; determines the preferred facing when no explicit
/// device id is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    QrScan,
    FaceCapture,
}

impl CaptureMode {
    pub fn preferred_facing(&self) -> Facing {
        match self {
            CaptureMode::QrScan => Facing::Environment,
            CaptureMode::FaceCapture => Facing::User,
        }
    }
}

/// A video input device as reported by enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    pub id: String,
    pub label: String,
    pub facing: Option<Facing>,
}

/// Constraints for opening a capture stream
#[derive(Debug, Clone)]
pub struct StreamConstraints {
    /// Explicit device id wins over the facing preference
    pub device_id: Option<String>,
    pub facing: Facing,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

/// Platform camera access: enumeration and stream acquisition.
/// Enumeration implies the backend holds (or transiently acquired) camera
/// permission, otherwise device labels would be empty.
#[async_trait]
pub trait CameraBackend: Send + Sync {
    async fn enumerate(&self) -> Result<Vec<DeviceDescriptor>, CameraError>;

    async fn open(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Box<dyn CaptureStream>, CameraError>;
}

/// An open capture stream. Frames arrive at the device's own cadence;
/// `next_frame` suspends between frames, so a caller polling it never
/// busy-loops. `release` must free every hardware track and is idempotent.
#[async_trait]
pub trait CaptureStream: Send {
    fn device_id(&self) -> &str;

    /// Await the next frame; None once the stream has ended or was released
    async fn next_frame(&mut self) -> Option<VideoFrame>;

    /// Number of hardware tracks still held
    fn active_tracks(&self) -> usize;

    fn release(&mut self);
}
