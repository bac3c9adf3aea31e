use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::PersonRef;

#[derive(Error, Debug)]
pub enum AbsensiError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("Geolocation error: {0}")]
    Geo(#[from] GeoError),

    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),

    #[error("Submission error: {0}")]
    Submit(#[from] SubmitError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("System error: {message}")]
    System { message: String },

    #[error("Component error in {component}: {message}")]
    Component { component: String, message: String },
}

impl AbsensiError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    pub fn component<S: Into<String>>(component: S, message: S) -> Self {
        Self::Component {
            component: component.into(),
            message: message.into(),
        }
    }
}

/// Failures acquiring a device position. Reported distinctly from an
/// out-of-radius verdict, which is a gate decision rather than an error.
#[derive(Error, Debug)]
pub enum GeoError {
    #[error("position sensor unavailable: {details}")]
    SensorUnavailable { details: String },

    #[error("position permission denied")]
    PermissionDenied,
}

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("camera permission denied")]
    PermissionDenied,

    /// The requested device is gone or cannot satisfy the constraints.
    /// When an explicit device id was requested the session manager retries
    /// with default constraints before surfacing this.
    #[error("camera device unavailable: {device_id}")]
    DeviceUnavailable { device_id: String },

    #[error("camera error: {details}")]
    Unknown { details: String },
}

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("scan code not recognized: {code}")]
    NotRecognized { code: String },

    #[error("duplicate scan for {person}; last recorded at {last_seen}")]
    DuplicateScan {
        person: PersonRef,
        last_seen: DateTime<Utc>,
    },

    #[error("attendance write failed: {0}")]
    Write(#[from] StoreError),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store backend error: {details}")]
    Backend { details: String },
}

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("notification transport error: {details}")]
    Transport { details: String },
}

pub type Result<T> = std::result::Result<T, AbsensiError>;
