pub mod attendance;
pub mod camera;
pub mod config;
pub mod error;
pub mod events;
pub mod frame;
pub mod geofence;
pub mod kiosk;
pub mod model;
pub mod notify;
pub mod scanner;
pub mod store;

pub use attendance::{AttendanceService, SubmissionReceipt};
pub use camera::{
    CameraBackend, CameraSessionManager, CaptureMode, CaptureStream, DeviceDescriptor, Facing,
    StreamConstraints, SyntheticCamera,
};
pub use config::AbsensiConfig;
pub use error::{AbsensiError, CameraError, GeoError, NotifyError, Result, StoreError, SubmitError};
pub use events::{EventBus, KioskEvent};
pub use frame::{FrameFormat, VideoFrame};
pub use geofence::{
    haversine_distance_m, FixedPositionProvider, GateVerdict, GeofenceGate, Position,
    PositionProvider, EARTH_RADIUS_METERS,
};
pub use kiosk::{CheckInKiosk, CheckInOutcome, ScanStatus, ScanTab};
pub use model::{
    AttendanceMethod, AttendanceRecord, AttendanceStatus, NewAttendance, PersonRef, Student,
    Teacher,
};
pub use notify::{GuardianNotifier, WhatsappMock};
pub use scanner::QrFrameScanner;
pub use store::{AttendanceStore, MemoryStore};
