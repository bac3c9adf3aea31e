mod device;
mod session;
mod synthetic;

pub use device::{CameraBackend, CaptureMode, CaptureStream, DeviceDescriptor, Facing, StreamConstraints};
pub use session::CameraSessionManager;
pub use synthetic::{blank_frame, render_qr_frame, SyntheticCamera};
