use super::device::{CameraBackend, CaptureStream, DeviceDescriptor, Facing, StreamConstraints};
use crate::error::CameraError;
use crate::frame::{FrameFormat, VideoFrame};
use async_trait::async_trait;
use qrcode::{Color, QrCode};
use std::collections::VecDeque;
use std::time::{Duration, SystemTime};
use tracing::debug;

const QUIET_ZONE_MODULES: u32 = 4;

/// Render a scan code into a grayscale QR frame, standard quiet zone
/// included. `inverted` swaps bit polarity (light modules on dark).
pub fn render_qr_frame(
    code: &str,
    module_px: u32,
    inverted: bool,
) -> Result<VideoFrame, CameraError> {
    let qr = QrCode::new(code.as_bytes()).map_err(|e| CameraError::Unknown {
        details: format!("qr encode failed: {}", e),
    })?;
    let modules = qr.width() as u32;
    let colors = qr.to_colors();

    let size = (modules + 2 * QUIET_ZONE_MODULES) * module_px;
    let (dark, light) = if inverted { (255u8, 0u8) } else { (0u8, 255u8) };
    let mut data = vec![light; (size * size) as usize];

    for my in 0..modules {
        for mx in 0..modules {
            if colors[(my * modules + mx) as usize] != Color::Dark {
                continue;
            }
            let x0 = (QUIET_ZONE_MODULES + mx) * module_px;
            let y0 = (QUIET_ZONE_MODULES + my) * module_px;
            for y in y0..y0 + module_px {
                let row = (y * size + x0) as usize;
                data[row..row + module_px as usize].fill(dark);
            }
        }
    }

    Ok(VideoFrame::new(
        0,
        SystemTime::now(),
        data,
        size,
        size,
        FrameFormat::Luma8,
    ))
}

/// A flat featureless frame that can never decode
pub fn blank_frame(width: u32, height: u32) -> VideoFrame {
    VideoFrame::new(
        0,
        SystemTime::now(),
        vec![128u8; (width * height) as usize],
        width,
        height,
        FrameFormat::Luma8,
    )
}

/// Camera backend that plays back scripted frames at the requested frame
/// rate. Backs the binary's simulate mode and the test suite; real
/// hardware lives behind the same `CameraBackend` trait.
pub struct SyntheticCamera {
    devices: Vec<DeviceDescriptor>,
    script: Vec<VideoFrame>,
    loop_last: bool,
    deny_permission: bool,
}

impl SyntheticCamera {
    /// Stream an endless feed of one QR frame carrying `code`
    pub fn with_code(code: &str) -> Result<Self, CameraError> {
        Ok(Self::with_frames(
            vec![render_qr_frame(code, 8, false)?],
            true,
        ))
    }

    /// Stream the given frames in order; `loop_last` repeats the final
    /// frame forever instead of ending the stream.
    pub fn with_frames(script: Vec<VideoFrame>, loop_last: bool) -> Self {
        Self {
            devices: Self::default_devices(),
            script,
            loop_last,
            deny_permission: false,
        }
    }

    /// Simulate a denied camera permission
    pub fn deny_permission(mut self) -> Self {
        self.deny_permission = true;
        self
    }

    /// Replace the advertised device set
    pub fn with_devices(mut self, devices: Vec<DeviceDescriptor>) -> Self {
        self.devices = devices;
        self
    }

    fn default_devices() -> Vec<DeviceDescriptor> {
        vec![
            DeviceDescriptor {
                id: "cam:environment:0".to_string(),
                label: "Back Camera".to_string(),
                facing: Some(Facing::Environment),
            },
            DeviceDescriptor {
                id: "cam:user:1".to_string(),
                label: "Front Camera".to_string(),
                facing: Some(Facing::User),
            },
        ]
    }
}

#[async_trait]
impl CameraBackend for SyntheticCamera {
    async fn enumerate(&self) -> Result<Vec<DeviceDescriptor>, CameraError> {
        if self.deny_permission {
            return Err(CameraError::PermissionDenied);
        }
        Ok(self.devices.clone())
    }

    async fn open(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Box<dyn CaptureStream>, CameraError> {
        if self.deny_permission {
            return Err(CameraError::PermissionDenied);
        }

        let device = match &constraints.device_id {
            Some(id) => self
                .devices
                .iter()
                .find(|d| &d.id == id)
                .ok_or_else(|| CameraError::DeviceUnavailable {
                    device_id: id.clone(),
                })?,
            None => self
                .devices
                .iter()
                .find(|d| d.facing == Some(constraints.facing))
                .or_else(|| self.devices.first())
                .ok_or_else(|| CameraError::Unknown {
                    details: "no video input devices".to_string(),
                })?,
        };

        debug!(device_id = %device.id, "opening synthetic capture stream");

        // Interval periods must be non-zero; fps above 1000 clamps to 1 ms
        let frame_interval = Duration::from_millis((1000 / constraints.fps.max(1) as u64).max(1));
        Ok(Box::new(SyntheticStream {
            device_id: device.id.clone(),
            frames: self.script.iter().cloned().collect(),
            loop_last: self.loop_last,
            released: false,
            interval: tokio::time::interval(frame_interval),
            next_id: 0,
        }))
    }
}

struct SyntheticStream {
    device_id: String,
    frames: VecDeque<VideoFrame>,
    loop_last: bool,
    released: bool,
    interval: tokio::time::Interval,
    next_id: u64,
}

#[async_trait]
impl CaptureStream for SyntheticStream {
    fn device_id(&self) -> &str {
        &self.device_id
    }

    async fn next_frame(&mut self) -> Option<VideoFrame> {
        if self.released {
            return None;
        }
        self.interval.tick().await;

        let template = self.frames.pop_front()?;
        if self.loop_last && self.frames.is_empty() {
            self.frames.push_back(template.clone());
        }

        let id = self.next_id;
        self.next_id += 1;
        Some(VideoFrame {
            id,
            timestamp: SystemTime::now(),
            data: template.data.clone(),
            width: template.width,
            height: template.height,
            format: template.format,
        })
    }

    fn active_tracks(&self) -> usize {
        if self.released {
            0
        } else {
            1
        }
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.frames.clear();
            debug!(device_id = %self.device_id, "synthetic stream released");
        }
    }
}
