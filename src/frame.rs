use image::GrayImage;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::warn;

/// Pixel layout of a captured frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    /// 8-bit grayscale, 1 byte per pixel
    Luma8,
    /// Packed RGB, 3 bytes per pixel
    Rgb24,
}

impl FrameFormat {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            FrameFormat::Luma8 => 1,
            FrameFormat::Rgb24 => 3,
        }
    }
}

/// A single captured video frame with metadata
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Monotonic id within the owning stream
    pub id: u64,
    /// Capture timestamp
    pub timestamp: SystemTime,
    /// Raw pixel data (shared ownership for cheap clones)
    pub data: Arc<Vec<u8>>,
    pub width: u32,
    pub height: u32,
    pub format: FrameFormat,
}

impl VideoFrame {
    pub fn new(
        id: u64,
        timestamp: SystemTime,
        data: Vec<u8>,
        width: u32,
        height: u32,
        format: FrameFormat,
    ) -> Self {
        Self {
            id,
            timestamp,
            data: Arc::new(data),
            width,
            height,
            format,
        }
    }

    pub fn expected_size(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }

    pub fn validate_size(&self) -> bool {
        self.data.len() == self.expected_size()
    }

    /// Convert to an 8-bit grayscale image for decoding. Returns None on
    /// malformed pixel data; callers treat that as a decode miss.
    pub fn to_luma(&self) -> Option<GrayImage> {
        if !self.validate_size() {
            warn!(
                frame_id = self.id,
                expected = self.expected_size(),
                actual = self.data.len(),
                "frame data size mismatch"
            );
            return None;
        }

        match self.format {
            FrameFormat::Luma8 => GrayImage::from_raw(self.width, self.height, self.data.to_vec()),
            FrameFormat::Rgb24 => {
                let mut gray = GrayImage::new(self.width, self.height);
                for (i, pixel) in gray.pixels_mut().enumerate() {
                    let base = i * 3;
                    let r = self.data[base] as f32;
                    let g = self.data[base + 1] as f32;
                    let b = self.data[base + 2] as f32;
                    pixel[0] = (0.299 * r + 0.587 * g + 0.114 * b) as u8;
                }
                Some(gray)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_size_validation() {
        let valid = VideoFrame::new(
            1,
            SystemTime::now(),
            vec![0u8; 640 * 480],
            640,
            480,
            FrameFormat::Luma8,
        );
        assert!(valid.validate_size());

        let invalid = VideoFrame::new(
            2,
            SystemTime::now(),
            vec![0u8; 100],
            640,
            480,
            FrameFormat::Luma8,
        );
        assert!(!invalid.validate_size());
        assert!(invalid.to_luma().is_none());
    }

    #[test]
    fn test_rgb24_to_luma_conversion() {
        // A pure-white RGB frame becomes pure-white luma
        let frame = VideoFrame::new(
            1,
            SystemTime::now(),
            vec![255u8; 4 * 4 * 3],
            4,
            4,
            FrameFormat::Rgb24,
        );
        let gray = frame.to_luma().unwrap();
        assert_eq!(gray.dimensions(), (4, 4));
        assert!(gray.pixels().all(|p| p[0] >= 254));
    }

    #[test]
    fn test_luma8_roundtrip() {
        let data: Vec<u8> = (0..16).collect();
        let frame = VideoFrame::new(1, SystemTime::now(), data.clone(), 4, 4, FrameFormat::Luma8);
        let gray = frame.to_luma().unwrap();
        assert_eq!(gray.into_raw(), data);
    }
}
