use crate::frame::VideoFrame;
use image::imageops::{self, FilterType};
use image::GrayImage;
use tracing::trace;

/// Attempt to decode a QR payload from one frame. A miss is not an error;
/// the polling loop simply moves on to the next frame.
pub fn decode_frame(frame: &VideoFrame, max_width: u32, try_inverted: bool) -> Option<String> {
    let gray = frame.to_luma()?;
    let scaled = downscale(gray, max_width);

    if let Some(text) = decode_luma(&scaled) {
        return Some(text);
    }
    if try_inverted {
        let mut inverted = scaled;
        imageops::invert(&mut inverted);
        return decode_luma(&inverted);
    }
    None
}

/// Downscale to at most `max_width` pixels wide, height proportional
pub fn downscale(img: GrayImage, max_width: u32) -> GrayImage {
    if img.width() <= max_width {
        return img;
    }
    let height = ((img.height() as u64 * max_width as u64) / img.width() as u64).max(1) as u32;
    imageops::resize(&img, max_width, height, FilterType::Triangle)
}

fn decode_luma(img: &GrayImage) -> Option<String> {
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        img.width() as usize,
        img.height() as usize,
        |x, y| img.get_pixel(x as u32, y as u32)[0],
    );

    prepared
        .detect_grids()
        .into_iter()
        .find_map(|grid| match grid.decode() {
            Ok((_, text)) => Some(text),
            Err(e) => {
                trace!("grid decode failed: {}", e);
                None
            }
        })
}
