use super::*;
use crate::camera::{blank_frame, render_qr_frame, CameraBackend, Facing, StreamConstraints, SyntheticCamera};
use crate::config::ScannerConfig;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn scanner() -> QrFrameScanner {
    QrFrameScanner::new(ScannerConfig {
        max_decode_width: 480,
        try_inverted: true,
    })
}

async fn open_stream(backend: &SyntheticCamera) -> Box<dyn crate::camera::CaptureStream> {
    let constraints = StreamConstraints {
        device_id: None,
        facing: Facing::Environment,
        width: 640,
        height: 480,
        fps: 1000,
    };
    backend.open(&constraints).await.unwrap()
}

#[test]
fn test_decode_frame_normal_polarity() {
    let frame = render_qr_frame("2024001", 8, false).unwrap();
    assert_eq!(decode_frame(&frame, 480, false).as_deref(), Some("2024001"));
}

#[test]
fn test_decode_frame_inverted_polarity() {
    let frame = render_qr_frame("2024001", 8, true).unwrap();
    // Inverted frames only decode when the inverted retry is enabled
    assert_eq!(decode_frame(&frame, 480, false), None);
    assert_eq!(decode_frame(&frame, 480, true).as_deref(), Some("2024001"));
}

#[test]
fn test_decode_after_downscale() {
    // 24 px modules render wider than the decode width cap (a 21-module
    // code plus quiet zones is 696 px), forcing the proportional downscale
    // path before a successful decode
    let frame = render_qr_frame("2024001", 24, false).unwrap();
    assert!(frame.width > 480);
    assert_eq!(decode_frame(&frame, 480, false).as_deref(), Some("2024001"));
}

#[test]
fn test_blank_frame_is_a_miss_not_an_error() {
    let frame = blank_frame(640, 480);
    assert_eq!(decode_frame(&frame, 480, true), None);
}

#[test]
fn test_downscale_preserves_aspect_ratio() {
    let img = image::GrayImage::new(960, 540);
    let scaled = downscale(img, 480);
    assert_eq!(scaled.dimensions(), (480, 270));

    // Frames already narrow enough pass through untouched
    let small = image::GrayImage::new(320, 240);
    assert_eq!(downscale(small, 480).dimensions(), (320, 240));
}

#[tokio::test]
async fn test_scan_retries_misses_until_success() {
    // Three undecodable frames, then the payload
    let backend = SyntheticCamera::with_frames(
        vec![
            blank_frame(640, 480),
            blank_frame(640, 480),
            blank_frame(640, 480),
            render_qr_frame("2024001", 8, false).unwrap(),
        ],
        true,
    );
    let mut stream = open_stream(&backend).await;
    let cancel = CancellationToken::new();

    let decoded = scanner().scan(stream.as_mut(), &cancel).await;
    assert_eq!(decoded.as_deref(), Some("2024001"));
}

#[tokio::test]
async fn test_scan_produces_at_most_one_result_per_invocation() {
    // Endless stream of decodable frames; scan still returns exactly once
    let backend = SyntheticCamera::with_code("2024001").unwrap();
    let mut stream = open_stream(&backend).await;
    let cancel = CancellationToken::new();

    let first = scanner().scan(stream.as_mut(), &cancel).await;
    assert_eq!(first.as_deref(), Some("2024001"));
}

#[tokio::test]
async fn test_cancellation_stops_the_loop() {
    // Frames never decode, so only cancellation can end the loop
    let backend = SyntheticCamera::with_frames(vec![blank_frame(640, 480)], true);
    let mut stream = open_stream(&backend).await;
    let cancel = CancellationToken::new();

    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel();
    });

    let decoded = scanner().scan(stream.as_mut(), &cancel).await;
    assert_eq!(decoded, None);
}

#[tokio::test]
async fn test_cancelled_token_prevents_any_decode_attempt() {
    let backend = SyntheticCamera::with_code("2024001").unwrap();
    let mut stream = open_stream(&backend).await;

    let cancel = CancellationToken::new();
    cancel.cancel();

    // A cancelled loop is never resurrected
    let decoded = scanner().scan(stream.as_mut(), &cancel).await;
    assert_eq!(decoded, None);
}

#[tokio::test]
async fn test_scan_ends_when_stream_is_released() {
    let backend = SyntheticCamera::with_frames(vec![blank_frame(640, 480)], false);
    let mut stream = open_stream(&backend).await;
    let cancel = CancellationToken::new();

    // Stream ends after its single scripted frame
    let decoded = scanner().scan(stream.as_mut(), &cancel).await;
    assert_eq!(decoded, None);
}
