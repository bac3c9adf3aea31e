mod decode;
#[cfg(test)]
mod tests;

pub use decode::{decode_frame, downscale};

use crate::camera::CaptureStream;
use crate::config::ScannerConfig;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Cooperative per-frame QR polling loop. Each `scan` invocation awaits
/// frames at the stream's own cadence, decodes until the first success,
/// and produces at most one result. Cancellation ends the loop for good;
/// restarting is only via explicit re-invocation after a new `scan` call.
pub struct QrFrameScanner {
    config: ScannerConfig,
}

impl QrFrameScanner {
    pub fn new(config: ScannerConfig) -> Self {
        Self { config }
    }

    /// Poll frames until a QR payload decodes or the loop is cancelled.
    /// Decode misses continue indefinitely; None means cancellation or a
    /// stream that ended without a decode.
    pub async fn scan(
        &self,
        stream: &mut dyn CaptureStream,
        cancel: &CancellationToken,
    ) -> Option<String> {
        let mut attempts: u64 = 0;
        loop {
            if cancel.is_cancelled() {
                debug!(attempts, "scan loop cancelled before next frame");
                return None;
            }

            let frame = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(attempts, "scan loop cancelled");
                    return None;
                }
                frame = stream.next_frame() => match frame {
                    Some(frame) => frame,
                    None => {
                        debug!(attempts, "capture stream ended without a decode");
                        return None;
                    }
                },
            };

            attempts += 1;
            if let Some(text) =
                decode_frame(&frame, self.config.max_decode_width, self.config.try_inverted)
            {
                debug!(attempts, frame_id = frame.id, "qr payload decoded");
                return Some(text);
            }
            trace!(frame_id = frame.id, "no qr in frame");
        }
    }
}
