//! Camera capture loop (§4.1): open, tune, rotate, mask, and publish frames
//! at the configured rate, with auto-brightness and reconnect-on-failure.

pub mod brightness;
pub mod ip_source;
pub mod mask;

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::config::camera::Camera as CameraConfig;
use crate::error::Result;
use crate::frame_slot::{Frame, FrameSlot};
use crate::state::AppState;

/// Abstraction over the physical or simulated camera backend, so the
/// capture loop is testable without real hardware.
pub trait CameraSource: Send {
    /// Apply the subset of tunables the backend supports (exposure,
    /// brightness, gain, ...).
    fn configure(&mut self, cfg: &CameraConfig) -> Result<()>;

    /// Grab one raw frame as greyscale-plus-color planes encoded as JPEG.
    fn grab_jpeg(&mut self) -> Result<Vec<u8>>;
}

const RECONNECT_FAILURE_THRESHOLD: u32 = 25;
const RECONNECT_DELAY: Duration = Duration::from_secs(12);

/// Drives one camera's capture loop until `state.is_started()` goes false.
/// Takes an open `source` rather than an address so tests can inject a fake
/// backend; a real binary opens the configured address first.
pub async fn run_capture_loop(
    state: Arc<AppState>,
    mut source: Box<dyn CameraSource>,
    open_source: impl Fn() -> Result<Box<dyn CameraSource>> + Send + Sync + 'static,
) {
    let mut consecutive_failures = 0u32;
    let mut last_brightness_step: i32 = 0;
    let mut stable_count: u32 = 0;
    let mut frame_id: u64 = 0;

    loop {
        if !state.is_started() {
            break;
        }

        let cfg = state.camera.read().unwrap().as_ref().camera.clone();
        let period = {
            let lpr = &state.camera.read().unwrap().as_ref().lpr;
            if lpr.frameRate > 0.0 {
                Duration::from_secs_f64(1.0 / lpr.frameRate)
            } else {
                Duration::from_millis(500)
            }
        };
        let tick_start = Instant::now();

        match source.grab_jpeg() {
            Ok(raw_jpeg) => {
                consecutive_failures = 0;

                if cfg.brightness == 0 {
                    if let Some(step) = brightness::sample_and_maybe_apply(
                        &raw_jpeg,
                        last_brightness_step,
                        &mut stable_count,
                    ) {
                        last_brightness_step = step;
                        let mut applied = cfg.clone();
                        applied.brightness = step;
                        let _ = source.configure(&applied);
                    }
                }

                let masked_jpeg = mask::apply_mask(&raw_jpeg, &cfg.imageMask).unwrap_or_else(|_| raw_jpeg.clone());

                frame_id += 1;
                state.frame_slot.publish(Frame {
                    id: frame_id,
                    masked_jpeg,
                    raw_jpeg,
                    captured_at: now_secs(),
                });
            }
            Err(e) => {
                consecutive_failures += 1;
                crate::logging::log_event(
                    crate::logging::EventKind::Warning,
                    &format!("capture failed ({consecutive_failures}/{RECONNECT_FAILURE_THRESHOLD}): {e}"),
                );
                if consecutive_failures >= RECONNECT_FAILURE_THRESHOLD {
                    crate::logging::log_event(
                        crate::logging::EventKind::Error,
                        "camera unresponsive, reconnecting",
                    );
                    tokio::time::sleep(RECONNECT_DELAY).await;
                    match open_source() {
                        Ok(new_source) => {
                            source = new_source;
                            consecutive_failures = 0;
                        }
                        Err(e) => {
                            crate::logging::log_event(
                                crate::logging::EventKind::Error,
                                &format!("reconnect failed: {e}"),
                            );
                        }
                    }
                }
            }
        }

        let elapsed = tick_start.elapsed();
        if elapsed < period {
            tokio::time::sleep(period - elapsed).await;
        }
    }
}

fn now_secs() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}
