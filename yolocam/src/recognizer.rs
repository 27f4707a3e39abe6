//! The recognizer activity (§5): waits for each published frame, posts it to
//! the recognition engine, runs the bounds sieve, and feeds the surviving
//! results through the aggregator — finalizing any plate that has dropped
//! out of view since the previous frame.

use std::collections::HashSet;
use std::sync::Arc;

use crate::config::camera::SinkKind;
use crate::logging::{log_event, EventKind};
use crate::recognition::bounds;
use crate::recognition::RecognitionClient;
use crate::state::AppState;

pub async fn run(state: Arc<AppState>, recognition: Arc<RecognitionClient>, device_address: String) {
    let mut seen_last: HashSet<String> = HashSet::new();
    let mut last_tick = now_secs();

    loop {
        if !state.is_started() {
            break;
        }

        let frame = state.frame_slot.wait_take().await;
        let (lpr, resolution, angle, is_api) = {
            let camera = state.camera.read().unwrap();
            let doc = camera.as_ref();
            (doc.lpr.clone(), doc.camera.resolution, doc.camera.angle, doc.lpr.interface.kind == SinkKind::Api)
        };

        match recognition.recognize(frame.masked_jpeg.clone(), &device_address, &lpr.region, false).await {
            Ok(mut reading) => {
                reading.received_at = now_secs();
                reading.frame = Some(frame.masked_jpeg.clone());

                for result in reading.results.iter_mut() {
                    result.passed = bounds::check_bounds(result, &lpr, resolution, angle).is_ok();
                    if !result.passed {
                        log_event(EventKind::Warning, &format!("result for plate {} rejected by bounds sieve", result.plate));
                    }
                }

                let now = now_secs();
                let events = {
                    let mut agg = state.aggregator.write().unwrap();
                    let mut queue = state.decisions.write().unwrap();
                    let mut flushed = state.flushed.write().unwrap();
                    agg.observe(&mut reading, now, &lpr, &device_address, &mut queue, &mut flushed, is_api)
                };

                if !events.new_plates.is_empty() {
                    *state.new_plate_flag.write().unwrap() = true;
                }

                let seen_now: HashSet<String> = events.plates_seen.into_iter().collect();
                {
                    let mut agg = state.aggregator.write().unwrap();
                    let mut queue = state.decisions.write().unwrap();
                    let ignorelist = state.ignorelist.read().unwrap();
                    for plate in seen_last.difference(&seen_now) {
                        agg.finalize(plate, &lpr, resolution.height as f64, now, &mut queue, &ignorelist);
                    }
                }
                seen_last = seen_now;

                state.history.write().unwrap().push(reading);
            }
            Err(e) => {
                log_event(EventKind::Network, &format!("recognition request failed: {e}"));
            }
        }

        let now = now_secs();
        let dt = now - last_tick;
        last_tick = now;
        state.aggregator.write().unwrap().housekeep(dt, lpr.plateBlockingTime);
        state.history.write().unwrap().expire_results(lpr.resultExpireTime);
    }
}

fn now_secs() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}
