//! Multi-frame decision aggregator (§4.3): turns a stream of bounds-passing
//! plate results into sealed [`Decision`]s with direction, speed, and
//! candidate substitution applied.
//!
//! The original dispatches collection on an independent 100ms timer that
//! rescans the whole reading history each pass. Here, since every reading
//! already arrives through [`Aggregator::observe`], collection and
//! emission-rule evaluation happen inline per incoming reading; the net
//! effect (a plate's "loops" growing by one per aggregation pass while it
//! keeps appearing) is preserved without a second scan over history.

pub mod candidate;
pub mod direction;

use std::collections::HashMap;

use uuid::Uuid;

use crate::config::camera::{DecisionModel, DirectionFilter, LprOptions, SelectedDecision};
use crate::decision::{Decision, DecisionQueue, Direction};
use crate::lists::PlateList;
use crate::outbox::flushed::FlushedStore;
use crate::reading::{PlateReading, PlateResult, Vehicle};

use direction::TrackPoint;

/// Per-plate aggregation state, owned by a single [`Aggregator`] instance
/// (one per camera).
#[derive(Default)]
pub struct Aggregator {
    plate_counts: HashMap<String, u32>,
    ignore_timers: HashMap<String, f64>,
    tracks: HashMap<String, Vec<TrackPoint>>,
    collected: HashMap<String, Vec<PlateResult>>,
    /// Cumulative aggregation-pass counter per plate, driving each
    /// collected result's `loops` field independently of the fresh engine
    /// result object it was copied from.
    loop_counts: HashMap<String, u32>,
    pub current_plate: Option<String>,
}

/// Outcome of feeding one reading through the aggregator, consumed by the
/// housekeeper to drive the PLATE/NEW_PLATE GPIO pulses (§4.1, §4.7).
#[derive(Debug, Default)]
pub struct IngestEvents {
    pub new_plates: Vec<String>,
    pub plates_seen: Vec<String>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one reading's bounds-passing results through the aggregator:
    /// updates the plate-count map and direction track, collects results
    /// once a plate's count crosses `minRecognitions`, and emits a decision
    /// the tick that the emission rule is satisfied (§4.3).
    #[allow(clippy::too_many_arguments)]
    pub fn observe(
        &mut self,
        reading: &mut PlateReading,
        now: f64,
        lpr: &LprOptions,
        device_address: &str,
        queue: &mut DecisionQueue,
        flushed: &mut FlushedStore,
        is_api: bool,
    ) -> IngestEvents {
        let mut events = IngestEvents::default();
        let mut touched = Vec::new();

        for result in reading.results.iter_mut().filter(|r| r.passed) {
            events.plates_seen.push(result.plate.clone());

            let count = self.plate_counts.entry(result.plate.clone()).or_insert(0);
            if *count == 0 {
                events.new_plates.push(result.plate.clone());
            }
            *count += 1;
            let count = *count;

            let (x, y) = result.box_.top_left();
            self.tracks
                .entry(result.plate.clone())
                .or_default()
                .push(TrackPoint { x: x as f64, y: y as f64, t: now });

            if count >= lpr.minRecognitions {
                let loop_count = self.loop_counts.entry(result.plate.clone()).or_insert(0);
                *loop_count += 1;
                result.loops = *loop_count;
                self.collected.entry(result.plate.clone()).or_default().push(result.clone());
                touched.push(result.plate.clone());
            }
        }

        for plate in touched {
            self.maybe_emit(&plate, lpr, device_address, queue, flushed, is_api);
        }

        events
    }

    fn maybe_emit(
        &mut self,
        plate: &str,
        lpr: &LprOptions,
        device_address: &str,
        queue: &mut DecisionQueue,
        flushed: &mut FlushedStore,
        is_api: bool,
    ) {
        let should_emit = {
            let Some(collected) = self.collected.get(plate) else {
                return;
            };
            let last_loops = collected.last().map(|r| r.loops).unwrap_or(0);
            match lpr.decisionModel {
                DecisionModel::AccessControl => {
                    collected.len() as u32 >= 2 * lpr.minRecognitions && last_loops >= 1
                }
                DecisionModel::FreeFlow => collected.len() as u32 >= lpr.minRecognitions && last_loops > 2,
            }
        };
        if !should_emit {
            return;
        }

        if self.ignore_timers.contains_key(plate) {
            self.collected.remove(plate);
            self.loop_counts.remove(plate);
            return;
        }

        let collected = self.collected.remove(plate).unwrap();
        self.loop_counts.remove(plate);
        let chosen = select_sample(&collected, lpr.selectedDecision);
        self.ignore_timers.insert(plate.to_string(), 0.0);
        self.current_plate = Some(plate.to_string());

        let decision = build_decision(device_address, plate, &chosen, lpr);
        queue.push(decision, is_api, flushed);
    }

    /// Finalize the pending decision for `plate` once it is no longer
    /// visible (or unconditionally, in access-control mode): computes
    /// direction/speed, applies filters, and performs candidate
    /// substitution (§4.3 finalization).
    pub fn finalize(
        &mut self,
        plate: &str,
        lpr: &LprOptions,
        resolution_height_px: f64,
        now: f64,
        queue: &mut DecisionQueue,
        ignorelist: &PlateList,
    ) {
        let Some(points) = self.tracks.get_mut(plate) else {
            return;
        };
        direction::dedupe(points);
        direction::prune_stale(points, now, 30.0);

        let dir = direction::direction_lookup(points, lpr.directionThreshold);
        let speed = direction::calculate_speed(points, lpr.frameHeight, resolution_height_px);

        let reject = (lpr.denyNumericDecision && plate.chars().all(|c| c.is_ascii_digit()))
            || ignorelist.contains(plate)
            || !direction_allowed(dir, lpr.directionFilter);

        if reject {
            if let Some(d) = queue.get_mut_by_plate(plate) {
                d.delete = true;
            }
            self.plate_counts.remove(plate);
            self.ignore_timers.remove(plate);
            self.tracks.remove(plate);
            return;
        }

        if let Some(d) = queue.get_mut_by_plate(plate) {
            d.direction = dir;
            d.speed = speed;
            if lpr.useCandidates {
                if let Some(sub) = candidate::find_candidate(&d.plate, &d.candidates) {
                    d.plate = sub;
                }
            }
            d.pending = false;
        }
        self.tracks.remove(plate);
    }

    /// Per-tick housekeeping: age out stale plate counts, ignore-window
    /// entries, and direction points (§4.3 "per tick housekeeping").
    pub fn housekeep(&mut self, dt: f64, plate_blocking_time: f64) {
        self.ignore_timers.retain(|_, t| {
            *t += dt;
            *t <= plate_blocking_time
        });
        for track in self.tracks.values_mut() {
            direction::prune_stale(track, dt, 60.0);
        }
    }
}

fn direction_allowed(dir: Direction, filter: DirectionFilter) -> bool {
    match (filter, dir) {
        (DirectionFilter::Both, _) => true,
        (DirectionFilter::Front, Direction::Front) => true,
        (DirectionFilter::Rear, Direction::Rear) => true,
        _ => false,
    }
}

fn select_sample(collected: &[PlateResult], selected: SelectedDecision) -> PlateResult {
    match selected {
        SelectedDecision::First => collected.first().cloned().unwrap(),
        SelectedDecision::Last => collected.last().cloned().unwrap(),
        SelectedDecision::Middle => {
            let idx = (collected.len() + 1) / 2 - 1;
            collected[idx].clone()
        }
    }
}

fn build_decision(device_address: &str, plate: &str, sample: &PlateResult, lpr: &LprOptions) -> Decision {
    let rectangle = sample.box_;
    let region = sample.region.clone();
    let vehicle: Option<Vehicle> = sample.vehicle.clone();
    Decision {
        device_address: device_address.to_string(),
        uuid: Uuid::new_v4(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        plate: plate.to_string(),
        direction: Direction::Both,
        score: sample.score,
        dscore: sample.dscore,
        image: String::new(),
        full_image: if lpr.includeFullImage != 0 { Some(String::new()) } else { None },
        rectangle,
        speed: 0.0,
        region,
        vehicle,
        candidates: sample.candidates.clone(),
        pending: true,
        delete: false,
        index: 0,
        acked_by: Default::default(),
        dispatched: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::{BBox, Region, Usage};

    fn reading_with_plate(plate: &str, passed: bool) -> PlateReading {
        PlateReading {
            timestamp: "now".into(),
            camera_id: "cam0".into(),
            error: None,
            processing_time: 0.01,
            usage: Usage::default(),
            results: vec![PlateResult {
                plate: plate.into(),
                score: 0.9,
                dscore: 0.9,
                box_: BBox { xmin: 10, ymin: 10, xmax: 100, ymax: 50 },
                region: Region::default(),
                vehicle: None,
                candidates: vec![],
                loops: 0,
                expire: 0.0,
                passed,
            }],
            frame: None,
            received_at: 0.0,
        }
    }

    #[test]
    fn emits_after_minimum_recognitions() {
        let mut agg = Aggregator::new();
        let mut lpr = LprOptions::default();
        lpr.minRecognitions = 3;
        lpr.decisionModel = DecisionModel::FreeFlow;
        let mut queue = DecisionQueue::new();
        let mut flushed = FlushedStore::in_memory_for_test();

        // Needs count >= 3 (ticks 3..) then loops > 2, i.e. 3 more ticks
        // collecting before the rule fires.
        for i in 0..8 {
            let mut reading = reading_with_plate("ABC123", true);
            agg.observe(&mut reading, i as f64 * 0.1, &lpr, "cam0", &mut queue, &mut flushed, false);
        }
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.iter().next().unwrap().plate, "ABC123");
    }

    #[test]
    fn ignore_window_suppresses_repeat_emission() {
        let mut agg = Aggregator::new();
        let mut lpr = LprOptions::default();
        lpr.minRecognitions = 1;
        lpr.decisionModel = DecisionModel::FreeFlow;
        let mut queue = DecisionQueue::new();
        let mut flushed = FlushedStore::in_memory_for_test();

        for i in 0..8 {
            let mut reading = reading_with_plate("XY99", true);
            agg.observe(&mut reading, i as f64 * 0.1, &lpr, "cam0", &mut queue, &mut flushed, false);
        }
        assert_eq!(queue.len(), 1);
    }

    fn reading_at_ymin(plate: &str, ymin: i32) -> PlateReading {
        let mut reading = reading_with_plate(plate, true);
        reading.results[0].box_.ymin = ymin;
        reading.results[0].box_.ymax = ymin + 40;
        reading
    }

    #[test]
    fn finalize_computes_speed_from_configured_frame_height() {
        let mut agg = Aggregator::new();
        let mut lpr = LprOptions::default();
        lpr.minRecognitions = 1;
        lpr.frameHeight = 200.0;
        lpr.decisionModel = DecisionModel::FreeFlow;
        let mut queue = DecisionQueue::new();
        let mut flushed = FlushedStore::in_memory_for_test();
        let ignorelist = PlateList::load(&std::env::temp_dir(), crate::lists::ListKind::Ignorelist);

        for i in 0..4 {
            let mut reading = reading_at_ymin("ABC999", i * 100);
            agg.observe(&mut reading, i as f64 * 0.1, &lpr, "cam0", &mut queue, &mut flushed, false);
        }
        assert_eq!(queue.len(), 1);
        agg.finalize("ABC999", &lpr, 1000.0, 0.4, &mut queue, &ignorelist);
        let speed = queue.iter().next().unwrap().speed;
        assert!((speed - 7.2).abs() < 1e-6, "speed was {speed}");
    }

    #[test]
    fn numeric_only_plate_is_rejected_on_finalize() {
        let mut agg = Aggregator::new();
        let mut lpr = LprOptions::default();
        lpr.minRecognitions = 1;
        lpr.denyNumericDecision = true;
        lpr.decisionModel = DecisionModel::FreeFlow;
        let mut queue = DecisionQueue::new();
        let mut flushed = FlushedStore::in_memory_for_test();
        let ignorelist = PlateList::load(&std::env::temp_dir(), crate::lists::ListKind::Ignorelist);

        for i in 0..8 {
            let mut reading = reading_with_plate("123456", true);
            agg.observe(&mut reading, i as f64 * 0.1, &lpr, "cam0", &mut queue, &mut flushed, false);
        }
        assert_eq!(queue.len(), 1);
        agg.finalize("123456", &lpr, 1080.0, 1.0, &mut queue, &ignorelist);
        assert!(queue.iter().next().unwrap().delete);
    }
}
