//! The recognition engine's reading/result shape (§3, §4.2) plus the bounded
//! reading history the aggregator scans.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Bounding box in frame pixel coordinates. Field names match the engine's
/// wire format (`xmin`/`ymin`/`xmax`/`ymax`), not Rust convention.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct BBox {
    pub xmin: i32,
    pub ymin: i32,
    pub xmax: i32,
    pub ymax: i32,
}

impl BBox {
    pub fn width(&self) -> i32 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> i32 {
        self.ymax - self.ymin
    }

    pub fn top_left(&self) -> (i32, i32) {
        (self.xmin, self.ymin)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Region {
    pub code: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Vehicle {
    #[serde(rename = "type")]
    pub kind: String,
    pub score: f64,
    pub box_: Option<BBox>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub plate: String,
    pub score: f64,
}

/// One detected plate within a [`PlateReading`]. `loops`/`expire` are
/// runtime-only bookkeeping mutated by the aggregator, not part of the
/// engine's wire payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateResult {
    pub plate: String,
    pub score: f64,
    #[serde(rename = "dscore")]
    pub dscore: f64,
    #[serde(rename = "box")]
    pub box_: BBox,
    #[serde(default)]
    pub region: Region,
    #[serde(default)]
    pub vehicle: Option<Vehicle>,
    #[serde(default)]
    pub candidates: Vec<Candidate>,

    /// Aggregation passes this result has participated in.
    #[serde(skip)]
    pub loops: u32,
    /// Wall-time, in seconds, the aggregator has observed this result.
    #[serde(skip)]
    pub expire: f64,
    /// Set once the bounds-check sieve (§4.2) has accepted this result.
    #[serde(skip)]
    pub passed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Usage {
    #[serde(rename = "max_calls")]
    pub max_calls: u64,
    pub calls: u64,
}

/// One engine response: zero or more plates found in a single frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateReading {
    pub timestamp: String,
    #[serde(rename = "camera_id")]
    pub camera_id: String,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(rename = "processing_time", default)]
    pub processing_time: f64,
    #[serde(default)]
    pub usage: Usage,
    #[serde(default)]
    pub results: Vec<PlateResult>,

    /// The masked frame this reading was produced from, retained only long
    /// enough to attach imagery to a decision; never serialized onward.
    #[serde(skip)]
    pub frame: Option<Vec<u8>>,
    #[serde(skip)]
    pub received_at: f64,
}

/// Bounded FIFO of recent readings, per SPEC_FULL.md §3 ("bounded ≈120
/// entries").
pub struct ReadingHistory {
    capacity: usize,
    entries: VecDeque<PlateReading>,
}

impl ReadingHistory {
    pub fn new(capacity: usize) -> Self {
        ReadingHistory {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, reading: PlateReading) {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(reading);
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlateReading> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut PlateReading> {
        self.entries.iter_mut()
    }

    /// Remove results whose `expire` has exceeded `max_age`, across all
    /// readings in the history (§4.3 per-tick housekeeping).
    pub fn expire_results(&mut self, max_age: f64) {
        for reading in self.entries.iter_mut() {
            reading.results.retain(|r| r.expire <= max_age);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ReadingHistory {
    fn default() -> Self {
        ReadingHistory::new(120)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_drops_oldest_past_capacity() {
        let mut h = ReadingHistory::new(2);
        for i in 0..3 {
            h.push(PlateReading {
                timestamp: i.to_string(),
                camera_id: "cam0".into(),
                error: None,
                processing_time: 0.0,
                usage: Usage::default(),
                results: vec![],
                frame: None,
                received_at: i as f64,
            });
        }
        assert_eq!(h.len(), 2);
        assert_eq!(h.iter().next().unwrap().timestamp, "1");
    }

    #[test]
    fn expire_results_removes_stale_entries() {
        let mut h = ReadingHistory::new(4);
        let mut reading = PlateReading {
            timestamp: "0".into(),
            camera_id: "cam0".into(),
            error: None,
            processing_time: 0.0,
            usage: Usage::default(),
            results: vec![],
            frame: None,
            received_at: 0.0,
        };
        let mut r = sample_result("ABC123");
        r.expire = 3.0;
        reading.results.push(r);
        h.push(reading);
        h.expire_results(2.0);
        assert!(h.iter().next().unwrap().results.is_empty());
    }

    fn sample_result(plate: &str) -> PlateResult {
        PlateResult {
            plate: plate.to_string(),
            score: 0.9,
            dscore: 0.9,
            box_: BBox {
                xmin: 10,
                ymin: 10,
                xmax: 100,
                ymax: 50,
            },
            region: Region::default(),
            vehicle: None,
            candidates: vec![],
            loops: 0,
            expire: 0.0,
            passed: false,
        }
    }
}
