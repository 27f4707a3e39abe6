//! Sealed [`Decision`]s and the bounded in-memory queue with its
//! overflow-to-disk policy (§4.4).

use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::reading::{BBox, Region, Vehicle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Front,
    Rear,
    Both,
    Unknown,
    Left,
    Right,
}

/// An immutable-once-sealed recognition outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub device_address: String,
    pub uuid: Uuid,
    pub timestamp: String,
    pub plate: String,
    pub direction: Direction,
    pub score: f64,
    pub dscore: f64,
    /// Base64-encoded cropped plate JPEG.
    pub image: String,
    /// Base64-encoded full-scene JPEG, present only when configured.
    pub full_image: Option<String>,
    pub rectangle: BBox,
    pub speed: f64,
    pub region: Region,
    pub vehicle: Option<Vehicle>,
    pub candidates: Vec<crate::reading::Candidate>,

    #[serde(skip)]
    pub pending: bool,
    #[serde(skip)]
    pub delete: bool,
    #[serde(skip)]
    pub index: u64,
    #[serde(skip)]
    pub acked_by: HashSet<String>,
    /// Set once the housekeeper has handed this decision to its configured
    /// sink, so the 2s drain tick never double-delivers (§4.6).
    #[serde(skip)]
    pub dispatched: bool,
}

impl Decision {
    /// Compact JSON matching the original's `to_json()` separators — no
    /// extraneous whitespace, suitable for the SOCKET sink's field scan.
    pub fn to_compact_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// In-memory decision queue, hard-capped at 5 entries (§4.4).
pub struct DecisionQueue {
    cap: usize,
    entries: VecDeque<Decision>,
    next_index: u64,
}

impl DecisionQueue {
    pub fn new() -> Self {
        DecisionQueue {
            cap: 5,
            entries: VecDeque::new(),
            next_index: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append `decision`, applying the configured overflow policy first.
    ///
    /// `is_api` selects between the durable flush-to-disk policy (API sink,
    /// §4.4) and the simple oldest-drop policy used by every other sink.
    pub fn push(&mut self, mut decision: Decision, is_api: bool, flushed: &mut super::outbox::flushed::FlushedStore) {
        self.entries.retain(|d| !d.delete);

        if self.entries.len() >= self.cap {
            if is_api {
                if let Some(pos) = self
                    .entries
                    .iter()
                    .position(|d| !d.pending && !d.acked_by.is_empty())
                {
                    self.entries.remove(pos);
                } else if let Some(pos) = self
                    .entries
                    .iter()
                    .rposition(|d| !d.pending && d.acked_by.is_empty())
                {
                    // Flush the newest non-pending, non-acknowledged entry rather
                    // than the oldest, so older decisions stay in memory and the
                    // flushed store is drained back in global order (§4.4).
                    if let Some(newest) = self.entries.remove(pos) {
                        flushed.store(&newest);
                    }
                } else {
                    self.entries.pop_front();
                }
            } else {
                self.entries.pop_front();
            }
        }

        if self.entries.len() < self.cap {
            decision.index = self.next_index;
            self.next_index += 1;
            self.entries.push_back(decision);
        }
    }

    /// Return the oldest non-pending decision not yet acked by `client_id`,
    /// restoring one from disk if the in-memory queue holds none.
    pub fn next_for_client(
        &mut self,
        client_id: &str,
        flushed: &mut super::outbox::flushed::FlushedStore,
    ) -> Option<&Decision> {
        if !self
            .entries
            .iter()
            .any(|d| !d.pending && !d.acked_by.contains(client_id))
        {
            if let Some(restored) = flushed.take_oldest() {
                self.entries.push_back(restored);
            }
        }
        self.entries
            .iter()
            .find(|d| !d.pending && !d.acked_by.contains(client_id))
    }

    pub fn ack(&mut self, client_id: &str, index: u64) {
        if let Some(d) = self.entries.iter_mut().find(|d| d.index == index) {
            d.acked_by.insert(client_id.to_string());
        }
    }

    pub fn mark_deleted(&mut self, index: u64) {
        if let Some(d) = self.entries.iter_mut().find(|d| d.index == index) {
            d.delete = true;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Decision> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Decision> {
        self.entries.iter_mut()
    }

    pub fn get_mut_by_plate(&mut self, plate: &str) -> Option<&mut Decision> {
        self.entries.iter_mut().find(|d| d.plate == plate && d.pending)
    }
}

impl Default for DecisionQueue {
    fn default() -> Self {
        DecisionQueue::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outbox::flushed::FlushedStore;

    fn sample(plate: &str, pending: bool) -> Decision {
        Decision {
            device_address: "cam0".into(),
            uuid: Uuid::new_v4(),
            timestamp: "2026-01-01T00:00:00Z".into(),
            plate: plate.into(),
            direction: Direction::Unknown,
            score: 0.9,
            dscore: 0.9,
            image: String::new(),
            full_image: None,
            rectangle: BBox::default(),
            speed: 0.0,
            region: Region::default(),
            vehicle: None,
            candidates: vec![],
            pending,
            delete: false,
            index: 0,
            acked_by: HashSet::new(),
            dispatched: false,
        }
    }

    #[test]
    fn queue_caps_at_five() {
        let mut q = DecisionQueue::new();
        let mut flushed = FlushedStore::in_memory_for_test();
        for i in 0..10 {
            q.push(sample(&format!("P{i}"), false), false, &mut flushed);
        }
        assert_eq!(q.len(), 5);
    }

    #[test]
    fn api_overflow_flushes_to_disk() {
        let mut q = DecisionQueue::new();
        let mut flushed = FlushedStore::in_memory_for_test();
        for i in 0..10 {
            q.push(sample(&format!("P{i}"), false), true, &mut flushed);
        }
        assert_eq!(q.len(), 5);
        assert!(flushed.len() > 0);
    }

    #[test]
    fn api_overflow_keeps_oldest_in_memory_and_flushes_newest() {
        let mut q = DecisionQueue::new();
        let mut flushed = FlushedStore::in_memory_for_test();
        for i in 0..10 {
            q.push(sample(&format!("P{i}"), false), true, &mut flushed);
        }
        let in_memory: Vec<String> = q.iter().map(|d| d.plate.clone()).collect();
        // The four oldest decisions never leave memory; each overflow bumps
        // whichever decision was most recently appended, not the oldest one.
        assert_eq!(&in_memory[..4], &["P0", "P1", "P2", "P3"]);
        assert_eq!(flushed.len(), 5);
    }

    #[test]
    fn ack_is_idempotent_and_advances_cursor() {
        let mut q = DecisionQueue::new();
        let mut flushed = FlushedStore::in_memory_for_test();
        q.push(sample("AAA111", false), true, &mut flushed);
        let idx = q.iter().next().unwrap().index;
        q.ack("client-1", idx);
        assert!(q.next_for_client("client-1", &mut flushed).is_none());
        q.ack("client-1", idx);
        assert!(q.next_for_client("client-1", &mut flushed).is_none());
    }
}
