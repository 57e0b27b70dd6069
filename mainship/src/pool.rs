//! Fleet registry: fixed-capacity slot table with liveness tracking.

use std::fmt::Write as _;

use defensematrix_shared::{DroneKind, MotionState, PeerId};
use tracing::{debug, info};

/// One registered drone. Owned exclusively by the pool.
#[derive(Debug, Clone)]
pub struct DroneRecord {
    pub id: PeerId,
    pub kind: DroneKind,
    pub motion: MotionState,
    pub alive: bool,
    pub last_heartbeat: u64,
}

impl DroneRecord {
    pub fn new(id: PeerId, kind: DroneKind, now: u64) -> Self {
        Self {
            id,
            kind,
            motion: MotionState::Idle,
            alive: true,
            last_heartbeat: now,
        }
    }
}

/// Slot table keyed by drone identity. Capacity is fixed at construction;
/// there is no growth and no eviction of live drones to make room.
///
/// All timestamps are caller-supplied milliseconds, so owners control the
/// clock and tests can inject time.
#[derive(Debug)]
pub struct DronePool {
    slots: Vec<Option<DroneRecord>>,
    heartbeat_timeout_ms: u64,
}

impl DronePool {
    pub fn new(capacity: usize, heartbeat_timeout_ms: u64) -> Self {
        Self {
            slots: vec![None; capacity],
            heartbeat_timeout_ms,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: PeerId) -> Option<&DroneRecord> {
        self.slots
            .iter()
            .flatten()
            .find(|record| record.id == id)
    }

    /// Occupied slots with their positional index. The index is the binding
    /// key for placement directions, so slot reuse silently reassigns them.
    pub fn iter_slots(&self) -> impl Iterator<Item = (usize, &DroneRecord)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|record| (i, record)))
    }

    /// Register a drone. A same-id slot is overwritten in place
    /// (re-registration); otherwise the first free slot is claimed. Returns
    /// `false` when the pool is full.
    pub fn register(&mut self, record: DroneRecord) -> bool {
        if let Some(slot) = self
            .slots
            .iter_mut()
            .find(|slot| slot.as_ref().is_some_and(|r| r.id == record.id))
        {
            *slot = Some(record);
            return true;
        }
        if let Some(slot) = self.slots.iter_mut().find(|slot| slot.is_none()) {
            *slot = Some(record);
            return true;
        }
        false
    }

    /// Free the slot holding `id`, immediately and regardless of liveness.
    pub fn deregister(&mut self, id: PeerId) {
        for slot in &mut self.slots {
            if slot.as_ref().is_some_and(|r| r.id == id) {
                info!(id, "drone deregistered");
                *slot = None;
            }
        }
    }

    /// Refresh the heartbeat timestamp of every record matching `id`
    /// (expected to be at most one).
    pub fn heartbeat(&mut self, id: PeerId, now: u64) {
        for record in self.slots.iter_mut().flatten() {
            if record.id == id {
                record.last_heartbeat = now;
            }
        }
    }

    /// Record the motion state a drone reported.
    pub fn update_motion(&mut self, id: PeerId, motion: MotionState) {
        for record in self.slots.iter_mut().flatten() {
            if record.id == id {
                record.motion = motion;
            }
        }
    }

    /// First maintenance pass: mark records with a stale heartbeat as
    /// not-alive. They stay observable until the eviction pass frees them.
    pub fn mark_expired(&mut self, now: u64) -> usize {
        let mut marked = 0;
        for record in self.slots.iter_mut().flatten() {
            if record.alive && record.last_heartbeat + self.heartbeat_timeout_ms < now {
                debug!(id = record.id, "drone heartbeat expired");
                record.alive = false;
                marked += 1;
            }
        }
        marked
    }

    /// Second maintenance pass: free the slots of all not-alive records.
    pub fn evict_dead(&mut self) -> usize {
        let mut evicted = 0;
        for slot in &mut self.slots {
            if let Some(id) = slot.as_ref().filter(|r| !r.alive).map(|r| r.id) {
                info!(id, "dead drone evicted");
                *slot = None;
                evicted += 1;
            }
        }
        evicted
    }

    /// Run both maintenance passes, marking before evicting.
    pub fn sweep(&mut self, now: u64) {
        self.mark_expired(now);
        self.evict_dead();
    }

    /// One-line fleet summary for periodic status logging.
    pub fn status_line(&self) -> String {
        let mut line = String::new();
        for slot in &self.slots {
            match slot {
                Some(r) => {
                    let _ = write!(line, "[{} {:?}] ", r.id, r.motion);
                }
                None => line.push_str("[ - ] "),
            }
        }
        line.trim_end().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: u64 = 5_000;

    fn pool(capacity: usize) -> DronePool {
        DronePool::new(capacity, TIMEOUT)
    }

    fn record(id: PeerId, now: u64) -> DroneRecord {
        DroneRecord::new(id, DroneKind::Defense, now)
    }

    #[test]
    fn test_register_until_capacity() {
        let mut p = pool(3);
        assert!(p.register(record(1, 0)));
        assert!(p.register(record(2, 0)));
        assert!(p.register(record(3, 0)));
        assert_eq!(p.len(), 3);

        // no eviction of live drones to make room
        assert!(!p.register(record(4, 0)));
        assert_eq!(p.len(), 3);
        assert!(p.get(4).is_none());
    }

    #[test]
    fn test_reregistration_overwrites_in_place() {
        let mut p = pool(3);
        p.register(record(7, 100));
        let slot_before = p.iter_slots().next().unwrap().0;

        let mut fresh = record(7, 999);
        fresh.motion = MotionState::Running;
        assert!(p.register(fresh));

        assert_eq!(p.len(), 1);
        let (slot_after, r) = p.iter_slots().next().unwrap();
        assert_eq!(slot_after, slot_before);
        assert_eq!(r.last_heartbeat, 999);
        assert_eq!(r.motion, MotionState::Running);
    }

    #[test]
    fn test_deregister_frees_slot() {
        let mut p = pool(2);
        p.register(record(1, 0));
        p.register(record(2, 0));

        p.deregister(1);
        assert_eq!(p.len(), 1);
        assert!(p.get(1).is_none());

        // freed slot is reusable
        assert!(p.register(record(3, 0)));
        assert_eq!(p.iter_slots().next().unwrap().0, 0);
    }

    #[test]
    fn test_deregister_absent_is_noop() {
        let mut p = pool(2);
        p.register(record(1, 0));
        p.deregister(99);
        assert_eq!(p.len(), 1);
    }

    #[test]
    fn test_heartbeat_keeps_drone_alive() {
        let mut p = pool(1);
        p.register(record(5, 0));

        p.heartbeat(5, 4_000);
        p.sweep(8_000); // 4_000 + TIMEOUT not yet passed
        assert!(p.get(5).is_some_and(|r| r.alive));
    }

    #[test]
    fn test_two_pass_expiry() {
        let mut p = pool(2);
        p.register(record(5, 0));

        // first pass marks, record still observable
        assert_eq!(p.mark_expired(TIMEOUT + 1), 1);
        assert!(p.get(5).is_some_and(|r| !r.alive));
        assert_eq!(p.len(), 1);

        // second pass frees the slot
        assert_eq!(p.evict_dead(), 1);
        assert!(p.get(5).is_none());
        assert_eq!(p.len(), 0);
    }

    #[test]
    fn test_sweep_runs_both_passes() {
        let mut p = pool(2);
        p.register(record(1, 0));
        p.register(record(2, 6_000));

        p.sweep(6_000);
        assert!(p.get(1).is_none());
        assert!(p.get(2).is_some());
    }

    #[test]
    fn test_slot_reuse_rebinds_index() {
        let mut p = pool(2);
        p.register(record(1, 0));
        p.register(record(2, 0));
        p.deregister(1);
        p.register(record(3, 0));

        let slots: Vec<(usize, PeerId)> = p.iter_slots().map(|(i, r)| (i, r.id)).collect();
        assert_eq!(slots, vec![(0, 3), (1, 2)]);
    }
}
