//! Per-target liveness state and its store.
//!
//! # States
//! - Unknown: no probe has completed yet
//! - Up: last decision saw the target alive
//! - Down: the target failed often enough to be considered gone
//!
//! # Locking
//! Each target owns one mutex. Every read-decide-write for a target runs
//! under that mutex, including the notification call, so two probe
//! completions for the same target are serialized. Different targets only
//! share the map shard for the short lookup that hands out the slot.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dashmap::DashMap;

/// Observed liveness of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Observed {
    #[default]
    Unknown,
    Up,
    Down,
}

/// Mutable record kept for every monitored target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TargetState {
    /// Current observed liveness.
    pub observed: Observed,
    /// Failed probes in a row. Reset by any success.
    pub consecutive_failures: u32,
    /// Whether `observed` has been announced to the notification sink.
    /// Only false for the Unknown state and the warmup failure seed.
    pub reported: bool,
}

impl TargetState {
    /// True when `observed` is already `state` and listeners were told so.
    pub fn reports(&self, state: Observed) -> bool {
        self.observed == state && self.reported
    }
}

#[derive(Debug, Default)]
struct Slot {
    state: TargetState,
    /// Sequence number of the newest probe applied to this slot.
    applied_seq: u64,
    /// Set when the target left the target set.
    retired: bool,
}

/// Handle to a single target's slot, held by an in-flight probe.
#[derive(Debug, Clone)]
pub struct TargetHandle {
    slot: Arc<Mutex<Slot>>,
}

impl TargetHandle {
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` against the state inside the target's critical section.
    ///
    /// Returns `None` without calling `f` when the target was retired or a
    /// probe issued later than `seq` has already been applied.
    pub fn update<F, R>(&self, seq: u64, f: F) -> Option<R>
    where
        F: FnOnce(&mut TargetState) -> R,
    {
        let mut slot = self.lock();
        if slot.retired || seq < slot.applied_seq {
            return None;
        }
        slot.applied_seq = seq;
        Some(f(&mut slot.state))
    }

    /// Copy of the current state.
    pub fn state(&self) -> TargetState {
        self.lock().state
    }
}

/// Concurrent map of target id to its liveness slot.
#[derive(Debug, Default)]
pub struct TargetStateStore {
    slots: DashMap<String, TargetHandle>,
}

impl TargetStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the slot for `target`, creating a fresh one on first use.
    pub fn handle(&self, target: &str) -> TargetHandle {
        if let Some(existing) = self.slots.get(target) {
            return existing.clone();
        }
        self.slots
            .entry(target.to_string())
            .or_insert_with(|| TargetHandle {
                slot: Arc::new(Mutex::new(Slot::default())),
            })
            .clone()
    }

    /// Current state of `target`, if it has ever been probed.
    pub fn get(&self, target: &str) -> Option<TargetState> {
        self.slots.get(target).map(|h| h.state())
    }

    /// Drop every target not in `live` and retire its slot so late probe
    /// completions for it are ignored. Returns the removed ids.
    pub fn retain(&self, live: &[String]) -> Vec<String> {
        let live: HashSet<&str> = live.iter().map(String::as_str).collect();
        let stale: Vec<String> = self
            .slots
            .iter()
            .filter(|entry| !live.contains(entry.key().as_str()))
            .map(|entry| entry.key().clone())
            .collect();

        for id in &stale {
            if let Some((_, handle)) = self.slots.remove(id) {
                handle.lock().retired = true;
            }
        }
        stale
    }

    /// Sorted copy of every tracked target's state.
    pub fn snapshot(&self) -> Vec<(String, TargetState)> {
        let mut all: Vec<_> = self
            .slots
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().state()))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
