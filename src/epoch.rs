//! Two-phase epoch condition: RCU-style publish/consume with presence
//! counting.
//!
//! `Shared` in `local-rcu` already pairs an epoch selector with per-reader
//! presence (the low bit of each reader's packed counter) guarded by one
//! internal `Mutex`, and a writer that `flip`s readers onto a new epoch
//! before reclaiming the old one. `EpochCond` generalizes that from "one
//! parity bit per reader" to a two-valued selector with two independent
//! presence counters, so many unrelated callers can register on "whichever
//! epoch is current" without each needing its own slot in a slab.
//!
//! Registration and presence counting use `SeqCst` throughout; anything
//! weaker makes `loom` find counterexamples.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

struct State {
    selector: usize,
    value: [bool; 2],
}

/// Two-valued epoch selector, each side carrying a presence counter and a
/// one-shot value flag.
pub struct EpochCond {
    state: Mutex<State>,
    count: [AtomicUsize; 2],
}

impl EpochCond {
    pub fn new() -> Self {
        EpochCond {
            state: Mutex::new(State {
                selector: 0,
                value: [false, false],
            }),
            count: [AtomicUsize::new(0), AtomicUsize::new(0)],
        }
    }

    /// Registers the caller on the epoch that is current right now,
    /// returning its index. The caller must call [`unregister`] with the
    /// returned index on every exit path, including cancellation — there is
    /// no `Drop` guard for it here because registration routinely outlives
    /// the lock guard that created it.
    ///
    /// [`unregister`]: EpochCond::unregister
    pub fn register(&self) -> usize {
        let state = self.state.lock().unwrap();
        let e = state.selector;
        self.count[e].fetch_add(1, Ordering::SeqCst);
        e
    }

    pub fn unregister(&self, e: usize) {
        self.count[e].fetch_sub(1, Ordering::SeqCst);
    }

    /// Flips the active epoch, clearing the newly-active side's value flag,
    /// and returns the epoch that was active before the flip.
    ///
    /// Any `register()` that starts after this returns sees the new epoch;
    /// nothing that registers after `flip()` can be counted in `e_old`'s
    /// cohort, which is what lets a drain loop on `count(e_old)` terminate.
    pub fn flip(&self) -> usize {
        let mut state = self.state.lock().unwrap();
        let e_old = state.selector;
        let e_new = 1 - e_old;
        state.selector = e_new;
        state.value[e_new] = false;
        e_old
    }

    pub fn value(&self, e: usize) -> bool {
        self.state.lock().unwrap().value[e]
    }

    pub fn set_value(&self, e: usize, v: bool) {
        self.state.lock().unwrap().value[e] = v;
    }

    pub fn count(&self, e: usize) -> usize {
        self.count[e].load(Ordering::SeqCst)
    }
}

impl Default for EpochCond {
    fn default() -> Self {
        Self::new()
    }
}
