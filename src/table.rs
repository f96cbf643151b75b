//! Fixed instance table: one array of slots, each carrying a pair of
//! independent reader-writer locks over the same instance pointer.
//!
//! The kernel module guards one `instance_ref` pointer with two
//! independent rwsems used as much for sequencing (excluding `remove` from
//! receivers, excluding `remove` from senders) as for protecting the
//! pointer itself — ordinary for kernel code, awkward for a single Rust
//! `RwLock`. This is translated as two independent
//! `RwLock<Option<Arc<Instance>>>` views of the same instance, written
//! together under both locks at publish/retire time and otherwise read
//! independently: `receive`/`open` lookups take the receive-side view,
//! `send`/`control`/the snapshot observer take the send-side view. Because
//! both hold an `Arc` to the same `Instance`, keeping them in sync costs a
//! clone, not a second allocation.

use std::sync::{Arc, Condvar, Mutex, RwLock};

use crate::epoch::EpochCond;

/// One channel within an instance. Messages are per-level.
pub(crate) struct Level {
    /// Serializes senders on this level.
    pub(crate) send_lock: Mutex<()>,
    pub(crate) level_cond: EpochCond,
    /// Folds a `pending_msg`/`pending_size` pair into one optional buffer;
    /// `None` means nothing pending.
    pub(crate) pending: Mutex<Option<Vec<u8>>>,
    wait_lock: Mutex<()>,
    wait_cv: Condvar,
}

impl Level {
    fn new() -> Self {
        Level {
            send_lock: Mutex::new(()),
            level_cond: EpochCond::new(),
            pending: Mutex::new(None),
            wait_lock: Mutex::new(()),
            wait_cv: Condvar::new(),
        }
    }

    /// Wakes every receiver currently parked on this level, whether they're
    /// waiting on a message (`send`) or on a global cancellation
    /// (`control(AWAKE_ALL)`).
    pub(crate) fn notify_waiters(&self) {
        let _guard = self.wait_lock.lock().unwrap();
        self.wait_cv.notify_all();
    }

    pub(crate) fn wait_lock(&self) -> &Mutex<()> {
        &self.wait_lock
    }

    pub(crate) fn wait_cv(&self) -> &Condvar {
        &self.wait_cv
    }
}

/// A message-rendezvous object with `levels.len()` independent levels.
pub struct Instance {
    pub key: i32,
    pub creator_identity: u32,
    pub check_permissions: bool,
    pub(crate) levels: Vec<Level>,
    pub(crate) awake_all_lock: Mutex<()>,
    pub(crate) global_cond: EpochCond,
}

impl Instance {
    pub(crate) fn new(
        key: i32,
        creator_identity: u32,
        check_permissions: bool,
        levels: usize,
    ) -> Self {
        Instance {
            key,
            creator_identity,
            check_permissions,
            levels: (0..levels).map(|_| Level::new()).collect(),
            awake_all_lock: Mutex::new(()),
            global_cond: EpochCond::new(),
        }
    }

    pub(crate) fn level(&self, index: usize) -> &Level {
        &self.levels[index]
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }
}

/// A fixed-index container that may hold one live [`Instance`].
pub(crate) struct Slot {
    pub(crate) recv: RwLock<Option<Arc<Instance>>>,
    pub(crate) send: RwLock<Option<Arc<Instance>>>,
}

impl Slot {
    fn empty() -> Self {
        Slot {
            recv: RwLock::new(None),
            send: RwLock::new(None),
        }
    }

    /// Writes `inst` into both views. Caller already holds both locks
    /// exclusively.
    pub(crate) fn publish(
        recv: &mut Option<Arc<Instance>>,
        send: &mut Option<Arc<Instance>>,
        inst: Arc<Instance>,
    ) {
        *recv = Some(inst.clone());
        *send = Some(inst);
    }

    /// Clears both views. Caller already holds both locks exclusively.
    pub(crate) fn retire(recv: &mut Option<Arc<Instance>>, send: &mut Option<Arc<Instance>>) {
        *recv = None;
        *send = None;
    }
}

pub(crate) struct Table {
    slots: Vec<Slot>,
}

impl Table {
    pub(crate) fn new(n: usize) -> Self {
        Table {
            slots: (0..n).map(|_| Slot::empty()).collect(),
        }
    }

    pub(crate) fn get(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }
}
