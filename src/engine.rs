//! The tag engine: `open`, `receive`, `send`, and `control`, composed from
//! the allocator, dictionary, epoch condition, and instance table.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, trace};

use crate::bitmask::Bitmask;
use crate::cancel::{mutex_lock_cancellable, read_cancellable, write_cancellable};
use crate::config::{TagConfig, PRIVATE_KEY};
use crate::error::TagError;
use crate::keymap::KeyMap;
use crate::table::{Instance, Slot, Table};
use crate::types::{ControlCommand, Credentials, OpenCommand, Permission};

/// Default permission check: allowed unless the instance requires one and
/// the caller is neither its creator nor root.
fn default_permission_check(creds: &Credentials, inst: &Instance) -> bool {
    !inst.check_permissions || creds.is_root || creds.identity == inst.creator_identity
}

fn validate_index(slot: i32, len: usize) -> Result<usize, TagError> {
    if slot < 0 {
        return Err(TagError::Invalid);
    }
    let idx = slot as usize;
    if idx >= len {
        return Err(TagError::Invalid);
    }
    Ok(idx)
}

/// The tag-based messaging service: a fixed-size, level-partitioned
/// rendezvous namespace.
///
/// `TagEngine` is `Send + Sync` — share it across threads behind whatever
/// ownership the caller prefers (a bare reference, an `Arc`, ...).
pub struct TagEngine {
    config: TagConfig,
    bitmask: Bitmask,
    keymap: KeyMap,
    table: Table,
    permission_check: Box<dyn Fn(&Credentials, &Instance) -> bool + Send + Sync>,
    discarded_sends: AtomicU64,
}

impl TagEngine {
    pub fn new(config: TagConfig) -> Self {
        Self::with_permission_check(config, default_permission_check)
    }

    /// Installs a custom permission predicate in place of the default
    /// creator/root check.
    pub fn with_permission_check(
        config: TagConfig,
        check: impl Fn(&Credentials, &Instance) -> bool + Send + Sync + 'static,
    ) -> Self {
        let table = Table::new(config.max_instances);
        let bitmask = Bitmask::new(config.max_instances);
        TagEngine {
            config,
            bitmask,
            keymap: KeyMap::new(),
            table,
            permission_check: Box::new(check),
            discarded_sends: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &TagConfig {
        &self.config
    }

    /// Count of `send` calls that found zero registered receivers and
    /// discarded their message. `send`'s `Result` is identical whether the
    /// message was delivered or discarded; this counter is the separate
    /// channel for callers who need to tell the two apart.
    pub fn discarded_sends(&self) -> u64 {
        self.discarded_sends.load(Ordering::SeqCst)
    }

    pub(crate) fn table(&self) -> &Table {
        &self.table
    }

    pub fn open(
        &self,
        key: i32,
        cmd: OpenCommand,
        perm: Permission,
        creds: Credentials,
        cancel: &AtomicBool,
    ) -> Result<i32, TagError> {
        match cmd {
            OpenCommand::Open => {
                if key == PRIVATE_KEY {
                    return Err(TagError::Invalid);
                }
                self.keymap
                    .lookup(key)
                    .map(|slot| slot as i32)
                    .ok_or(TagError::NoKey)
            }
            OpenCommand::Create => {
                let check_permissions = matches!(perm, Permission::User);
                if key == PRIVATE_KEY {
                    self.create_unshared(check_permissions, creds)
                } else {
                    self.create_shared(key, check_permissions, creds, cancel)
                }
            }
        }
    }

    fn create_unshared(&self, check_permissions: bool, creds: Credentials) -> Result<i32, TagError> {
        let slot_idx = self.bitmask.acquire().ok_or(TagError::NoSpace)?;
        let slot = self
            .table
            .get(slot_idx)
            .expect("bitmask returned an in-range index");
        let inst = Arc::new(Instance::new(
            PRIVATE_KEY,
            creds.identity,
            check_permissions,
            self.config.levels,
        ));
        {
            let mut recv = slot.recv.write().unwrap();
            let mut send = slot.send.write().unwrap();
            Slot::publish(&mut recv, &mut send, inst);
        }
        debug!("open: created unshared instance at slot {slot_idx}");
        Ok(slot_idx as i32)
    }

    fn create_shared(
        &self,
        key: i32,
        check_permissions: bool,
        creds: Credentials,
        cancel: &AtomicBool,
    ) -> Result<i32, TagError> {
        // Single write-locked critical section spanning the duplicate
        // check and the insert: the engine must hold the dict write lock
        // across lookup, allocation, and insert, so it takes the lock
        // itself rather than calling `KeyMap::insert` (which would
        // deadlock re-acquiring it).
        let mut map = write_cancellable(self.keymap.write_lock(), cancel)?;
        if map.contains_key(&key) {
            return Err(TagError::Already);
        }
        let slot_idx = self.bitmask.acquire().ok_or(TagError::NoSpace)?;
        let inst = Arc::new(Instance::new(
            key,
            creds.identity,
            check_permissions,
            self.config.levels,
        ));
        KeyMap::insert_locked(&mut map, key, slot_idx).expect("checked for duplicate above");

        let slot = self
            .table
            .get(slot_idx)
            .expect("bitmask returned an in-range index");
        {
            let mut recv = slot.recv.write().unwrap();
            let mut send = slot.send.write().unwrap();
            Slot::publish(&mut recv, &mut send, inst);
        }
        // `map` (the dict write lock) drops here, at function exit, only
        // after both per-slot locks have been written.
        debug!("open: created shared instance key={key} at slot {slot_idx}");
        Ok(slot_idx as i32)
    }

    pub fn receive(
        &self,
        slot: i32,
        level: usize,
        buf: &mut [u8],
        creds: Credentials,
        cancel: &AtomicBool,
    ) -> Result<usize, TagError> {
        let slot_idx = validate_index(slot, self.table.len())?;
        if level >= self.config.levels {
            return Err(TagError::Invalid);
        }
        let slot_ref = self.table.get(slot_idx).unwrap();

        // Held for the entire call, including the blocking wait below, so
        // that `remove`'s `try_write` can treat "lock acquired" as "no
        // receiver present".
        let guard = read_cancellable(&slot_ref.recv, cancel)?;
        let inst = match guard.as_ref() {
            Some(inst) => inst.clone(),
            None => return Err(TagError::Gone),
        };
        if !(self.permission_check)(&creds, &inst) {
            return Err(TagError::Denied);
        }

        let level_ref = inst.level(level);
        let e_lvl = level_ref.level_cond.register();
        let e_glb = inst.global_cond.register();

        let mut wait_guard = level_ref.wait_lock().lock().unwrap();
        loop {
            if level_ref.level_cond.value(e_lvl) || inst.global_cond.value(e_glb) {
                break;
            }
            if cancel.load(Ordering::SeqCst) {
                drop(wait_guard);
                level_ref.level_cond.unregister(e_lvl);
                inst.global_cond.unregister(e_glb);
                return Err(TagError::Intr);
            }
            let (next_guard, _timeout) = level_ref
                .wait_cv()
                .wait_timeout(wait_guard, Duration::from_millis(20))
                .unwrap();
            wait_guard = next_guard;
        }
        drop(wait_guard);

        if inst.global_cond.value(e_glb) {
            inst.global_cond.unregister(e_glb);
            level_ref.level_cond.unregister(e_lvl);
            return Err(TagError::Canceled);
        }

        // Unregister the global condition first, then read the pending
        // message, and unregister the level condition last, so the sender
        // observes drain-to-zero only after every receiver has finished
        // copying.
        inst.global_cond.unregister(e_glb);

        let pending = level_ref.pending.lock().unwrap().clone();
        match pending {
            None => {
                level_ref.level_cond.unregister(e_lvl);
                Ok(0)
            }
            Some(msg) => {
                if msg.len() > buf.len() {
                    level_ref.level_cond.unregister(e_lvl);
                    return Err(TagError::NoBuffer);
                }
                buf[..msg.len()].copy_from_slice(&msg);
                level_ref.level_cond.unregister(e_lvl);
                Ok(msg.len())
            }
        }
    }

    pub fn send(
        &self,
        slot: i32,
        level: usize,
        buf: &[u8],
        creds: Credentials,
        cancel: &AtomicBool,
    ) -> Result<(), TagError> {
        let slot_idx = validate_index(slot, self.table.len())?;
        if level >= self.config.levels {
            return Err(TagError::Invalid);
        }
        if buf.len() > self.config.max_message_size {
            return Err(TagError::Invalid);
        }

        let slot_ref = self.table.get(slot_idx).unwrap();
        let guard = read_cancellable(&slot_ref.send, cancel)?;
        let inst = match guard.as_ref() {
            Some(inst) => inst.clone(),
            None => return Err(TagError::Gone),
        };
        if !(self.permission_check)(&creds, &inst) {
            return Err(TagError::Denied);
        }

        let msg = buf.to_vec();
        let level_ref = inst.level(level);

        let _send_guard = mutex_lock_cancellable(&level_ref.send_lock, cancel)?;

        // Flip first: any receiver registering after this point lands on
        // the new epoch and cannot be counted in this send's cohort, which
        // is what lets the drain loop below terminate.
        let e = level_ref.level_cond.flip();

        if level_ref.level_cond.count(e) == 0 {
            self.discarded_sends.fetch_add(1, Ordering::SeqCst);
            trace!("send: no receivers on level {level}, discarding");
            return Ok(());
        }

        *level_ref.pending.lock().unwrap() = Some(msg);
        level_ref.level_cond.set_value(e, true);
        level_ref.notify_waiters();

        while level_ref.level_cond.count(e) > 0 {
            thread::yield_now();
        }

        *level_ref.pending.lock().unwrap() = None;
        debug!("send: delivered on level {level}, drained");
        Ok(())
    }

    pub fn control(
        &self,
        slot: i32,
        cmd: ControlCommand,
        creds: Credentials,
        cancel: &AtomicBool,
    ) -> Result<(), TagError> {
        let slot_idx = validate_index(slot, self.table.len())?;
        let slot_ref = self.table.get(slot_idx).unwrap();

        match cmd {
            ControlCommand::AwakeAll => self.awake_all(slot_ref, creds, cancel),
            ControlCommand::Remove => self.remove(slot_idx, slot_ref, creds, cancel),
        }
    }

    fn awake_all(&self, slot_ref: &Slot, creds: Credentials, cancel: &AtomicBool) -> Result<(), TagError> {
        let guard = read_cancellable(&slot_ref.send, cancel)?;
        let inst = match guard.as_ref() {
            Some(inst) => inst.clone(),
            None => return Err(TagError::Gone),
        };
        if !(self.permission_check)(&creds, &inst) {
            return Err(TagError::Denied);
        }

        let _awake_guard = mutex_lock_cancellable(&inst.awake_all_lock, cancel)?;
        let e = inst.global_cond.flip();
        inst.global_cond.set_value(e, true);

        for level in &inst.levels {
            level.notify_waiters();
        }

        while inst.global_cond.count(e) > 0 {
            thread::yield_now();
        }

        debug!("control: awake-all drained");
        Ok(())
    }

    fn remove(
        &self,
        slot_idx: usize,
        slot_ref: &Slot,
        creds: Credentials,
        cancel: &AtomicBool,
    ) -> Result<(), TagError> {
        // No receiver can be holding `recv.read()` without also holding it
        // for their whole blocking wait, so a successful `try_write` here
        // is itself the presence check.
        let mut recv_guard = match slot_ref.recv.try_write() {
            Ok(g) => g,
            Err(_) => return Err(TagError::Busy),
        };
        let inst = match recv_guard.as_ref() {
            Some(inst) => inst.clone(),
            None => return Err(TagError::Gone),
        };

        let mut send_guard = match write_cancellable(&slot_ref.send, cancel) {
            Ok(g) => g,
            Err(e) => {
                drop(recv_guard);
                return Err(e);
            }
        };

        if !(self.permission_check)(&creds, &inst) {
            return Err(TagError::Denied);
        }

        Slot::retire(&mut recv_guard, &mut send_guard);
        drop(recv_guard);
        drop(send_guard);

        if inst.key != PRIVATE_KEY {
            self.keymap.delete(inst.key);
        }
        self.bitmask.release(slot_idx);
        debug!("control: removed instance at slot {slot_idx}");
        Ok(())
    }
}
