//! Cancellable lock acquisition.
//!
//! Every blocking acquisition needs to be interruptible, with no kernel
//! signal layer to lean on in a portable userspace library. Each "killable"
//! acquisition point becomes a bounded `try_*` + cooperative yield loop
//! here, checking a caller-supplied cancellation flag between attempts.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::thread;

use crate::error::TagError;

pub(crate) fn read_cancellable<'a, T>(
    lock: &'a RwLock<T>,
    cancel: &AtomicBool,
) -> Result<RwLockReadGuard<'a, T>, TagError> {
    loop {
        match lock.try_read() {
            Ok(g) => return Ok(g),
            Err(std::sync::TryLockError::Poisoned(p)) => return Ok(p.into_inner()),
            Err(std::sync::TryLockError::WouldBlock) => {}
        }
        if cancel.load(Ordering::SeqCst) {
            return Err(TagError::Intr);
        }
        thread::yield_now();
    }
}

pub(crate) fn write_cancellable<'a, T>(
    lock: &'a RwLock<T>,
    cancel: &AtomicBool,
) -> Result<RwLockWriteGuard<'a, T>, TagError> {
    loop {
        match lock.try_write() {
            Ok(g) => return Ok(g),
            Err(std::sync::TryLockError::Poisoned(p)) => return Ok(p.into_inner()),
            Err(std::sync::TryLockError::WouldBlock) => {}
        }
        if cancel.load(Ordering::SeqCst) {
            return Err(TagError::Intr);
        }
        thread::yield_now();
    }
}

pub(crate) fn mutex_lock_cancellable<'a, T>(
    lock: &'a Mutex<T>,
    cancel: &AtomicBool,
) -> Result<MutexGuard<'a, T>, TagError> {
    loop {
        match lock.try_lock() {
            Ok(g) => return Ok(g),
            Err(std::sync::TryLockError::Poisoned(p)) => return Ok(p.into_inner()),
            Err(std::sync::TryLockError::WouldBlock) => {}
        }
        if cancel.load(Ordering::SeqCst) {
            return Err(TagError::Intr);
        }
        thread::yield_now();
    }
}
