//! Ordered key → slot dictionary.
//!
//! A `BTreeMap` behind one `RwLock`, writers exclusive. A splay tree buys
//! cache locality inside an unpaged kernel allocator, a concern that does
//! not transfer to a userspace global-allocator-backed map, so a plain
//! ordered map stands in here instead. The dictionary never takes any
//! other lock while holding its own.

use std::collections::BTreeMap;
use std::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertError {
    Duplicate,
}

pub struct KeyMap {
    inner: RwLock<BTreeMap<i32, usize>>,
}

impl KeyMap {
    pub fn new() -> Self {
        KeyMap {
            inner: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn lookup(&self, key: i32) -> Option<usize> {
        self.inner.read().unwrap().get(&key).copied()
    }

    pub fn insert(&self, key: i32, slot: usize) -> Result<(), InsertError> {
        let mut map = self.inner.write().unwrap();
        Self::insert_locked(&mut map, key, slot)
    }

    /// Returns `true` iff `key` was present and has been removed.
    pub fn delete(&self, key: i32) -> bool {
        self.inner.write().unwrap().remove(&key).is_some()
    }

    /// The write lock itself, for the tag engine's killable, multi-step
    /// CREATE critical section (lookup + allocate + publish), which must
    /// hold the lock across all three steps and so cannot call `insert`
    /// without deadlocking.
    pub(crate) fn write_lock(&self) -> &RwLock<BTreeMap<i32, usize>> {
        &self.inner
    }

    /// The duplicate-check-then-insert step shared by `insert` and by the
    /// engine's CREATE critical section, which already holds the write
    /// guard by the time it's ready to insert.
    pub(crate) fn insert_locked(
        map: &mut BTreeMap<i32, usize>,
        key: i32,
        slot: usize,
    ) -> Result<(), InsertError> {
        if map.contains_key(&key) {
            return Err(InsertError::Duplicate);
        }
        map.insert(key, slot);
        Ok(())
    }
}

impl Default for KeyMap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_miss_then_insert_then_hit() {
        let m = KeyMap::new();
        assert_eq!(m.lookup(7), None);
        m.insert(7, 3).unwrap();
        assert_eq!(m.lookup(7), Some(3));
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let m = KeyMap::new();
        m.insert(7, 3).unwrap();
        assert_eq!(m.insert(7, 9), Err(InsertError::Duplicate));
        assert_eq!(m.lookup(7), Some(3));
    }

    #[test]
    fn delete_reports_presence() {
        let m = KeyMap::new();
        assert!(!m.delete(1));
        m.insert(1, 0).unwrap();
        assert!(m.delete(1));
        assert_eq!(m.lookup(1), None);
        assert!(!m.delete(1));
    }
}
