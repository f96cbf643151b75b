//! Read-only observer producing one record per `(slot, level)` of every
//! live instance.
//!
//! Lock-free with respect to senders once past the `try_read`: a slot whose
//! send-side lock is currently held exclusively (instance being published
//! or retired) is simply skipped, never blocked on. This makes the
//! snapshot explicitly *not* linearizable — it is an approximate,
//! best-effort read-out.

use crate::engine::TagEngine;

/// One line of the snapshot stream: a single `(slot, level)` pair of a live
/// instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotLine {
    pub slot: usize,
    pub key: i32,
    pub creator_identity: u32,
    pub level: usize,
    pub waiting_receivers: usize,
}

/// Walks the engine's instance table slot-major, level-minor, skipping any
/// slot currently being mutated.
pub fn snapshot(engine: &TagEngine) -> Vec<SnapshotLine> {
    let table = engine.table();
    let mut lines = Vec::new();
    for slot_idx in 0..table.len() {
        let slot = table.get(slot_idx).expect("index within table bounds");
        let guard = match slot.send.try_read() {
            Ok(g) => g,
            Err(_) => continue,
        };
        let Some(inst) = guard.as_ref() else {
            continue;
        };
        for level_idx in 0..inst.level_count() {
            let level = inst.level(level_idx);
            let waiting = level.level_cond.count(0) + level.level_cond.count(1);
            lines.push(SnapshotLine {
                slot: slot_idx,
                key: inst.key,
                creator_identity: inst.creator_identity,
                level: level_idx,
                waiting_receivers: waiting,
            });
        }
    }
    lines
}

/// Renders a snapshot as a tab-separated stream:
/// `slot\tkey\tcreator_identity\tlevel\twaiting_receivers\n` per line,
/// slot-major, level-minor, stable within one snapshot.
pub fn format_snapshot(lines: &[SnapshotLine]) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(&format!(
            "{}\t{}\t{}\t{}\t{}\n",
            line.slot, line.key, line.creator_identity, line.level, line.waiting_receivers
        ));
    }
    out
}
