//! Per-resource-manager record/byte counters plus a handful of per-op
//! counters for `--stats` (spec §3.6; SPEC_FULL.md supplemented feature #1).

use postgres_ffi::pg_constants::{
    RM_HEAP_ID, RM_MAX_ID, RM_NAMES, RM_XACT_ID, RM_XLOG_ID, XLOG_CHECKPOINT_ONLINE,
    XLOG_CHECKPOINT_SHUTDOWN, XLOG_HEAP_DELETE, XLOG_HEAP_HOT_UPDATE, XLOG_HEAP_INSERT,
    XLOG_HEAP_OPMASK, XLOG_HEAP_UPDATE, XLOG_XACT_ABORT, XLOG_XACT_ABORT_PREPARED,
    XLOG_XACT_COMMIT, XLOG_XACT_COMMIT_PREPARED, XLOG_XACT_OPMASK,
};

#[derive(Debug, Clone, Copy, Default)]
struct RmgrCounters {
    records: u64,
    bytes: u64,
    backup_blocks: u64,
    backup_bytes: u64,
}

/// The per-op counters spec §3.6 names: "checkpoints seen, commits, aborts,
/// inserts, updates/hot-updates, deletes".
#[derive(Debug, Clone, Copy, Default)]
struct OpCounters {
    checkpoints: u64,
    commits: u64,
    aborts: u64,
    inserts: u64,
    updates: u64,
    deletes: u64,
}

#[derive(Debug)]
pub struct RmgrStats {
    counters: [RmgrCounters; RM_MAX_ID as usize + 1],
    ops: OpCounters,
}

impl Default for RmgrStats {
    fn default() -> Self {
        RmgrStats {
            counters: [RmgrCounters::default(); RM_MAX_ID as usize + 1],
            ops: OpCounters::default(),
        }
    }
}

impl RmgrStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// `opcode` is the record's info byte masked to its top nibble
    /// (`XLogRecordHeader::opcode`), used to classify the per-op counters.
    pub fn record(&mut self, rmid: u8, opcode: u8, record_len: u32, backup_block_count: u32, backup_bytes: u32) {
        if let Some(slot) = self.counters.get_mut(rmid as usize) {
            slot.records += 1;
            slot.bytes += record_len as u64;
            slot.backup_blocks += backup_block_count as u64;
            slot.backup_bytes += backup_bytes as u64;
        }
        self.observe_op(rmid, opcode);
    }

    fn observe_op(&mut self, rmid: u8, opcode: u8) {
        match rmid {
            RM_XLOG_ID => {
                if matches!(opcode, XLOG_CHECKPOINT_SHUTDOWN | XLOG_CHECKPOINT_ONLINE) {
                    self.ops.checkpoints += 1;
                }
            }
            RM_XACT_ID => match opcode & XLOG_XACT_OPMASK {
                XLOG_XACT_COMMIT | XLOG_XACT_COMMIT_PREPARED => self.ops.commits += 1,
                XLOG_XACT_ABORT | XLOG_XACT_ABORT_PREPARED => self.ops.aborts += 1,
                _ => {}
            },
            RM_HEAP_ID => match opcode & XLOG_HEAP_OPMASK {
                XLOG_HEAP_INSERT => self.ops.inserts += 1,
                XLOG_HEAP_UPDATE | XLOG_HEAP_HOT_UPDATE => self.ops.updates += 1,
                XLOG_HEAP_DELETE => self.ops.deletes += 1,
                _ => {}
            },
            _ => {}
        }
    }

    /// Renders the rmgr table in rmgr-id order, skipping resource managers
    /// that never appeared, followed by one line of the per-op counters.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "{:<12} {:>10} {:>14} {:>10} {:>14}\n",
            "rmgr", "records", "record bytes", "fpi blocks", "fpi bytes"
        ));
        for (rmid, counters) in self.counters.iter().enumerate() {
            if counters.records == 0 {
                continue;
            }
            let name = RM_NAMES.get(rmid).copied().unwrap_or("unknown");
            out.push_str(&format!(
                "{:<12} {:>10} {:>14} {:>10} {:>14}\n",
                name, counters.records, counters.bytes, counters.backup_blocks, counters.backup_bytes
            ));
        }
        out.push_str(&format!(
            "checkpoints: {} commits: {} aborts: {} inserts: {} updates: {} deletes: {}\n",
            self.ops.checkpoints,
            self.ops.commits,
            self.ops.aborts,
            self.ops.inserts,
            self.ops.updates,
            self.ops.deletes
        ));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn omits_untouched_resource_managers() {
        let stats = RmgrStats::new();
        let rendered = stats.render();
        assert_eq!(rendered.lines().count(), 2); // header + op-counter line
    }

    #[test]
    fn accumulates_across_calls() {
        let mut stats = RmgrStats::new();
        stats.record(10, XLOG_HEAP_INSERT, 100, 0, 0); // Heap
        stats.record(10, XLOG_HEAP_INSERT, 50, 1, 8192);
        let rendered = stats.render();
        assert!(rendered.contains("Heap"));
        assert!(rendered.contains("150"));
        assert!(rendered.contains("8192"));
        assert!(rendered.contains("inserts: 2"));
    }

    #[test]
    fn ignores_out_of_range_rmid() {
        let mut stats = RmgrStats::new();
        stats.record(200, 0, 1, 0, 0);
        assert_eq!(stats.render().lines().count(), 2);
    }

    #[test]
    fn counts_checkpoints_commits_aborts_and_heap_ops() {
        let mut stats = RmgrStats::new();
        stats.record(RM_XLOG_ID, XLOG_CHECKPOINT_SHUTDOWN, 40, 0, 0);
        stats.record(RM_XACT_ID, XLOG_XACT_COMMIT, 20, 0, 0);
        stats.record(RM_XACT_ID, XLOG_XACT_ABORT, 20, 0, 0);
        stats.record(RM_HEAP_ID, XLOG_HEAP_INSERT, 50, 0, 0);
        stats.record(RM_HEAP_ID, XLOG_HEAP_UPDATE, 50, 0, 0);
        stats.record(RM_HEAP_ID, XLOG_HEAP_HOT_UPDATE, 50, 0, 0);
        stats.record(RM_HEAP_ID, XLOG_HEAP_DELETE, 50, 0, 0);

        let rendered = stats.render();
        assert!(rendered.contains("checkpoints: 1 commits: 1 aborts: 1 inserts: 1 updates: 2 deletes: 1"));
    }
}
