//! Heap2 resource manager: batch maintenance records (freeze, clean,
//! cleanup-info, visibility, multi-insert, lock-updated).

use postgres_ffi::pg_constants::*;

use crate::resolver::NameResolver;

use super::common::{render_filenode, u32_at, unknown_op, SIZE_OF_RELFILENODE};

pub fn describe(op: u8, payload: &[u8], resolver: &mut dyn NameResolver) -> String {
    let block = u32_at(payload, SIZE_OF_RELFILENODE).unwrap_or(0);
    let rel = render_filenode(payload, 0, resolver);
    match op & XLOG_HEAP_OPMASK {
        XLOG_HEAP2_FREEZE => {
            let cutoff_xid = u32_at(payload, SIZE_OF_RELFILENODE + 4).unwrap_or(0);
            format!("freeze: rel {} blk {}, cutoff xid {}", rel, block, cutoff_xid)
        }
        XLOG_HEAP2_CLEAN => format!("clean: rel {} blk {}", rel, block),
        XLOG_HEAP2_CLEAN_MOVE => format!("clean-move: rel {} blk {}", rel, block),
        XLOG_HEAP2_CLEANUP_INFO => {
            let latest_removed_xid = u32_at(payload, 0).unwrap_or(0);
            format!("cleanup info: latest removed xid {}", latest_removed_xid)
        }
        XLOG_HEAP2_VISIBLE => format!("visible: rel {} blk {}", rel, block),
        XLOG_HEAP2_MULTI_INSERT => {
            let ntuples = u32_at(payload, SIZE_OF_RELFILENODE + 4).unwrap_or(0);
            format!("multi-insert: rel {} blk {}, {} tuples", rel, block, ntuples)
        }
        XLOG_HEAP2_LOCK_UPDATED => format!("lock-updated: rel {} blk {}", rel, block),
        other => unknown_op("Heap2", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::NullResolver;

    #[test]
    fn renders_cleanup_info() {
        let payload = 55u32.to_le_bytes();
        let mut r = NullResolver;
        assert_eq!(describe(XLOG_HEAP2_CLEANUP_INFO, &payload, &mut r), "cleanup info: latest removed xid 55");
    }
}
