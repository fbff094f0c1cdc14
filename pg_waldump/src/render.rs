//! Per-record and per-backup-block line rendering (spec §6's "Standard
//! output format").

use wal_decoder::rmgr::{self};
use wal_decoder::{BackupBlockWalker, DecodedRawRecord, NameResolver};

pub fn record_line(
    record: &DecodedRawRecord,
    decode_statements: bool,
    hide_timestamps: bool,
    resolver: &mut dyn NameResolver,
) -> String {
    let h = &record.header;
    let detail = rmgr::describe(h, record.payload(), decode_statements, hide_timestamps, resolver);
    format!(
        "[cur:{}, xid:{}, rmid:{}({}), len:{}/{}, prev:{}] {}",
        record.cur,
        h.xl_xid,
        h.xl_rmid,
        rmgr::rmgr_name(h.xl_rmid),
        h.xl_len,
        h.xl_tot_len,
        h.xl_prev,
        detail
    )
}

pub fn backup_block_lines(record: &DecodedRawRecord, resolver: &mut dyn NameResolver) -> Vec<String> {
    let walker = BackupBlockWalker::new(record.header, record.backup_blocks_raw());
    walker
        .map(|block| {
            // Backup-block headers carry only db/rel (spec §6, §8): the
            // tablespace is whatever the enclosing record's own file-node
            // names, so it's rendered as "-" here rather than guessed at.
            format!(
                "bkpblock[{}]: -/{}/{} blk:{} hole_off/len:{}/{}",
                block.index + 1,
                resolver.resolve_database(block.header.db_node),
                resolver.resolve_relation(block.header.rel_node),
                block.header.block,
                block.header.hole_offset,
                block.header.hole_length
            )
        })
        .collect()
}
