//! Constants mirroring the on-disk WAL format of PostgreSQL 8.2 through 9.2.
//!
//! Grouped by the upstream header they come from, the way the real engine's
//! own headers are organized.

// From access/xlog_internal.h

/// Physical page size.
pub const XLOG_BLCKSZ: usize = 8192;
/// Default segment size; one segment is this many bytes across many pages.
pub const XLOG_SEG_SIZE: u64 = 16 * 1024 * 1024;
pub const XLOG_SEGMENTS_PER_XLOGID: u64 = 0x1_0000_0000 / XLOG_SEG_SIZE;

pub const XLOG_PAGE_MAGIC: u16 = 0xD07E;

/// Short header: magic, info, timeline, page address.
pub const SIZE_OF_XLOG_SHORT_PHD: usize = 16;
/// Long header (first page of a segment): short header + sysid, seg size, block size.
pub const SIZE_OF_XLOG_LONG_PHD: usize = 32;

pub const XLP_LONG_HEADER: u16 = 0x0002;
pub const XLP_FIRST_IS_CONTRECORD: u16 = 0x0001;
pub const XLP_BKP_REMOVABLE: u16 = 0x0004;
pub const XLP_ALL_FLAGS: u16 = XLP_LONG_HEADER | XLP_FIRST_IS_CONTRECORD | XLP_BKP_REMOVABLE;

pub const SIZE_OF_XLOG_CONT_RECORD: usize = 4;

// from xlogrecord.h / xlog.h

/// Record header size, including the 4-byte CRC (spec §6, explicit).
pub const SIZE_OF_XLOG_RECORD: usize = 32;
/// Offset of the CRC field within the record header; it is excluded from
/// its own checksum computation.
pub const CRC_OFFSET_IN_RECORD: usize = 0;
pub const CRC_SIZE: usize = 4;

/// Backup-block header size (spec §6 and §8 invariant 2, both explicit).
pub const SIZE_OF_XLOG_RECORD_BLOCK_HEADER: usize = 16;

pub const XLR_BKP_BLOCK_MASK: u8 = 0x0F;
pub const XLR_MAX_BKP_BLOCKS: usize = 4;
/// Top 4 bits of xl_info carry the per-rmgr op-code.
pub const XLR_INFO_MASK: u8 = 0xF0;

// from xact.h

pub const RM_XLOG_ID: u8 = 0;
pub const RM_XACT_ID: u8 = 1;
pub const RM_SMGR_ID: u8 = 2;
pub const RM_CLOG_ID: u8 = 3;
pub const RM_DBASE_ID: u8 = 4;
pub const RM_TBLSPC_ID: u8 = 5;
pub const RM_MULTIXACT_ID: u8 = 6;
pub const RM_RELMAP_ID: u8 = 7;
pub const RM_STANDBY_ID: u8 = 8;
pub const RM_HEAP2_ID: u8 = 9;
pub const RM_HEAP_ID: u8 = 10;
pub const RM_BTREE_ID: u8 = 11;
pub const RM_HASH_ID: u8 = 12;
pub const RM_GIN_ID: u8 = 13;
pub const RM_GIST_ID: u8 = 14;
pub const RM_SEQUENCE_ID: u8 = 15;
pub const RM_MAX_ID: u8 = RM_SEQUENCE_ID;

pub const RM_NAMES: [&str; 16] = [
    "XLOG", "Transaction", "Storage", "CLOG", "Database", "Tablespace", "MultiXact", "RelMap",
    "Standby", "Heap2", "Heap", "Btree", "Hash", "Gin", "Gist", "Sequence",
];

// XLOG rmgr op-codes (top nibble of xl_info)

pub const XLOG_CHECKPOINT_SHUTDOWN: u8 = 0x00;
pub const XLOG_CHECKPOINT_ONLINE: u8 = 0x10;
pub const XLOG_NOOP: u8 = 0x20;
pub const XLOG_NEXTOID: u8 = 0x30;
pub const XLOG_SWITCH: u8 = 0x40;
pub const XLOG_BACKUP_END: u8 = 0x50;
pub const XLOG_PARAMETER_CHANGE: u8 = 0x60;
pub const XLOG_RESTORE_POINT: u8 = 0x70;
pub const XLOG_FPI: u8 = 0x80;

// Transaction rmgr op-codes

pub const XLOG_XACT_COMMIT: u8 = 0x00;
pub const XLOG_XACT_ABORT: u8 = 0x20;
pub const XLOG_XACT_PREPARE: u8 = 0x10;
pub const XLOG_XACT_COMMIT_PREPARED: u8 = 0x30;
pub const XLOG_XACT_ABORT_PREPARED: u8 = 0x40;
pub const XLOG_XACT_ASSIGNMENT: u8 = 0x50;
pub const XLOG_XACT_OPMASK: u8 = 0x70;

// Storage (smgr) rmgr op-codes

pub const XLOG_SMGR_CREATE: u8 = 0x10;
pub const XLOG_SMGR_TRUNCATE: u8 = 0x20;

// CLOG rmgr op-codes

pub const CLOG_ZEROPAGE: u8 = 0x00;
pub const CLOG_TRUNCATE: u8 = 0x10;

// Database rmgr op-codes

pub const XLOG_DBASE_CREATE: u8 = 0x00;
pub const XLOG_DBASE_DROP: u8 = 0x10;

// Tablespace rmgr op-codes

pub const XLOG_TBLSPC_CREATE: u8 = 0x00;
pub const XLOG_TBLSPC_DROP: u8 = 0x10;

// MultiXact rmgr op-codes

pub const XLOG_MULTIXACT_ZERO_OFF_PAGE: u8 = 0x00;
pub const XLOG_MULTIXACT_ZERO_MEM_PAGE: u8 = 0x10;
pub const XLOG_MULTIXACT_CREATE_ID: u8 = 0x20;

// RelMap rmgr op-codes

pub const XLOG_RELMAP_UPDATE: u8 = 0x00;

// Standby rmgr op-codes

pub const XLOG_STANDBY_LOCK: u8 = 0x00;
pub const XLOG_RUNNING_XACTS: u8 = 0x10;

// Heap2 rmgr op-codes

pub const XLOG_HEAP2_FREEZE: u8 = 0x00;
pub const XLOG_HEAP2_CLEAN: u8 = 0x10;
pub const XLOG_HEAP2_CLEAN_MOVE: u8 = 0x20;
pub const XLOG_HEAP2_CLEANUP_INFO: u8 = 0x30;
pub const XLOG_HEAP2_VISIBLE: u8 = 0x40;
pub const XLOG_HEAP2_MULTI_INSERT: u8 = 0x50;
pub const XLOG_HEAP2_LOCK_UPDATED: u8 = 0x60;
pub const XLOG_HEAP_OPMASK: u8 = 0x70;

// Heap rmgr op-codes

pub const XLOG_HEAP_INSERT: u8 = 0x00;
pub const XLOG_HEAP_DELETE: u8 = 0x10;
pub const XLOG_HEAP_UPDATE: u8 = 0x20;
pub const XLOG_HEAP_MOVE: u8 = 0x30;
pub const XLOG_HEAP_HOT_UPDATE: u8 = 0x40;
pub const XLOG_HEAP_NEWPAGE: u8 = 0x50;
pub const XLOG_HEAP_LOCK: u8 = 0x60;
pub const XLOG_HEAP_INPLACE: u8 = 0x70;
pub const XLOG_HEAP_INIT_PAGE: u8 = 0x80;

// Btree rmgr op-codes

pub const XLOG_BTREE_INSERT_LEAF: u8 = 0x00;
pub const XLOG_BTREE_INSERT_UPPER: u8 = 0x10;
pub const XLOG_BTREE_INSERT_META: u8 = 0x20;
pub const XLOG_BTREE_SPLIT_L: u8 = 0x30;
pub const XLOG_BTREE_SPLIT_R: u8 = 0x40;
pub const XLOG_BTREE_SPLIT_L_ROOT: u8 = 0x50;
pub const XLOG_BTREE_SPLIT_R_ROOT: u8 = 0x60;
pub const XLOG_BTREE_DELETE: u8 = 0x70;
pub const XLOG_BTREE_DELETE_PAGE: u8 = 0x80;
pub const XLOG_BTREE_DELETE_PAGE_META: u8 = 0x90;
pub const XLOG_BTREE_NEWROOT: u8 = 0xA0;
pub const XLOG_BTREE_DELETE_PAGE_HALF: u8 = 0xB0;

// GIST rmgr op-codes

pub const XLOG_GIST_PAGE_UPDATE: u8 = 0x00;
pub const XLOG_GIST_PAGE_DELETE: u8 = 0x10;
pub const XLOG_GIST_NEW_ROOT: u8 = 0x20;
pub const XLOG_GIST_PAGE_SPLIT: u8 = 0x30;
pub const XLOG_GIST_INSERT_COMPLETE: u8 = 0x40;
pub const XLOG_GIST_CREATE_INDEX: u8 = 0x50;
