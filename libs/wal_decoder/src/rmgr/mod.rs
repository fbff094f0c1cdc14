//! Resource-manager dispatcher (spec §4.3): selects a decoder by rmid and,
//! within it, by the op-code masked from the top nibble of `xl_info`.

mod btree;
mod common;
mod gist;
mod heap;
mod heap2;
mod misc;
mod smgr;
mod stub;
mod xact;
mod xlog;

pub use gist::IndexTupleCursor;

use postgres_ffi::pg_constants::*;
use postgres_ffi::XLogRecordHeader;

use crate::resolver::NameResolver;
use crate::transactions::TxnStatus;

/// Renders the op-specific detail for a single record (everything after the
/// common `[cur:…, xid:…, rmid:…, len:…/…, prev:…/…]` prefix, which the
/// caller assembles separately).
pub fn describe(
    header: &XLogRecordHeader,
    payload: &[u8],
    decode_statements: bool,
    hide_timestamps: bool,
    resolver: &mut dyn NameResolver,
) -> String {
    let op = header.opcode();
    match header.xl_rmid {
        RM_XLOG_ID => xlog::describe(op, payload, hide_timestamps),
        RM_XACT_ID => xact::describe(op, header.xl_xid, payload, hide_timestamps),
        RM_SMGR_ID => smgr::describe(op, payload, resolver),
        RM_CLOG_ID => misc::describe_clog(op, payload),
        RM_DBASE_ID => misc::describe_database(op, payload),
        RM_TBLSPC_ID => misc::describe_tablespace(op, payload),
        RM_MULTIXACT_ID => misc::describe_multixact(op, payload),
        RM_RELMAP_ID => misc::describe_relmap(op, payload),
        RM_STANDBY_ID => misc::describe_standby(op, payload, resolver),
        RM_HEAP2_ID => heap2::describe(op, payload, resolver),
        RM_HEAP_ID => heap::describe(op, payload, decode_statements, resolver),
        RM_BTREE_ID => btree::describe(op, payload, resolver),
        RM_GIST_ID => gist::describe(op, payload, resolver),
        RM_HASH_ID => stub::describe("Hash"),
        RM_GIN_ID => stub::describe("Gin"),
        RM_SEQUENCE_ID => stub::describe("Sequence"),
        other => format!("unknown resource manager {}", other),
    }
}

/// `Some` when this record closes out a top-level transaction (spec §4.6),
/// so the caller can feed the transaction tracker.
pub fn terminal_transaction_status(header: &XLogRecordHeader) -> Option<TxnStatus> {
    if header.xl_rmid != RM_XACT_ID {
        return None;
    }
    xact::terminal_status(header.opcode())
}

pub fn rmgr_name(rmid: u8) -> &'static str {
    RM_NAMES.get(rmid as usize).copied().unwrap_or("unknown")
}
