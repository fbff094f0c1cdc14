//! Transaction resource manager: commit/abort and their two-phase variants.

use postgres_ffi::pg_constants::*;
use postgres_ffi::pg_time::decode_timestamp;

use crate::transactions::TxnStatus;

use super::common::{i64_at, u32_at, unknown_op};

/// Whether this op-code is a terminal commit/abort the transaction tracker
/// should record. `None` for prepare/assignment, which don't close out a
/// top-level xid.
pub fn terminal_status(op: u8) -> Option<TxnStatus> {
    match op & XLOG_XACT_OPMASK {
        XLOG_XACT_COMMIT | XLOG_XACT_COMMIT_PREPARED => Some(TxnStatus::Committed),
        XLOG_XACT_ABORT | XLOG_XACT_ABORT_PREPARED => Some(TxnStatus::Aborted),
        _ => None,
    }
}

fn render_commit_or_abort(label: &str, payload: &[u8], hide_timestamps: bool) -> String {
    let time = if hide_timestamps {
        "?".to_string()
    } else {
        i64_at(payload, 0)
            .and_then(|t| decode_timestamp(t, true))
            .map(|t| t.to_string())
            .unwrap_or_else(|| "?".to_string())
    };
    let nrels = u32_at(payload, 8).unwrap_or(0);
    let nsubxacts = u32_at(payload, 12).unwrap_or(0);
    format!("{} at {} ({} rels, {} subxacts)", label, time, nrels, nsubxacts)
}

pub fn describe(op: u8, record_xid: u32, payload: &[u8], hide_timestamps: bool) -> String {
    match op & XLOG_XACT_OPMASK {
        XLOG_XACT_COMMIT => render_commit_or_abort("commit", payload, hide_timestamps),
        XLOG_XACT_ABORT => render_commit_or_abort("abort", payload, hide_timestamps),
        XLOG_XACT_COMMIT_PREPARED => {
            let prepared_xid = u32_at(payload, 0).unwrap_or(0);
            format!(
                "{} (prepared xid {})",
                render_commit_or_abort("commit", payload.get(4..).unwrap_or(&[]), hide_timestamps),
                prepared_xid
            )
        }
        XLOG_XACT_ABORT_PREPARED => {
            let prepared_xid = u32_at(payload, 0).unwrap_or(0);
            format!(
                "{} (prepared xid {})",
                render_commit_or_abort("abort", payload.get(4..).unwrap_or(&[]), hide_timestamps),
                prepared_xid
            )
        }
        XLOG_XACT_PREPARE => format!("prepare: xid {}", record_xid),
        XLOG_XACT_ASSIGNMENT => {
            let xtop = u32_at(payload, 0).unwrap_or(0);
            let nsubxacts = u32_at(payload, 4).unwrap_or(0);
            format!("assignment: top xid {}, {} subxacts", xtop, nsubxacts)
        }
        other => unknown_op("Transaction", other),
    }
}
