//! XLOG resource manager: checkpoints, next-oid, switch, noop, backup-end,
//! parameter-change, restore-point, full-page-image records.

use postgres_ffi::pg_constants::*;
use postgres_ffi::pg_time::decode_timestamp;
use postgres_ffi::XLogRecPtr;

use super::common::{i64_at, u32_at, unknown_op};

fn render_checkpoint(payload: &[u8], hide_timestamps: bool) -> String {
    let redo_xlogid = u32_at(payload, 0).unwrap_or(0);
    let redo_xrecoff = u32_at(payload, 4).unwrap_or(0);
    let timeline = u32_at(payload, 8).unwrap_or(0);
    let next_xid = u32_at(payload, 12).unwrap_or(0);
    let next_oid = u32_at(payload, 16).unwrap_or(0);
    let next_multi = u32_at(payload, 20).unwrap_or(0);
    let next_multi_offset = u32_at(payload, 24).unwrap_or(0);
    let oldest_xid = u32_at(payload, 28).unwrap_or(0);
    let time = if hide_timestamps {
        "?".to_string()
    } else {
        i64_at(payload, 32)
            .and_then(|t| decode_timestamp(t, true))
            .map(|t| t.to_string())
            .unwrap_or_else(|| "?".to_string())
    };
    format!(
        "checkpoint: redo {}, tli {}, nextxid {}, nextoid {}, nextmulti {}, nextoffset {}, oldestxid {}, at {}",
        XLogRecPtr::new(redo_xlogid, redo_xrecoff),
        timeline,
        next_xid,
        next_oid,
        next_multi,
        next_multi_offset,
        oldest_xid,
        time
    )
}

pub fn describe(op: u8, payload: &[u8], hide_timestamps: bool) -> String {
    match op {
        XLOG_CHECKPOINT_SHUTDOWN => format!("{} (shutdown)", render_checkpoint(payload, hide_timestamps)),
        XLOG_CHECKPOINT_ONLINE => format!("{} (online)", render_checkpoint(payload, hide_timestamps)),
        XLOG_NOOP => "xlog no-op".to_string(),
        XLOG_NEXTOID => {
            let next_oid = u32_at(payload, 0).unwrap_or(0);
            format!("nextOid: {}", next_oid)
        }
        XLOG_SWITCH => "xlog switch".to_string(),
        XLOG_BACKUP_END => {
            let xlogid = u32_at(payload, 0).unwrap_or(0);
            let xrecoff = u32_at(payload, 4).unwrap_or(0);
            format!("backup end: {}", XLogRecPtr::new(xlogid, xrecoff))
        }
        XLOG_PARAMETER_CHANGE => "parameter change".to_string(),
        XLOG_RESTORE_POINT => {
            let name_bytes = payload.get(8..).unwrap_or(&[]);
            let end = name_bytes.iter().position(|&b| b == 0).unwrap_or(name_bytes.len());
            let name = String::from_utf8_lossy(&name_bytes[..end]);
            format!("restore point: {}", name)
        }
        XLOG_FPI => "full page image".to_string(),
        other => unknown_op("XLOG", other),
    }
}
