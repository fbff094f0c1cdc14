//! Short, low-traffic resource managers: CLOG, Database, Tablespace,
//! MultiXact, RelMap, Standby. Each renders its handful of fields plus,
//! where applicable, a file-node (spec §4.3).

use postgres_ffi::pg_constants::*;

use crate::resolver::NameResolver;

use super::common::{render_filenode, u32_at, unknown_op};

pub fn describe_clog(op: u8, payload: &[u8]) -> String {
    match op {
        CLOG_ZEROPAGE => format!("zero page: {}", u32_at(payload, 0).unwrap_or(0)),
        CLOG_TRUNCATE => format!("truncate: page {}", u32_at(payload, 0).unwrap_or(0)),
        other => unknown_op("CLOG", other),
    }
}

pub fn describe_database(op: u8, payload: &[u8]) -> String {
    match op {
        XLOG_DBASE_CREATE => {
            let db_id = u32_at(payload, 0).unwrap_or(0);
            let tablespace_id = u32_at(payload, 4).unwrap_or(0);
            let src_db_id = u32_at(payload, 8).unwrap_or(0);
            let src_tablespace_id = u32_at(payload, 12).unwrap_or(0);
            format!(
                "create: copy dir {}/{} to {}/{}",
                src_tablespace_id, src_db_id, tablespace_id, db_id
            )
        }
        XLOG_DBASE_DROP => {
            let db_id = u32_at(payload, 0).unwrap_or(0);
            let tablespace_id = u32_at(payload, 4).unwrap_or(0);
            format!("drop: dir {}/{}", tablespace_id, db_id)
        }
        other => unknown_op("Database", other),
    }
}

pub fn describe_tablespace(op: u8, payload: &[u8]) -> String {
    match op {
        XLOG_TBLSPC_CREATE => {
            let ts_id = u32_at(payload, 0).unwrap_or(0);
            format!("create: tablespace {}", ts_id)
        }
        XLOG_TBLSPC_DROP => {
            let ts_id = u32_at(payload, 0).unwrap_or(0);
            format!("drop: tablespace {}", ts_id)
        }
        other => unknown_op("Tablespace", other),
    }
}

pub fn describe_multixact(op: u8, payload: &[u8]) -> String {
    match op {
        XLOG_MULTIXACT_ZERO_OFF_PAGE => format!("zero offset page: {}", u32_at(payload, 0).unwrap_or(0)),
        XLOG_MULTIXACT_ZERO_MEM_PAGE => format!("zero member page: {}", u32_at(payload, 0).unwrap_or(0)),
        XLOG_MULTIXACT_CREATE_ID => {
            let multi = u32_at(payload, 0).unwrap_or(0);
            let nmembers = u32_at(payload, 4).unwrap_or(0);
            format!("create: multi {}, {} members", multi, nmembers)
        }
        other => unknown_op("MultiXact", other),
    }
}

pub fn describe_relmap(op: u8, payload: &[u8]) -> String {
    match op {
        XLOG_RELMAP_UPDATE => {
            let db_id = u32_at(payload, 0).unwrap_or(0);
            let tablespace_id = u32_at(payload, 4).unwrap_or(0);
            let nbytes = u32_at(payload, 8).unwrap_or(0);
            format!("update: db {}/{}, {} bytes", tablespace_id, db_id, nbytes)
        }
        other => unknown_op("RelMap", other),
    }
}

pub fn describe_standby(op: u8, payload: &[u8], resolver: &mut dyn NameResolver) -> String {
    match op {
        XLOG_STANDBY_LOCK => {
            let xid = u32_at(payload, 0).unwrap_or(0);
            format!("access exclusive lock: xid {} on {}", xid, render_filenode(payload, 4, resolver))
        }
        XLOG_RUNNING_XACTS => {
            let next_xid = u32_at(payload, 0).unwrap_or(0);
            let oldest_running_xid = u32_at(payload, 4).unwrap_or(0);
            let count = u32_at(payload, 8).unwrap_or(0);
            format!(
                "running xacts: nextXid {}, oldestRunningXid {}, {} xacts",
                next_xid, oldest_running_xid, count
            )
        }
        other => unknown_op("Standby", other),
    }
}
