//! Storage (smgr) resource manager: file creation and truncation.

use postgres_ffi::pg_constants::*;

use crate::resolver::NameResolver;

use super::common::{render_filenode, u32_at, unknown_op, SIZE_OF_RELFILENODE};

pub fn describe(op: u8, payload: &[u8], resolver: &mut dyn NameResolver) -> String {
    match op {
        XLOG_SMGR_CREATE => {
            format!("create: rel {}", render_filenode(payload, 0, resolver))
        }
        XLOG_SMGR_TRUNCATE => {
            let blkno = u32_at(payload, SIZE_OF_RELFILENODE).unwrap_or(0);
            format!(
                "truncate: rel {} to {} blocks",
                render_filenode(payload, 0, resolver),
                blkno
            )
        }
        other => unknown_op("Storage", other),
    }
}
