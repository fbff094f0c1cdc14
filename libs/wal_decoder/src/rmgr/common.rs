//! Shared little-endian field readers and the file-node shape used by
//! almost every resource manager's payload.

use crate::resolver::{FileNode, NameResolver};

pub fn u16_at(buf: &[u8], off: usize) -> Option<u16> {
    buf.get(off..off + 2).map(|b| u16::from_le_bytes([b[0], b[1]]))
}

pub fn u32_at(buf: &[u8], off: usize) -> Option<u32> {
    buf.get(off..off + 4)
        .and_then(|b| b.try_into().ok())
        .map(u32::from_le_bytes)
}

pub fn u64_at(buf: &[u8], off: usize) -> Option<u64> {
    buf.get(off..off + 8)
        .and_then(|b| b.try_into().ok())
        .map(u64::from_le_bytes)
}

pub fn i64_at(buf: &[u8], off: usize) -> Option<i64> {
    u64_at(buf, off).map(|v| v as i64)
}

/// `RelFileNode`: tablespace + database + relation OIDs, 12 bytes.
pub fn filenode_at(buf: &[u8], off: usize) -> Option<FileNode> {
    Some(FileNode {
        spc_node: u32_at(buf, off)?,
        db_node: u32_at(buf, off + 4)?,
        rel_node: u32_at(buf, off + 8)?,
    })
}

pub const SIZE_OF_RELFILENODE: usize = 12;

pub fn render_filenode(buf: &[u8], off: usize, resolver: &mut dyn NameResolver) -> String {
    match filenode_at(buf, off) {
        Some(fnode) => fnode.render(resolver),
        None => "?/?/?".to_string(),
    }
}

pub fn unknown_op(rmgr_name: &str, op: u8) -> String {
    format!("unknown {} operation {}", rmgr_name, op)
}
