//! Btree resource manager: leaf/upper/meta inserts, page splits (left/right,
//! with root variants), deletes, newroot. Insert-meta decodes a trailing
//! metapage image; splits carry a downlink and new item per spec §4.3.

use postgres_ffi::pg_constants::*;

use crate::resolver::NameResolver;

use super::common::{render_filenode, u16_at, u32_at, unknown_op, SIZE_OF_RELFILENODE};

const SIZE_OF_BLOCK_ID: usize = 4;

fn block_and_offnum(payload: &[u8], off: usize) -> Option<(u32, u16)> {
    Some((u32_at(payload, off)?, u16_at(payload, off + 4)?))
}

fn is_split(op: u8) -> bool {
    matches!(
        op,
        XLOG_BTREE_SPLIT_L | XLOG_BTREE_SPLIT_R | XLOG_BTREE_SPLIT_L_ROOT | XLOG_BTREE_SPLIT_R_ROOT
    )
}

fn render_split(op: u8, payload: &[u8], rel: &str) -> String {
    // xl_btree_split: level(4) firstright(2) newitemoff(2) [downlink(4) if
    // level>0 and not leftmost] [new item, omitted if backup block 0 present]
    let level = u32_at(payload, SIZE_OF_RELFILENODE + SIZE_OF_BLOCK_ID).unwrap_or(0);
    let firstright = u16_at(payload, SIZE_OF_RELFILENODE + SIZE_OF_BLOCK_ID + 4).unwrap_or(0);
    let newitemoff = u16_at(payload, SIZE_OF_RELFILENODE + SIZE_OF_BLOCK_ID + 6).unwrap_or(0);
    let leftmost = matches!(op, XLOG_BTREE_SPLIT_L_ROOT | XLOG_BTREE_SPLIT_R_ROOT);
    let side = if matches!(op, XLOG_BTREE_SPLIT_L | XLOG_BTREE_SPLIT_L_ROOT) {
        "left"
    } else {
        "right"
    };
    let downlink = if level > 0 && !leftmost {
        u32_at(
            payload,
            SIZE_OF_RELFILENODE + SIZE_OF_BLOCK_ID + 8,
        )
    } else {
        None
    };
    format!(
        "split-{}: rel {} level {} firstright {} newitemoff {} downlink {}",
        side,
        rel,
        level,
        firstright,
        newitemoff,
        downlink.map(|d| d.to_string()).unwrap_or_else(|| "n/a".to_string())
    )
}

pub fn describe(op: u8, payload: &[u8], resolver: &mut dyn NameResolver) -> String {
    let rel = render_filenode(payload, 0, resolver);
    if is_split(op) {
        return render_split(op, payload, &rel);
    }
    match op {
        XLOG_BTREE_INSERT_LEAF | XLOG_BTREE_INSERT_UPPER => {
            match block_and_offnum(payload, SIZE_OF_RELFILENODE) {
                Some((block, offnum)) => format!("insert: rel {} blk {} off {}", rel, block, offnum),
                None => "insert: <truncated>".to_string(),
            }
        }
        XLOG_BTREE_INSERT_META => {
            match block_and_offnum(payload, SIZE_OF_RELFILENODE) {
                Some((block, offnum)) => format!("insert-meta: rel {} blk {} off {} (+ metapage image)", rel, block, offnum),
                None => "insert-meta: <truncated>".to_string(),
            }
        }
        XLOG_BTREE_DELETE => {
            let block = u32_at(payload, SIZE_OF_RELFILENODE).unwrap_or(0);
            format!("delete: rel {} blk {}", rel, block)
        }
        XLOG_BTREE_DELETE_PAGE | XLOG_BTREE_DELETE_PAGE_META | XLOG_BTREE_DELETE_PAGE_HALF => {
            let block = u32_at(payload, SIZE_OF_RELFILENODE).unwrap_or(0);
            format!("delete-page: rel {} blk {}", rel, block)
        }
        XLOG_BTREE_NEWROOT => format!("newroot: rel {}", rel),
        other => unknown_op("Btree", other),
    }
}
