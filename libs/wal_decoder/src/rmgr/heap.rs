//! Heap resource manager: the richest family (insert, delete, update,
//! hot-update, move, newpage, lock, inplace, init-page). Inserts and
//! updates feed the tuple decoder when statement-rebuild mode is active.

use postgres_ffi::pg_constants::*;

use crate::resolver::NameResolver;
use crate::tuple::{decode_value, DecodedValue, HeapTupleHeader};

use super::common::{render_filenode, u16_at, u32_at, unknown_op, SIZE_OF_RELFILENODE};

const SIZE_OF_HEAP_TID: usize = 6; // BlockNumber(4) + OffsetNumber(2)
const SIZE_OF_TARGET: usize = SIZE_OF_RELFILENODE + SIZE_OF_HEAP_TID;
const SIZE_OF_XL_HEAP_HEADER: usize = 5; // infomask2(2) infomask(2) t_hoff(1)

struct Target {
    block: u32,
    offnum: u16,
}

fn target_at(payload: &[u8], off: usize) -> Option<Target> {
    Some(Target {
        block: u32_at(payload, off + SIZE_OF_RELFILENODE)?,
        offnum: u16_at(payload, off + SIZE_OF_RELFILENODE + 4)?,
    })
}

/// Renders the inline tuple that follows a target (insert/update new data),
/// decoding columns when attribute metadata is available; otherwise just
/// reports its size.
fn render_inline_tuple(rel: &str, data: &[u8], resolver: &mut dyn NameResolver) -> String {
    if data.len() < SIZE_OF_XL_HEAP_HEADER {
        return "<truncated tuple>".to_string();
    }
    let infomask2 = u16_at(data, 0).unwrap_or(0);
    let infomask = u16_at(data, 2).unwrap_or(0);
    let t_hoff = data[4] as u16;
    let header = HeapTupleHeader::from_wal_header(infomask2, infomask, t_hoff);

    let Some(attrs) = resolver.attributes(rel) else {
        return format!("{} bytes", data.len() - SIZE_OF_XL_HEAP_HEADER);
    };

    let bitmap_len = header.null_bitmap_len();
    let bitmap = data.get(SIZE_OF_XL_HEAP_HEADER..SIZE_OF_XL_HEAP_HEADER + bitmap_len).unwrap_or(&[]);
    let mut offset = SIZE_OF_XL_HEAP_HEADER + bitmap_len;
    let mut fields = Vec::new();
    for (i, attr) in attrs.iter().enumerate().take(header.n_attrs as usize) {
        if header.is_null(bitmap, i) {
            fields.push(format!("{}=NULL", attr.name));
            continue;
        }
        match decode_value(data, offset, attr) {
            Some((value, next)) => {
                fields.push(format!("{}={}", attr.name, render_value(&value)));
                offset = next;
            }
            None => {
                fields.push(format!("{}=?", attr.name));
                break;
            }
        }
    }
    fields.join(", ")
}

fn render_value(value: &DecodedValue<'_>) -> String {
    match value {
        DecodedValue::Int16(v) => v.to_string(),
        DecodedValue::Int32(v) => v.to_string(),
        DecodedValue::Int64(v) => v.to_string(),
        DecodedValue::Float4(v) => v.to_string(),
        DecodedValue::Float8(v) => v.to_string(),
        DecodedValue::Bool(v) => v.to_string(),
        DecodedValue::Char(v) => (*v as char).to_string(),
        DecodedValue::Text(bytes) | DecodedValue::Name(bytes) => {
            String::from_utf8_lossy(bytes).trim_end_matches('\0').to_string()
        }
        DecodedValue::Timestamp(Some(t)) => t.to_string(),
        DecodedValue::Timestamp(None) => "?".to_string(),
        DecodedValue::Oid(v) => v.to_string(),
        DecodedValue::Unsupported => "<toasted>".to_string(),
    }
}

pub fn describe(op: u8, payload: &[u8], decode_statements: bool, resolver: &mut dyn NameResolver) -> String {
    match op & XLOG_HEAP_OPMASK {
        XLOG_HEAP_INSERT => {
            let rel = render_filenode(payload, 0, resolver);
            let Some(target) = target_at(payload, 0) else {
                return "insert: <truncated>".to_string();
            };
            if decode_statements {
                let tuple = render_inline_tuple(&rel, &payload[SIZE_OF_TARGET..], resolver);
                format!("insert: rel {} blk {} off {}: {}", rel, target.block, target.offnum, tuple)
            } else {
                format!("insert: rel {} blk {} off {}", rel, target.block, target.offnum)
            }
        }
        XLOG_HEAP_DELETE => {
            let rel = render_filenode(payload, 0, resolver);
            match target_at(payload, 0) {
                Some(target) => format!("delete: rel {} blk {} off {}", rel, target.block, target.offnum),
                None => "delete: <truncated>".to_string(),
            }
        }
        XLOG_HEAP_UPDATE | XLOG_HEAP_HOT_UPDATE => {
            let label = if op & XLOG_HEAP_OPMASK == XLOG_HEAP_HOT_UPDATE {
                "hot-update"
            } else {
                "update"
            };
            let rel = render_filenode(payload, 0, resolver);
            let old = target_at(payload, 0);
            let new = target_at(payload, SIZE_OF_TARGET);
            match (old, new) {
                (Some(old), Some(new)) => {
                    let detail = if decode_statements {
                        let new_data_off = SIZE_OF_TARGET * 2;
                        format!(": {}", render_inline_tuple(&rel, &payload[new_data_off..], resolver))
                    } else {
                        String::new()
                    };
                    format!(
                        "{}: rel {} old {}/{} new {}/{}{}",
                        label, rel, old.block, old.offnum, new.block, new.offnum, detail
                    )
                }
                _ => format!("{}: <truncated>", label),
            }
        }
        XLOG_HEAP_MOVE => {
            let rel = render_filenode(payload, 0, resolver);
            format!("move: rel {}", rel)
        }
        XLOG_HEAP_NEWPAGE => {
            let rel = render_filenode(payload, 0, resolver);
            let block = u32_at(payload, SIZE_OF_RELFILENODE).unwrap_or(0);
            format!("newpage: rel {} blk {}", rel, block)
        }
        XLOG_HEAP_LOCK => {
            let rel = render_filenode(payload, 0, resolver);
            match target_at(payload, 0) {
                Some(target) => format!("lock: rel {} blk {} off {}", rel, target.block, target.offnum),
                None => "lock: <truncated>".to_string(),
            }
        }
        XLOG_HEAP_INPLACE => {
            let rel = render_filenode(payload, 0, resolver);
            format!("inplace: rel {}", rel)
        }
        // XLOG_HEAP_INIT_PAGE (0x80) is a modifier bit on XLOG_HEAP_INSERT,
        // not a distinct opcode, so it never reaches this match on its own.
        other => unknown_op("Heap", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::NullResolver;

    fn target_bytes(block: u32, offnum: u16) -> Vec<u8> {
        let mut buf = vec![0u8; SIZE_OF_RELFILENODE];
        buf.extend_from_slice(&block.to_le_bytes());
        buf.extend_from_slice(&offnum.to_le_bytes());
        buf
    }

    #[test]
    fn renders_insert_without_statements() {
        let payload = target_bytes(3, 7);
        let mut r = NullResolver;
        assert_eq!(describe(XLOG_HEAP_INSERT, &payload, false, &mut r), "insert: rel 0/0/0 blk 3 off 7");
    }

    #[test]
    fn renders_delete() {
        let payload = target_bytes(1, 2);
        let mut r = NullResolver;
        assert_eq!(describe(XLOG_HEAP_DELETE, &payload, false, &mut r), "delete: rel 0/0/0 blk 1 off 2");
    }

    #[test]
    fn renders_update() {
        let mut payload = target_bytes(1, 2);
        payload.extend_from_slice(&target_bytes(1, 3));
        let mut r = NullResolver;
        assert_eq!(
            describe(XLOG_HEAP_UPDATE, &payload, false, &mut r),
            "update: rel 0/0/0 old 1/2 new 1/3"
        );
    }
}
