//! GIST resource manager: page-update, page-split, new-root,
//! insert-complete, create-index, page-delete. Update and split records
//! carry variable-length arrays of packed index tuples; `IndexTupleCursor`
//! steps through them using each tuple's embedded size field.

use postgres_ffi::pg_constants::*;

use postgres_ffi::xlog_record::align8;

use crate::resolver::NameResolver;

use super::common::{render_filenode, u16_at, u32_at, unknown_op, SIZE_OF_RELFILENODE};

const SIZE_OF_BLOCK_ID: usize = 4;
/// IndexTupleData: t_tid (ItemPointerData, 6 bytes) + t_info (2 bytes).
const SIZE_OF_INDEX_TUPLE_HEADER: usize = 8;
const INDEX_SIZE_MASK: u16 = 0x1FFF;
/// gistxlogPage: blkno (BlockNumber, 4 bytes) + num (4 bytes).
const SIZE_OF_GIST_PAGE_HEADER: usize = 8;

/// Walks a packed run of `IndexTupleData` entries until the slice is
/// exhausted. Tuples are packed back-to-back with no inter-tuple alignment
/// (`xlogdump_rmgr.c`'s `decodePageUpdateRecord`/`decodePageSplitRecord`
/// advance by `IndexTupleSize` alone).
pub struct IndexTupleCursor<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> IndexTupleCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        IndexTupleCursor { data, offset: 0 }
    }

    /// Bytes consumed so far.
    pub fn consumed(&self) -> usize {
        self.offset
    }
}

impl<'a> Iterator for IndexTupleCursor<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        if self.offset + SIZE_OF_INDEX_TUPLE_HEADER > self.data.len() {
            return None;
        }
        let t_info = u16_at(self.data, self.offset + 6)?;
        let size = (t_info & INDEX_SIZE_MASK) as usize;
        if size < SIZE_OF_INDEX_TUPLE_HEADER {
            return None;
        }
        let end = self.offset + size;
        if end > self.data.len() {
            return None;
        }
        let tuple = &self.data[self.offset..end];
        self.offset = end;
        Some(tuple)
    }
}

fn render_page_update(payload: &[u8]) -> String {
    // xl_gist_page_update: node(12) blkno(4) ntodelete(2), then the
    // ntodelete offsets array (2 bytes each, MAXALIGNed per
    // decodePageUpdateRecord's `addpath`), then packed index tuples to the
    // record's end.
    let ntodelete = u16_at(payload, SIZE_OF_RELFILENODE + SIZE_OF_BLOCK_ID).unwrap_or(0);
    let offsets_start = SIZE_OF_RELFILENODE + SIZE_OF_BLOCK_ID + 2;
    let offsets_len = align8(ntodelete as usize * 2);
    let tuples_start = offsets_start + offsets_len;
    let ntuples = payload
        .get(tuples_start..)
        .map(|rest| IndexTupleCursor::new(rest).count())
        .unwrap_or(0);
    format!("page-update: {} deleted, {} inserted tuples", ntodelete, ntuples)
}

fn render_page_split(payload: &[u8]) -> String {
    // xl_gist_page_split: node(12) blkno(4) npage(4), then npage pages each
    // as a gistxlogPage header (blkno: u32, num: i32) followed by exactly
    // `num` packed index tuples (decodePageSplitRecord).
    let npage = u32_at(payload, SIZE_OF_RELFILENODE + SIZE_OF_BLOCK_ID).unwrap_or(0);
    let mut offset = SIZE_OF_RELFILENODE + SIZE_OF_BLOCK_ID + 4;
    let mut total_tuples = 0usize;
    for _ in 0..npage {
        if offset + SIZE_OF_GIST_PAGE_HEADER > payload.len() {
            break;
        }
        let num = u32_at(payload, offset + 4).unwrap_or(0);
        offset += SIZE_OF_GIST_PAGE_HEADER;
        let Some(rest) = payload.get(offset..) else {
            break;
        };
        let mut cursor = IndexTupleCursor::new(rest);
        let mut page_tuples = 0usize;
        for _ in 0..num {
            if cursor.next().is_none() {
                break;
            }
            page_tuples += 1;
        }
        total_tuples += page_tuples;
        offset += cursor.consumed();
    }
    format!("page-split: {} pages, {} tuples", npage, total_tuples)
}

pub fn describe(op: u8, payload: &[u8], resolver: &mut dyn NameResolver) -> String {
    match op {
        XLOG_GIST_PAGE_UPDATE => render_page_update(payload),
        XLOG_GIST_PAGE_DELETE => {
            let block = u32_at(payload, SIZE_OF_RELFILENODE).unwrap_or(0);
            let rel = render_filenode(payload, 0, resolver);
            format!("page-delete: rel {} blk {}", rel, block)
        }
        XLOG_GIST_NEW_ROOT => {
            let rel = render_filenode(payload, 0, resolver);
            format!("new-root: rel {}", rel)
        }
        XLOG_GIST_PAGE_SPLIT => render_page_split(payload),
        XLOG_GIST_INSERT_COMPLETE => "insert-complete".to_string(),
        XLOG_GIST_CREATE_INDEX => {
            let rel = render_filenode(payload, 0, resolver);
            format!("create-index: rel {}", rel)
        }
        other => unknown_op("Gist", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_tuple(size: u16) -> Vec<u8> {
        let mut buf = vec![0u8; 6];
        buf.extend_from_slice(&size.to_le_bytes());
        buf.resize(size as usize, 0);
        buf
    }

    #[test]
    fn cursor_walks_back_to_back_tuples() {
        let mut data = index_tuple(9); // not a multiple of 8
        data.extend_from_slice(&index_tuple(8));
        let cursor = IndexTupleCursor::new(&data);
        let tuples: Vec<_> = cursor.collect();
        assert_eq!(tuples.len(), 2);
        assert_eq!(tuples[0].len(), 9);
        assert_eq!(tuples[1].len(), 8);
    }

    #[test]
    fn cursor_stops_on_undersized_tuple() {
        let data = vec![0u8; 4];
        let cursor = IndexTupleCursor::new(&data);
        assert_eq!(cursor.count(), 0);
    }

    #[test]
    fn page_split_respects_per_page_tuple_count() {
        // node(12) blkno(4) npage(4) = 20 bytes, then two pages.
        let mut payload = vec![0u8; SIZE_OF_RELFILENODE + SIZE_OF_BLOCK_ID];
        payload.extend_from_slice(&2u32.to_le_bytes()); // npage

        // Page 0: header (blkno, num=1), one tuple, then trailing bytes
        // that belong to page 1 and must not be swallowed as extra tuples.
        payload.extend_from_slice(&0u32.to_le_bytes()); // blkno
        payload.extend_from_slice(&1u32.to_le_bytes()); // num
        payload.extend_from_slice(&index_tuple(9));

        // Page 1: header (blkno, num=1), one tuple.
        payload.extend_from_slice(&1u32.to_le_bytes()); // blkno
        payload.extend_from_slice(&1u32.to_le_bytes()); // num
        payload.extend_from_slice(&index_tuple(8));

        let rendered = render_page_split(&payload);
        assert_eq!(rendered, "page-split: 2 pages, 2 tuples");
    }
}
