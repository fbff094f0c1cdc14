//! Backup-block walker (spec §4.4): iterates the up to four optional
//! full-page images appended after a record's rmgr payload.

use postgres_ffi::pg_constants::{SIZE_OF_XLOG_RECORD_BLOCK_HEADER, XLOG_BLCKSZ, XLR_MAX_BKP_BLOCKS};
use postgres_ffi::{BkpBlockHeader, XLogRecordHeader};

pub struct BackupBlock<'a> {
    pub index: usize,
    pub header: BkpBlockHeader,
    pub image: &'a [u8],
}

/// Walks the backup blocks appended after `payload_and_blocks` (the bytes
/// of a record following its fixed 32-byte header and rmgr payload).
pub struct BackupBlockWalker<'a> {
    record_header: XLogRecordHeader,
    blocks: &'a [u8],
    offset: usize,
    next_index: usize,
}

impl<'a> BackupBlockWalker<'a> {
    pub fn new(record_header: XLogRecordHeader, blocks: &'a [u8]) -> Self {
        BackupBlockWalker {
            record_header,
            blocks,
            offset: 0,
            next_index: 0,
        }
    }
}

impl<'a> Iterator for BackupBlockWalker<'a> {
    type Item = BackupBlock<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next_index < XLR_MAX_BKP_BLOCKS {
            let index = self.next_index;
            self.next_index += 1;
            if !self.record_header.has_backup_block(index) {
                continue;
            }
            if self.offset + SIZE_OF_XLOG_RECORD_BLOCK_HEADER > self.blocks.len() {
                return None;
            }
            let header = BkpBlockHeader::parse(&self.blocks[self.offset..]).ok()?;
            let header_end = self.offset + SIZE_OF_XLOG_RECORD_BLOCK_HEADER;
            let image_len = header.image_len();
            if header_end + image_len > self.blocks.len() {
                return None;
            }
            let image = &self.blocks[header_end..header_end + image_len];
            self.offset = header_end + image_len;
            return Some(BackupBlock {
                index,
                header,
                image,
            });
        }
        None
    }
}
