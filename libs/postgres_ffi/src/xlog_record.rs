//! Record header, backup-block header, and continuation header byte
//! layouts (spec §3.3, §6). See DESIGN.md / SPEC_FULL.md "Open Questions"
//! for why the record header is CRC-first and 32 bytes, and the backup
//! block header is 16 bytes.

use std::fmt;

use bytes::Buf;
use thiserror::Error;

use crate::pg_constants::{
    CRC_SIZE, SIZE_OF_XLOG_CONT_RECORD, SIZE_OF_XLOG_RECORD, SIZE_OF_XLOG_RECORD_BLOCK_HEADER,
    XLOG_SEG_SIZE, XLR_BKP_BLOCK_MASK, XLR_INFO_MASK,
};

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("truncated record header ({0} bytes available, need {SIZE_OF_XLOG_RECORD})")]
    Truncated(usize),
    #[error("implausible record length total_len={total_len} payload_len={payload_len}")]
    ImplausibleLength { total_len: u32, payload_len: u32 },
}

/// A logical WAL position, printed as `{xlogid:X}/{xrecoff:08X}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct XLogRecPtr {
    pub xlogid: u32,
    pub xrecoff: u32,
}

impl XLogRecPtr {
    pub fn new(xlogid: u32, xrecoff: u32) -> Self {
        XLogRecPtr { xlogid, xrecoff }
    }

    /// Computes the logical position of a byte within a segment, given the
    /// segment's high-32-bit component and its (within-xlogid) segment
    /// number, following spec §3.1.
    pub fn from_segment_offset(
        xlogid: u32,
        segno_in_xlogid: u32,
        offset_in_segment: u64,
    ) -> Self {
        let xrecoff = (segno_in_xlogid as u64 * XLOG_SEG_SIZE + offset_in_segment) as u32;
        XLogRecPtr { xlogid, xrecoff }
    }
}

impl fmt::Display for XLogRecPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:X}/{:08X}", self.xlogid, self.xrecoff)
    }
}

/// Decoded fixed record header. CRC occupies the first 4 bytes (see
/// DESIGN.md): the remaining 28 bytes are what the CRC validator hashes
/// when checking the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XLogRecordHeader {
    pub xl_crc: u32,
    pub xl_tot_len: u32,
    pub xl_xid: u32,
    pub xl_len: u32,
    pub xl_info: u8,
    pub xl_rmid: u8,
    pub xl_prev: XLogRecPtr,
}

impl XLogRecordHeader {
    pub fn opcode(&self) -> u8 {
        self.xl_info & XLR_INFO_MASK
    }

    pub fn backup_block_flags(&self) -> u8 {
        self.xl_info & XLR_BKP_BLOCK_MASK
    }

    pub fn has_backup_block(&self, index: usize) -> bool {
        debug_assert!(index < 4);
        self.backup_block_flags() & (1 << index) != 0
    }

    pub fn parse(buf: &[u8]) -> Result<XLogRecordHeader, RecordError> {
        if buf.len() < SIZE_OF_XLOG_RECORD {
            return Err(RecordError::Truncated(buf.len()));
        }
        let mut b = buf;
        let xl_crc = b.get_u32_le();
        let xl_tot_len = b.get_u32_le();
        let xl_xid = b.get_u32_le();
        let xl_len = b.get_u32_le();
        let xl_info = b.get_u8();
        let xl_rmid = b.get_u8();
        b.advance(2); // reserved
        let xlogid = b.get_u32_le();
        let xrecoff = b.get_u32_le();
        // 4 trailing reserved bytes round the header to 32.

        Ok(XLogRecordHeader {
            xl_crc,
            xl_tot_len,
            xl_xid,
            xl_len,
            xl_info,
            xl_rmid,
            xl_prev: XLogRecPtr::new(xlogid, xrecoff),
        })
    }

    /// Checks the length invariants from spec §3.3.
    pub fn check_lengths(&self) -> Result<(), RecordError> {
        let min = SIZE_OF_XLOG_RECORD as u32 + self.xl_len;
        let max = SIZE_OF_XLOG_RECORD as u32
            + self.xl_len
            + 4 * (SIZE_OF_XLOG_RECORD_BLOCK_HEADER as u32 + crate::pg_constants::XLOG_BLCKSZ as u32);
        if self.xl_tot_len < min || self.xl_tot_len > max {
            return Err(RecordError::ImplausibleLength {
                total_len: self.xl_tot_len,
                payload_len: self.xl_len,
            });
        }
        Ok(())
    }
}

/// Backup-block fixed header (spec §3.3/§6): 16 bytes. See DESIGN.md for
/// why the tablespace component is not stored per-block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BkpBlockHeader {
    pub db_node: u32,
    pub rel_node: u32,
    pub block: u32,
    pub hole_offset: u16,
    pub hole_length: u16,
}

impl BkpBlockHeader {
    pub fn parse(buf: &[u8]) -> Result<BkpBlockHeader, RecordError> {
        if buf.len() < SIZE_OF_XLOG_RECORD_BLOCK_HEADER {
            return Err(RecordError::Truncated(buf.len()));
        }
        let mut b = buf;
        let db_node = b.get_u32_le();
        let rel_node = b.get_u32_le();
        let block = b.get_u32_le();
        let hole_offset = b.get_u16_le();
        let hole_length = b.get_u16_le();
        Ok(BkpBlockHeader {
            db_node,
            rel_node,
            block,
            hole_offset,
            hole_length,
        })
    }

    /// Bytes of page image stored for this block (the hole is elided).
    pub fn image_len(&self) -> usize {
        crate::pg_constants::XLOG_BLCKSZ - self.hole_length as usize
    }

    pub fn hole_in_range(&self) -> bool {
        self.hole_offset as usize + self.hole_length as usize <= crate::pg_constants::XLOG_BLCKSZ
    }
}

/// Continuation header at the start of a page carrying `FIRST_IS_CONTRECORD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XLogContRecord {
    pub xl_rem_len: u32,
}

impl XLogContRecord {
    pub fn parse(buf: &[u8]) -> Result<XLogContRecord, RecordError> {
        if buf.len() < SIZE_OF_XLOG_CONT_RECORD {
            return Err(RecordError::Truncated(buf.len()));
        }
        let mut b = buf;
        Ok(XLogContRecord {
            xl_rem_len: b.get_u32_le(),
        })
    }
}

/// Rounds `n` up to the next multiple of 8 (record/continuation alignment,
/// spec §3.3, §8 invariant 3).
pub fn align8(n: usize) -> usize {
    (n + 7) & !7
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes(tot_len: u32, xl_len: u32, info: u8, rmid: u8) -> Vec<u8> {
        let mut buf = vec![0u8; SIZE_OF_XLOG_RECORD];
        buf[0..4].copy_from_slice(&0u32.to_le_bytes()); // crc
        buf[4..8].copy_from_slice(&tot_len.to_le_bytes());
        buf[8..12].copy_from_slice(&7u32.to_le_bytes()); // xid
        buf[12..16].copy_from_slice(&xl_len.to_le_bytes());
        buf[16] = info;
        buf[17] = rmid;
        buf
    }

    #[test]
    fn parses_record_header() {
        let bytes = header_bytes(SIZE_OF_XLOG_RECORD as u32 + 10, 10, 0x10, 1);
        let hdr = XLogRecordHeader::parse(&bytes).unwrap();
        assert_eq!(hdr.xl_xid, 7);
        assert_eq!(hdr.opcode(), 0x10);
        assert_eq!(hdr.xl_rmid, 1);
        hdr.check_lengths().unwrap();
    }

    #[test]
    fn rejects_implausible_length() {
        let bytes = header_bytes(4, 10, 0, 0);
        let hdr = XLogRecordHeader::parse(&bytes).unwrap();
        assert!(hdr.check_lengths().is_err());
    }

    #[test]
    fn displays_log_position_like_postgres() {
        let ptr = XLogRecPtr::from_segment_offset(0, 0xFF, 0);
        assert_eq!(ptr.to_string(), "0/FF000000");
    }

    #[test]
    fn align8_rounds_up() {
        assert_eq!(align8(0), 0);
        assert_eq!(align8(1), 8);
        assert_eq!(align8(8), 8);
        assert_eq!(align8(9), 16);
    }
}
