//! Physical page header: short form on most pages, long form on the first
//! page of a segment (spec §3.2).

use bytes::Buf;
use thiserror::Error;

use crate::pg_constants::{
    SIZE_OF_XLOG_LONG_PHD, SIZE_OF_XLOG_SHORT_PHD, XLOG_BLCKSZ, XLOG_PAGE_MAGIC,
    XLP_FIRST_IS_CONTRECORD, XLP_LONG_HEADER,
};

#[derive(Debug, Error)]
pub enum PageError {
    #[error("page too short to hold a header ({0} bytes)")]
    Truncated(usize),
}

/// Parsed page header. Long-header-only fields are `None` on a short header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XLogPageHeader {
    pub magic: u16,
    pub info: u16,
    pub timeline: u32,
    pub page_addr_xlogid: u32,
    pub page_addr_xrecoff: u32,
    pub long: Option<XLogLongPageHeader>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XLogLongPageHeader {
    pub system_id: u64,
    pub seg_size: u32,
    pub blcksz: u32,
}

impl XLogPageHeader {
    pub fn is_long(&self) -> bool {
        self.info & XLP_LONG_HEADER != 0
    }

    pub fn first_is_contrecord(&self) -> bool {
        self.info & XLP_FIRST_IS_CONTRECORD != 0
    }

    pub fn magic_ok(&self) -> bool {
        self.magic == XLOG_PAGE_MAGIC
    }

    pub fn header_size(&self) -> usize {
        if self.is_long() {
            SIZE_OF_XLOG_LONG_PHD
        } else {
            SIZE_OF_XLOG_SHORT_PHD
        }
    }

    /// Parses a header out of one physical page buffer. Magic mismatch is
    /// *not* an error here (spec §4.1 step 1: "verify magic; warn and
    /// continue on mismatch") — callers check `magic_ok()` and decide
    /// whether to warn, the reassembler keeps going either way.
    pub fn parse(page: &[u8]) -> Result<XLogPageHeader, PageError> {
        if page.len() < SIZE_OF_XLOG_SHORT_PHD {
            return Err(PageError::Truncated(page.len()));
        }
        let mut buf = page;
        let magic = buf.get_u16_le();
        let info = buf.get_u16_le();
        let timeline = buf.get_u32_le();
        let page_addr_xlogid = buf.get_u32_le();
        let page_addr_xrecoff = buf.get_u32_le();

        let long = if info & XLP_LONG_HEADER != 0 {
            if page.len() < SIZE_OF_XLOG_LONG_PHD {
                return Err(PageError::Truncated(page.len()));
            }
            let system_id = buf.get_u64_le();
            let seg_size = buf.get_u32_le();
            let blcksz = buf.get_u32_le();
            Some(XLogLongPageHeader {
                system_id,
                seg_size,
                blcksz,
            })
        } else {
            None
        };

        Ok(XLogPageHeader {
            magic,
            info,
            timeline,
            page_addr_xlogid,
            page_addr_xrecoff,
            long,
        })
    }
}

pub fn default_page_size() -> usize {
    XLOG_BLCKSZ
}
