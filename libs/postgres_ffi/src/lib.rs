//! Byte-level constants and wire structs for the PostgreSQL 8.2-9.2
//! write-ahead log format. No I/O and no name resolution live here —
//! see `wal_decoder` for the stateful reader and dispatcher built on top.

pub mod crc32;
pub mod pg_constants;
pub mod pg_time;
pub mod segment;
pub mod xlog_page;
pub mod xlog_record;

pub use xlog_page::{PageError, XLogLongPageHeader, XLogPageHeader};
pub use xlog_record::{BkpBlockHeader, RecordError, XLogContRecord, XLogRecPtr, XLogRecordHeader};
