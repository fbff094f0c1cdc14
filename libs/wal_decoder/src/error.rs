use postgres_ffi::XLogRecPtr;
use thiserror::Error;

/// Error taxonomy from spec §7. `Format`/`Io` are produced mid-file and are
/// handled by the driver abandoning the current file, not by propagating a
/// hard failure out of the process (spec: "no error in the WAL stream is
/// considered fatal to the process").
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("short read at segment byte {offset}: expected {expected} bytes, got {actual}")]
    ShortRead {
        offset: u64,
        expected: usize,
        actual: usize,
    },
    #[error("impossible record length at {cur}: {source}")]
    ImplausibleLength {
        cur: XLogRecPtr,
        #[source]
        source: postgres_ffi::RecordError,
    },
    #[error("missing continuation flag on page at segment byte {0}")]
    MissingContinuation(u64),
    #[error("inconsistent remaining length at segment byte {offset}: expected {expected}, page reports {actual}")]
    InconsistentRemainingLength {
        offset: u64,
        expected: u32,
        actual: u32,
    },
    #[error("incorrect resource manager data checksum in record at {0}")]
    BadCrc(XLogRecPtr),
    #[error("length closure mismatch at {cur}: header+payload+blocks={computed}, total_len={total_len}")]
    LengthClosureMismatch {
        cur: XLogRecPtr,
        computed: u32,
        total_len: u32,
    },
    #[error("backup block {index} hole offset/length out of range at {cur}")]
    BadHole { cur: XLogRecPtr, index: usize },
    #[error("zero-length record that is not a log switch, retries exhausted at {0}")]
    RetriesExhausted(XLogRecPtr),
}

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Format(#[from] FormatError),
    #[error("segment file name error: {0}")]
    SegmentName(#[from] postgres_ffi::segment::SegmentNameError),
}
