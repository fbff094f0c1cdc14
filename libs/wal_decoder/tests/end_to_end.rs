//! End-to-end scenarios over hand-authored segments, exercising the public
//! reader/dispatcher/stats surface together rather than one module at a
//! time.

use std::io::Cursor;

use postgres_ffi::crc32::Crc32State;
use postgres_ffi::pg_constants::{
    RM_XACT_ID, RM_XLOG_ID, SIZE_OF_XLOG_LONG_PHD, SIZE_OF_XLOG_RECORD, XLOG_BLCKSZ,
    XLOG_CHECKPOINT_SHUTDOWN, XLOG_PAGE_MAGIC, XLOG_SWITCH, XLOG_XACT_COMMIT, XLP_LONG_HEADER,
};
use postgres_ffi::segment::SegmentId;
use postgres_ffi::xlog_record::align8;
use wal_decoder::{NullResolver, ReadOutcome, RmgrStats, TransactionTracker, WalReader};

fn blank_long_page() -> Vec<u8> {
    let mut page = vec![0u8; XLOG_BLCKSZ];
    page[0..2].copy_from_slice(&XLOG_PAGE_MAGIC.to_le_bytes());
    page[2..4].copy_from_slice(&XLP_LONG_HEADER.to_le_bytes());
    page[4..8].copy_from_slice(&1u32.to_le_bytes());
    page[16..24].copy_from_slice(&0u64.to_le_bytes());
    page[24..28].copy_from_slice(&(16u32 * 1024 * 1024).to_le_bytes());
    page[28..32].copy_from_slice(&(XLOG_BLCKSZ as u32).to_le_bytes());
    page
}

fn build_record(xid: u32, rmid: u8, info: u8, payload: &[u8]) -> Vec<u8> {
    let total_len = SIZE_OF_XLOG_RECORD + payload.len();
    let mut rec = vec![0u8; align8(total_len)];
    rec[4..8].copy_from_slice(&(total_len as u32).to_le_bytes());
    rec[8..12].copy_from_slice(&xid.to_le_bytes());
    rec[12..16].copy_from_slice(&(payload.len() as u32).to_le_bytes());
    rec[16] = info;
    rec[17] = rmid;
    rec[SIZE_OF_XLOG_RECORD..SIZE_OF_XLOG_RECORD + payload.len()].copy_from_slice(payload);
    let mut crc = Crc32State::new();
    crc.update(&rec[SIZE_OF_XLOG_RECORD..SIZE_OF_XLOG_RECORD + payload.len()]);
    crc.update(&rec[4..SIZE_OF_XLOG_RECORD]);
    rec[0..4].copy_from_slice(&crc.finish().to_le_bytes());
    rec
}

fn checkpoint_payload() -> Vec<u8> {
    vec![0u8; 40]
}

/// The log-switch sentinel: a bare 32-byte header with `xl_tot_len == 0`
/// (the reader's distinguished "end of this segment's usable records"
/// marker, spec §4.1), never CRC-checked.
fn switch_marker() -> Vec<u8> {
    let mut rec = vec![0u8; SIZE_OF_XLOG_RECORD];
    rec[16] = XLOG_SWITCH;
    rec[17] = RM_XLOG_ID;
    rec
}

fn segment0() -> SegmentId {
    SegmentId {
        timeline: 1,
        xlogid: 0,
        segno: 0,
    }
}

/// Scenario 1: a checkpoint-shutdown followed by a zero-length log-switch
/// record reads as exactly two outcomes, the second being `End`.
#[test]
fn checkpoint_then_switch() {
    let mut page = blank_long_page();
    let checkpoint = build_record(0, RM_XLOG_ID, XLOG_CHECKPOINT_SHUTDOWN, &checkpoint_payload());
    let switch = switch_marker();

    let mut offset = SIZE_OF_XLOG_LONG_PHD;
    page[offset..offset + checkpoint.len()].copy_from_slice(&checkpoint);
    offset += checkpoint.len();
    page[offset..offset + switch.len()].copy_from_slice(&switch);

    let mut reader = WalReader::new(Cursor::new(page), segment0());
    let mut resolver = NullResolver;

    match reader.read_record().unwrap() {
        ReadOutcome::Record(rec) => {
            assert_eq!(rec.header.xl_rmid, RM_XLOG_ID);
            let detail = wal_decoder::rmgr::describe(&rec.header, rec.payload(), false, false, &mut resolver);
            assert!(detail.starts_with("checkpoint:"));
            assert!(detail.ends_with("(shutdown)"));
        }
        other => panic!("expected checkpoint record, got {other:?}"),
    }

    match reader.read_record().unwrap() {
        ReadOutcome::End { .. } => {}
        other => panic!("expected log switch, got {other:?}"),
    }
}

/// Scenario 2: an insert followed by a commit for the same xid reports
/// "COMMITED" for that xid and nothing left open.
#[test]
fn insert_then_commit_closes_transaction() {
    let mut page = blank_long_page();
    // A minimal heap-insert payload: 12-byte file node + 6-byte target.
    let insert_payload = vec![0u8; 18];
    let insert = build_record(42, postgres_ffi::pg_constants::RM_HEAP_ID, 0x00, &insert_payload);

    let mut commit_payload = vec![0u8; 16];
    commit_payload[8..12].copy_from_slice(&0u32.to_le_bytes()); // nrels
    commit_payload[12..16].copy_from_slice(&0u32.to_le_bytes()); // nsubxacts
    let commit = build_record(42, RM_XACT_ID, XLOG_XACT_COMMIT, &commit_payload);

    let mut offset = SIZE_OF_XLOG_LONG_PHD;
    page[offset..offset + insert.len()].copy_from_slice(&insert);
    offset += insert.len();
    page[offset..offset + commit.len()].copy_from_slice(&commit);

    let mut reader = WalReader::new(Cursor::new(page), segment0());
    let mut stats = RmgrStats::new();
    let mut txns = TransactionTracker::new();
    let mut total_len = 0u64;

    loop {
        match reader.read_record().unwrap() {
            ReadOutcome::Eol | ReadOutcome::End { .. } => break,
            ReadOutcome::Record(rec) => {
                stats.record(
                    rec.header.xl_rmid,
                    rec.header.opcode(),
                    rec.header.xl_len,
                    rec.header.backup_block_flags().count_ones(),
                    rec.backup_blocks_raw().len() as u32,
                );
                total_len += rec.header.xl_tot_len as u64;
                txns.observe_record(rec.header.xl_xid, rec.header.xl_tot_len, rec.cur);
                match wal_decoder::rmgr::terminal_transaction_status(&rec.header) {
                    Some(wal_decoder::TxnStatus::Committed) => txns.observe_commit(rec.header.xl_xid, rec.cur),
                    Some(wal_decoder::TxnStatus::Aborted) => txns.observe_abort(rec.header.xl_xid, rec.cur),
                    None => {}
                }
            }
        }
    }

    let rendered = txns.render();
    assert!(rendered.contains(&format!("xid: 42 total length: {total_len} status: COMMITED")));
    assert!(!rendered.contains("NOT COMMITED"));
}

/// Scenario 3: a record whose payload spans three pages reassembles into
/// exactly one record, with no continuation-related errors.
#[test]
fn record_spanning_three_pages() {
    let payload = vec![0xABu8; 18 * 1024];
    let record = build_record(7, RM_XLOG_ID, XLOG_CHECKPOINT_SHUTDOWN, &payload);

    let mut first = blank_long_page();
    let first_data_start = SIZE_OF_XLOG_LONG_PHD;
    let first_take = XLOG_BLCKSZ - first_data_start;
    first[first_data_start..].copy_from_slice(&record[..first_take]);

    let short_header_size = 16; // SIZE_OF_XLOG_SHORT_PHD
    let cont_header_size = 4; // SIZE_OF_XLOG_CONT_RECORD
    let mut gathered = first_take;
    let mut pages = vec![first];

    while gathered < record.len() {
        let mut page = vec![0u8; XLOG_BLCKSZ];
        page[0..2].copy_from_slice(&XLOG_PAGE_MAGIC.to_le_bytes());
        page[2..4].copy_from_slice(&1u16.to_le_bytes()); // XLP_FIRST_IS_CONTRECORD
        page[4..8].copy_from_slice(&1u32.to_le_bytes());

        let remaining = (record.len() - gathered) as u32;
        page[short_header_size..short_header_size + 4].copy_from_slice(&remaining.to_le_bytes());

        let data_off = short_header_size + cont_header_size;
        let avail = XLOG_BLCKSZ - data_off;
        let take = (remaining as usize).min(avail);
        page[data_off..data_off + take].copy_from_slice(&record[gathered..gathered + take]);

        gathered += take;
        pages.push(page);
    }

    let mut bytes = Vec::new();
    for p in pages {
        bytes.extend_from_slice(&p);
    }

    let mut reader = WalReader::new(Cursor::new(bytes), segment0());
    match reader.read_record().unwrap() {
        ReadOutcome::Record(rec) => {
            assert_eq!(rec.payload().len(), payload.len());
            assert!(rec.payload().iter().all(|&b| b == 0xAB));
        }
        other => panic!("expected reassembled record, got {other:?}"),
    }
    assert!(matches!(reader.read_record().unwrap(), ReadOutcome::Eol));
}

/// Scenario 4: corrupting a byte in the payload trips the CRC check and
/// the caller sees a format error rather than a record.
#[test]
fn corrupt_payload_trips_crc() {
    let mut page = blank_long_page();
    let mut record = build_record(0, RM_XLOG_ID, XLOG_CHECKPOINT_SHUTDOWN, &checkpoint_payload());
    record[SIZE_OF_XLOG_RECORD] ^= 0xFF;

    let start = SIZE_OF_XLOG_LONG_PHD;
    page[start..start + record.len()].copy_from_slice(&record);

    let mut reader = WalReader::new(Cursor::new(page), segment0());
    let err = reader.read_record().unwrap_err();
    assert!(matches!(err, wal_decoder::FormatError::BadCrc(_)));
}

/// Scenario 6: a segment file name's xlogid/segno selects the high half of
/// `cur` (segno * segment size), with the page header's own size added for
/// a record sitting right after it.
#[test]
fn cur_reflects_segment_identity() {
    let segment = SegmentId::parse("0000000100000000000000FF").unwrap();
    let mut page = blank_long_page();
    let record = build_record(0, RM_XLOG_ID, XLOG_CHECKPOINT_SHUTDOWN, &checkpoint_payload());
    let start = SIZE_OF_XLOG_LONG_PHD;
    page[start..start + record.len()].copy_from_slice(&record);

    let mut reader = WalReader::new(Cursor::new(page), segment);
    match reader.read_record().unwrap() {
        ReadOutcome::Record(rec) => assert_eq!(rec.cur.to_string(), "0/FF000020"),
        other => panic!("expected record, got {other:?}"),
    }
}
