//! Stubbed renderers for Hash, GIN, and Sequence: no deep payload decode,
//! but every record is still counted (spec §4.3).

pub fn describe(rmgr_name: &str) -> String {
    format!("{} record", rmgr_name)
}
