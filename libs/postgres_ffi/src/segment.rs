//! Segment filename parsing: `TTTTTTTTHHHHHHHHSSSSSSSS`, 24 hex digits,
//! case-insensitive (spec §3.1, §6).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SegmentNameError {
    #[error("segment file name {0:?} is not 24 hex digits")]
    BadFormat(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentId {
    pub timeline: u32,
    /// High 32 bits of the log position (`xlogid`).
    pub xlogid: u32,
    /// Segment number within that xlogid's 4 GiB span.
    pub segno: u32,
}

impl SegmentId {
    pub fn parse(file_name: &str) -> Result<SegmentId, SegmentNameError> {
        let stem = file_name
            .rsplit('/')
            .next()
            .unwrap_or(file_name)
            .split('.')
            .next()
            .unwrap_or(file_name);
        if stem.len() != 24 || !stem.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(SegmentNameError::BadFormat(file_name.to_string()));
        }
        let timeline = u32::from_str_radix(&stem[0..8], 16)
            .map_err(|_| SegmentNameError::BadFormat(file_name.to_string()))?;
        let xlogid = u32::from_str_radix(&stem[8..16], 16)
            .map_err(|_| SegmentNameError::BadFormat(file_name.to_string()))?;
        let segno = u32::from_str_radix(&stem[16..24], 16)
            .map_err(|_| SegmentNameError::BadFormat(file_name.to_string()))?;
        Ok(SegmentId {
            timeline,
            xlogid,
            segno,
        })
    }

    pub fn file_name(&self) -> String {
        format!("{:08X}{:08X}{:08X}", self.timeline, self.xlogid, self.segno)
    }
}
