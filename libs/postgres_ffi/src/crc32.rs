//! Classic table-driven `pg_crc32`, the checksum used by every PostgreSQL
//! version in this spec's 8.2-9.2 range (the CRC32C switch came later, in
//! 9.5). Same table and polynomial as zlib's CRC-32 / IEEE 802.3.

const fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut c = i as u32;
        let mut k = 0;
        while k < 8 {
            c = if c & 1 != 0 {
                0xEDB88320 ^ (c >> 1)
            } else {
                c >> 1
            };
            k += 1;
        }
        table[i] = c;
        i += 1;
    }
    table
}

static CRC_TABLE: [u32; 256] = build_table();

/// Accumulates a `pg_crc32` across one or more chunks. Mirrors the
/// `INIT_CRC32` / `COMP_CRC32` / `FIN_CRC32` macro trio from the source
/// engine: construct, feed chunks in order, call `finish`.
#[derive(Debug, Clone, Copy)]
pub struct Crc32State(u32);

impl Default for Crc32State {
    fn default() -> Self {
        Self::new()
    }
}

impl Crc32State {
    pub fn new() -> Self {
        Crc32State(0xFFFF_FFFF)
    }

    pub fn update(&mut self, data: &[u8]) {
        let mut crc = self.0;
        for &byte in data {
            let idx = ((crc ^ byte as u32) & 0xFF) as usize;
            crc = CRC_TABLE[idx] ^ (crc >> 8);
        }
        self.0 = crc;
    }

    pub fn finish(self) -> u32 {
        self.0 ^ 0xFFFF_FFFF
    }
}

/// Convenience one-shot checksum over a single buffer.
pub fn crc32(data: &[u8]) -> u32 {
    let mut state = Crc32State::new();
    state.update(data);
    state.finish()
}
