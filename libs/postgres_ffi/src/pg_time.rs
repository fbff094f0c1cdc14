//! PostgreSQL `timestamp` decoding: a count of microseconds (or, on builds
//! without 64-bit timestamps, seconds) since 2000-01-01 UTC, decomposed via
//! the engine's `j2date`/`date2j` Julian-day algorithm (spec §4.5).

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

const POSTGRES_EPOCH_JDATE: i64 = 2_451_545;
const USECS_PER_SEC: i64 = 1_000_000;
const USECS_PER_MINUTE: i64 = 60 * USECS_PER_SEC;
const USECS_PER_HOUR: i64 = 60 * USECS_PER_MINUTE;
const USECS_PER_DAY: i64 = 24 * USECS_PER_HOUR;

/// Julian day -> (year, month, day), reproduced from the source engine's
/// `j2date` (public algorithm, not present verbatim in the retrieved
/// original sources).
fn j2date(jd: i64) -> (i32, u32, u32) {
    let mut julian = jd as i64 + 32044;
    let mut quad = julian.div_euclid(146097);
    let extra = (julian - quad * 146097) * 4 + 3;
    julian += 60 + quad * 3 + extra.div_euclid(146097);
    quad = julian.div_euclid(1461);
    julian -= quad * 1461;
    let mut y = julian * 4 / 1461;
    julian = if y != 0 {
        (julian + 305) % 365
    } else {
        (julian + 306) % 366
    } + 123;
    y += quad * 4;
    let year = (y - 4800) as i32;
    let quad2 = julian * 2141 / 65536;
    let day = (julian - 7834 * quad2 / 256) as u32;
    let month = ((quad2 + 10) % 12 + 1) as u32;
    (year, month, day)
}

/// Decodes a raw PostgreSQL `Timestamp` value into a UTC-naive date/time.
/// `has_int64_timestamps` selects microsecond (true, the overwhelmingly
/// common build in this spec's version range) vs. second (false) units.
pub fn decode_timestamp(raw: i64, has_int64_timestamps: bool) -> Option<NaiveDateTime> {
    let usecs = if has_int64_timestamps {
        raw
    } else {
        raw.checked_mul(USECS_PER_SEC)?
    };

    let mut date = usecs.div_euclid(USECS_PER_DAY);
    let mut time = usecs - date * USECS_PER_DAY;
    if time < 0 {
        time += USECS_PER_DAY;
        date -= 1;
    }

    let (year, month, day) = j2date(date + POSTGRES_EPOCH_JDATE);
    let naive_date = NaiveDate::from_ymd_opt(year, month, day)?;

    let hour = time / USECS_PER_HOUR;
    time -= hour * USECS_PER_HOUR;
    let minute = time / USECS_PER_MINUTE;
    time -= minute * USECS_PER_MINUTE;
    let sec = time / USECS_PER_SEC;
    let fsec = time - sec * USECS_PER_SEC;

    let naive_time =
        NaiveTime::from_hms_micro_opt(hour as u32, minute as u32, sec as u32, fsec as u32)?;
    Some(NaiveDateTime::new(naive_date, naive_time))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_is_2000_01_01() {
        let dt = decode_timestamp(0, true).unwrap();
        assert_eq!(dt.to_string(), "2000-01-01 00:00:00");
    }

    #[test]
    fn one_day_and_change() {
        let raw = USECS_PER_DAY + 3_661 * USECS_PER_SEC + 500_000;
        let dt = decode_timestamp(raw, true).unwrap();
        assert_eq!(dt.to_string(), "2000-01-02 01:01:01.500");
    }

    #[test]
    fn before_epoch_is_negative_offset() {
        let raw = -USECS_PER_DAY;
        let dt = decode_timestamp(raw, true).unwrap();
        assert_eq!(dt.to_string(), "1999-12-31 00:00:00");
    }

    #[test]
    fn second_resolution_build() {
        let dt = decode_timestamp(90, false).unwrap();
        assert_eq!(dt.to_string(), "2000-01-01 00:01:30");
    }
}
