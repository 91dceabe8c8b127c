//! SIRI time handling.
//!
//! Suppliers send timestamps with millisecond precision and an explicit
//! offset, e.g. `2022-08-30T04:34:46.522+02:00`. Requests go out as RFC 3339
//! with whole seconds. Message identifiers embed the request time as
//! `YYYYMMDD_HHMMSS`, and subscription durations use ISO 8601.

use chrono::{
    DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, SecondsFormat, TimeZone,
};

use super::DecodeError;

/// `2022-08-30T04:34:46.522Z`
const UTC_LEN: usize = 24;

/// `2022-08-30T04:34:46.522+02:00`
const OFFSET_LEN: usize = 29;

/// Fixed separators and their byte positions.
const SEPARATORS: [(usize, u8); 6] = [
    (4, b'-'),
    (7, b'-'),
    (10, b'T'),
    (13, b':'),
    (16, b':'),
    (19, b'.'),
];

const SIRI_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%:z";
const IDENTIFIER_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Decode a SIRI timestamp, keeping the wire offset.
///
/// The fraction must have exactly three digits and the offset must be
/// `±HH:MM` (a bare `Z` is read as UTC).
///
/// # Examples
///
/// ```
/// use chrono::{FixedOffset, Timelike};
/// use siri_sm::domain::decode_timestamp;
///
/// let t = decode_timestamp("2022-08-30T04:34:46.522+02:00").unwrap();
/// assert_eq!(t.offset(), &FixedOffset::east_opt(2 * 3600).unwrap());
/// assert_eq!(t.hour(), 4);
/// assert_eq!(t.timestamp_subsec_millis(), 522);
///
/// // Missing fraction
/// assert!(decode_timestamp("2022-08-30T04:34:46+02:00").is_err());
/// // Missing offset
/// assert!(decode_timestamp("2022-08-30T04:34:46.522").is_err());
/// ```
pub fn decode_timestamp(raw: &str) -> Result<DateTime<FixedOffset>, DecodeError> {
    let err = |reason: &'static str| DecodeError::MalformedTimestamp {
        raw: raw.to_string(),
        reason,
    };

    let bytes = raw.as_bytes();
    if bytes.len() != UTC_LEN && bytes.len() != OFFSET_LEN {
        return Err(err("expected YYYY-MM-DDTHH:MM:SS.sss±HH:MM"));
    }

    for (pos, sep) in SEPARATORS {
        if bytes[pos] != sep {
            return Err(err("unexpected separator"));
        }
    }

    let year = parse_digits(&bytes[0..4]).ok_or_else(|| err("invalid year digits"))?;
    let month = parse_digits(&bytes[5..7]).ok_or_else(|| err("invalid month digits"))?;
    let day = parse_digits(&bytes[8..10]).ok_or_else(|| err("invalid day digits"))?;
    let hour = parse_digits(&bytes[11..13]).ok_or_else(|| err("invalid hour digits"))?;
    let minute = parse_digits(&bytes[14..16]).ok_or_else(|| err("invalid minute digits"))?;
    let second = parse_digits(&bytes[17..19]).ok_or_else(|| err("invalid second digits"))?;
    let millis = parse_digits(&bytes[20..23])
        .ok_or_else(|| err("fraction must be exactly three digits"))?;

    let offset_secs = match (bytes[23], bytes.len()) {
        (b'Z', UTC_LEN) => 0,
        (sign @ (b'+' | b'-'), OFFSET_LEN) => {
            if bytes[26] != b':' {
                return Err(err("expected colon in UTC offset"));
            }
            let oh = parse_digits(&bytes[24..26]).ok_or_else(|| err("invalid offset hours"))?;
            let om = parse_digits(&bytes[27..29]).ok_or_else(|| err("invalid offset minutes"))?;
            if om > 59 {
                return Err(err("offset minutes must be 0-59"));
            }
            let secs = (oh * 3600 + om * 60) as i32;
            if sign == b'-' { -secs } else { secs }
        }
        _ => return Err(err("missing UTC offset")),
    };

    let offset = FixedOffset::east_opt(offset_secs).ok_or_else(|| err("UTC offset out of range"))?;
    let date = NaiveDate::from_ymd_opt(year as i32, month, day)
        .ok_or_else(|| err("invalid calendar date"))?;
    let time = NaiveTime::from_hms_milli_opt(hour, minute, second, millis)
        .ok_or_else(|| err("invalid time of day"))?;

    offset
        .from_local_datetime(&date.and_time(time))
        .single()
        .ok_or_else(|| err("invalid local time"))
}

/// Encode a timestamp in the SIRI millisecond pattern.
///
/// `decode_timestamp(&encode_timestamp(&t))` yields the same instant and offset.
pub fn encode_timestamp(t: &DateTime<FixedOffset>) -> String {
    t.format(SIRI_FORMAT).to_string()
}

/// Format an outbound request timestamp (RFC 3339, whole seconds).
///
/// ```
/// use siri_sm::domain::{decode_timestamp, format_request_timestamp};
///
/// let t = decode_timestamp("2022-08-30T04:34:46.522+02:00").unwrap();
/// assert_eq!(format_request_timestamp(&t), "2022-08-30T04:34:46+02:00");
/// ```
pub fn format_request_timestamp(t: &DateTime<FixedOffset>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Format the timestamp part of a message identifier (`YYYYMMDD_HHMMSS`).
pub fn format_identifier_timestamp(t: &DateTime<FixedOffset>) -> String {
    t.format(IDENTIFIER_FORMAT).to_string()
}

/// Format a duration as an ISO 8601 duration in the style suppliers expect.
///
/// Hours are only written when non-zero. Negative durations are clamped to zero.
///
/// ```
/// use chrono::Duration;
/// use siri_sm::domain::format_duration;
///
/// assert_eq!(format_duration(Duration::hours(2)), "PT2H0M0.000S");
/// assert_eq!(format_duration(Duration::seconds(30)), "PT0M30.000S");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let total_ms = duration.num_milliseconds().max(0);
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms / 60_000) % 60;
    let seconds = (total_ms / 1_000) % 60;
    let millis = total_ms % 1_000;

    if hours > 0 {
        format!("PT{hours}H{minutes}M{seconds}.{millis:03}S")
    } else {
        format!("PT{minutes}M{seconds}.{millis:03}S")
    }
}

/// Parse a run of ASCII digits into a u32.
fn parse_digits(bytes: &[u8]) -> Option<u32> {
    bytes.iter().try_fold(0u32, |acc, &b| {
        let digit = (b as char).to_digit(10)?;
        Some(acc * 10 + digit)
    })
}
