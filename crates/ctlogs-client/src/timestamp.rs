//! Resolution of `since`/`until` values into daemon timestamps.
//!
//! A value is one of:
//! - a relative duration (`10m`, `1h30m`, `-2.5s`), measured back from now
//! - an absolute date/time (`2024-01-02`, `2024-01-02T15:04`,
//!   `2024-01-02T15:04:05.123Z`, `2024-01-02T15:04:05+02:00`)
//! - a Unix timestamp (`1700000000` or `1700000000.123456789`)

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};

const NANOS_PER_SEC: i128 = 1_000_000_000;

/// Why a timestamp value was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimestampError {
    /// Looked like a date (contains `-`) but did not parse as one.
    #[error("failed to parse value as date/time: {0:?}")]
    InvalidDate(String),

    /// Neither a duration, a date/time nor a Unix timestamp.
    #[error("failed to parse value as time or duration: {0:?}")]
    Unparsable(String),
}

/// Resolve `value` against `now` into the daemon's timestamp syntax.
///
/// Durations resolve to whole Unix seconds. Absolute times resolve to
/// `seconds.nanoseconds` (nine fractional digits); values without a zone
/// are read in the offset of `now`. Unix timestamps pass through verbatim.
pub fn resolve_timestamp(
    value: &str,
    now: &DateTime<FixedOffset>,
) -> Result<String, TimestampError> {
    if value != "0" {
        if let Some(nanos) = parse_duration_nanos(value) {
            let now_nanos =
                now.timestamp() as i128 * NANOS_PER_SEC + now.timestamp_subsec_nanos() as i128;
            let secs = (now_nanos - nanos).div_euclid(NANOS_PER_SEC);
            return Ok(secs.to_string());
        }
    }

    if let Some(t) = parse_absolute(value, now.offset()) {
        return Ok(format!("{}.{:09}", t.timestamp(), t.timestamp_subsec_nanos()));
    }

    if value.contains('-') {
        return Err(TimestampError::InvalidDate(value.to_string()));
    }

    if is_unix_timestamp(value) {
        return Ok(value.to_string());
    }

    Err(TimestampError::Unparsable(value.to_string()))
}

/// Parse a Go-style duration (`300ms`, `-1.5h`, `2h45m`) into nanoseconds.
///
/// Valid units are `ns`, `us` (or `µs`), `ms`, `s`, `m`, `h`. A bare `0`
/// is accepted; any other unitless number is not.
pub fn parse_duration_nanos(input: &str) -> Option<i128> {
    let (negative, mut rest) = match input.as_bytes().first() {
        Some(b'-') => (true, &input[1..]),
        Some(b'+') => (false, &input[1..]),
        _ => (false, input),
    };

    if rest == "0" {
        return Some(0);
    }
    if rest.is_empty() {
        return None;
    }

    let mut total: i128 = 0;
    while !rest.is_empty() {
        let int_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        let int_part = &rest[..int_end];
        rest = &rest[int_end..];

        let mut frac_part = "";
        if let Some(after_dot) = rest.strip_prefix('.') {
            let frac_end = after_dot
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(after_dot.len());
            frac_part = &after_dot[..frac_end];
            rest = &after_dot[frac_end..];
        }

        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }

        let unit_end = rest
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(rest.len());
        let unit = unit_nanos(&rest[..unit_end])?;
        rest = &rest[unit_end..];

        let whole: i128 = if int_part.is_empty() {
            0
        } else if int_part.len() > 20 {
            return None;
        } else {
            int_part.parse().ok()?
        };
        total = total.checked_add(whole.checked_mul(unit)?)?;

        // Digits beyond nanosecond precision of the largest unit are dropped.
        let frac_part = &frac_part[..frac_part.len().min(18)];
        if !frac_part.is_empty() {
            let frac: i128 = frac_part.parse().ok()?;
            let scale = 10i128.pow(frac_part.len() as u32);
            total = total.checked_add(frac * unit / scale)?;
        }
    }

    if total > i64::MAX as i128 {
        return None;
    }
    Some(if negative { -total } else { total })
}

fn unit_nanos(unit: &str) -> Option<i128> {
    match unit {
        "ns" => Some(1),
        "us" | "\u{00b5}s" | "\u{03bc}s" => Some(1_000),
        "ms" => Some(1_000_000),
        "s" => Some(NANOS_PER_SEC),
        "m" => Some(60 * NANOS_PER_SEC),
        "h" => Some(3_600 * NANOS_PER_SEC),
        _ => None,
    }
}

fn parse_absolute(value: &str, local: &FixedOffset) -> Option<DateTime<FixedOffset>> {
    let (naive_part, offset) = split_zone(value)?;
    let naive = parse_naive(naive_part)?;
    let offset = offset.unwrap_or(*local);
    offset.from_local_datetime(&naive).single()
}

/// Split a trailing `Z` or `±HH:MM` zone off `value`.
///
/// Returns `None` when a zone is present but malformed.
fn split_zone(value: &str) -> Option<(&str, Option<FixedOffset>)> {
    if let Some(rest) = value
        .strip_suffix('Z')
        .or_else(|| value.strip_suffix('z'))
    {
        return Some((rest, Some(FixedOffset::east_opt(0)?)));
    }

    // A date alone has two dashes; a third one can only start an offset.
    let sign_pos = match value.rfind('+') {
        Some(pos) => Some(pos),
        None if value.matches('-').count() == 3 => value.rfind('-'),
        None => None,
    };
    let Some(pos) = sign_pos else {
        return Some((value, None));
    };

    let (naive, zone) = value.split_at(pos);
    let sign = if zone.starts_with('-') { -1 } else { 1 };
    let (hours, minutes) = zone[1..].split_once(':')?;
    if hours.len() != 2 || minutes.len() != 2 {
        return None;
    }
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    let offset = FixedOffset::east_opt(sign * (hours * 3_600 + minutes * 60))?;
    Some((naive, Some(offset)))
}

fn parse_naive(value: &str) -> Option<NaiveDateTime> {
    let Some((_, time)) = value.split_once('T') else {
        let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()?;
        return date.and_hms_opt(0, 0, 0);
    };

    match time.matches(':').count() {
        0 => NaiveDateTime::parse_from_str(&format!("{value}:00"), "%Y-%m-%dT%H:%M").ok(),
        1 => NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M").ok(),
        2 => NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").ok(),
        _ => None,
    }
}

fn is_unix_timestamp(value: &str) -> bool {
    let mut parts = value.splitn(2, '.');
    let secs_ok = parts
        .next()
        .map(|s| s.parse::<i64>().is_ok())
        .unwrap_or(false);
    let nanos_ok = parts.next().map(|n| n.parse::<i64>().is_ok()).unwrap_or(true);
    secs_ok && nanos_ok
}
