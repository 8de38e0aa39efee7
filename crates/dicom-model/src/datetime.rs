//! DICOM date/time value conversion.
//!
//! Implements parsing and formatting for the DA (date), TM (time) and DT
//! (date-time) value representations against an explicit time zone. Both the
//! canonical compact forms and the legacy dotted/colon forms are accepted.
//!
//! A truncated value names a range of instants; parsing normally returns the
//! first instant of that range, while *ceiling* mode returns the last
//! representable millisecond instead, for inclusive range queries. DT values
//! may carry a trailing UTC-offset suffix that overrides the supplied zone
//! for that value only.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use crate::error::{DicomError, Result};

/// Precision of a formatted DT value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DateTimePrecision {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
}

/// Parse a UTC-offset designator of the form `+HHMM` / `-HHMM`.
pub fn time_zone(offset: &str) -> Result<FixedOffset> {
    let bytes = offset.as_bytes();
    if bytes.len() != 5
        || !(bytes[0] == b'+' || bytes[0] == b'-')
        || !bytes[1..].iter().all(u8::is_ascii_digit)
    {
        return Err(DicomError::malformed(format!(
            "invalid zone offset: {offset:?}"
        )));
    }
    let hours: i32 = offset[1..3].parse().unwrap_or(99);
    let minutes: i32 = offset[3..5].parse().unwrap_or(99);
    if hours > 14 || minutes > 59 {
        return Err(DicomError::malformed(format!(
            "invalid zone offset: {offset:?}"
        )));
    }
    let seconds = (hours * 3600 + minutes * 60) * if bytes[0] == b'-' { -1 } else { 1 };
    FixedOffset::east_opt(seconds)
        .ok_or_else(|| DicomError::malformed(format!("invalid zone offset: {offset:?}")))
}

/// Parsed date/time components; absent components mark the precision.
#[derive(Debug, Default)]
struct Components {
    year: i32,
    month: Option<u32>,
    day: Option<u32>,
    hour: Option<u32>,
    minute: Option<u32>,
    second: Option<u32>,
    nanosecond: Option<u32>,
}

/// Parse a DA value: `YYYYMMDD`, legacy `YYYY.MM.DD`, or right-truncated.
pub fn parse_da(zone: FixedOffset, text: &str, ceiling: bool) -> Result<DateTime<Utc>> {
    let compact = strip_separators(text, '.');
    let digits = require_digits(&compact, text)?;
    let mut components = Components::default();
    parse_date_digits(digits, text, &mut components)?;
    resolve(zone, &components, ceiling, text)
}

/// Parse a TM value: `HHMMSS.FFFFFF`, legacy `HH:MM:SS`, or right-truncated.
/// The result is anchored on 1970-01-01 in the supplied zone.
pub fn parse_tm(zone: FixedOffset, text: &str, ceiling: bool) -> Result<DateTime<Utc>> {
    let compact = strip_separators(text, ':');
    let (digits, fraction) = split_fraction(&compact);
    let digits = require_digits(digits, text)?;
    let mut components = Components {
        year: 1970,
        month: Some(1),
        day: Some(1),
        ..Components::default()
    };
    parse_time_digits(digits, fraction, text, &mut components)?;
    if components.hour.is_none() {
        return Err(malformed_value("TM", text));
    }
    resolve(zone, &components, ceiling, text)
}

/// Parse a DT value: `YYYYMMDDHHMMSS.FFFFFF` with right truncation and an
/// optional `+HHMM`/`-HHMM` suffix overriding the supplied zone.
pub fn parse_dt(zone: FixedOffset, text: &str, ceiling: bool) -> Result<DateTime<Utc>> {
    let (body, zone) = match text.len().checked_sub(5) {
        Some(cut) if text.as_bytes()[cut] == b'+' || text.as_bytes()[cut] == b'-' => {
            (&text[..cut], time_zone(&text[cut..])?)
        }
        _ => (text, zone),
    };
    let (digits, fraction) = split_fraction(body);
    let digits = require_digits(digits, text)?;
    if digits.len() < 4 {
        return Err(malformed_value("DT", text));
    }
    let mut components = Components::default();
    let (date_digits, time_digits) = digits.split_at(digits.len().min(8));
    parse_date_digits(date_digits, text, &mut components)?;
    if !time_digits.is_empty() || fraction.is_some() {
        if components.day.is_none() {
            return Err(malformed_value("DT", text));
        }
        parse_time_digits(time_digits, fraction, text, &mut components)?;
    }
    resolve(zone, &components, ceiling, text)
}

/// Format a DA value (`YYYYMMDD`) in the given zone.
#[must_use]
pub fn format_da(zone: FixedOffset, instant: DateTime<Utc>) -> String {
    instant.with_timezone(&zone).format("%Y%m%d").to_string()
}

/// Format a TM value (`HHMMSS.FFF`) in the given zone.
#[must_use]
pub fn format_tm(zone: FixedOffset, instant: DateTime<Utc>) -> String {
    instant.with_timezone(&zone).format("%H%M%S%.3f").to_string()
}

/// Format a DT value at millisecond precision without a zone suffix.
#[must_use]
pub fn format_dt(zone: FixedOffset, instant: DateTime<Utc>) -> String {
    format_dt_with(zone, instant, DateTimePrecision::Millisecond, false)
}

/// Format a DT value truncated to `precision`, optionally carrying the
/// `+HHMM` zone suffix.
#[must_use]
pub fn format_dt_with(
    zone: FixedOffset,
    instant: DateTime<Utc>,
    precision: DateTimePrecision,
    include_zone_suffix: bool,
) -> String {
    let full = instant
        .with_timezone(&zone)
        .format("%Y%m%d%H%M%S%.3f")
        .to_string();
    let cut = match precision {
        DateTimePrecision::Year => 4,
        DateTimePrecision::Month => 6,
        DateTimePrecision::Day => 8,
        DateTimePrecision::Hour => 10,
        DateTimePrecision::Minute => 12,
        DateTimePrecision::Second => 14,
        DateTimePrecision::Millisecond => 18,
    };
    let mut out = full[..cut].to_owned();
    if include_zone_suffix {
        let seconds = zone.local_minus_utc();
        let sign = if seconds < 0 { '-' } else { '+' };
        let abs = seconds.abs();
        out.push(sign);
        out.push_str(&format!("{:02}{:02}", abs / 3600, (abs % 3600) / 60));
    }
    out
}

fn malformed_value(vr: &str, text: &str) -> DicomError {
    DicomError::malformed(format!("invalid {vr} value: {text:?}"))
}

fn strip_separators(text: &str, separator: char) -> String {
    text.chars().filter(|&c| c != separator).collect()
}

fn split_fraction(text: &str) -> (&str, Option<&str>) {
    match text.find('.') {
        Some(dot) => (&text[..dot], Some(&text[dot + 1..])),
        None => (text, None),
    }
}

fn require_digits<'a>(text: &'a str, original: &str) -> Result<&'a str> {
    if text.bytes().all(|b| b.is_ascii_digit()) {
        Ok(text)
    } else {
        Err(DicomError::malformed(format!(
            "invalid date/time value: {original:?}"
        )))
    }
}

fn parse_date_digits(digits: &str, original: &str, components: &mut Components) -> Result<()> {
    match digits.len() {
        4 | 6 | 8 => {}
        _ => return Err(DicomError::malformed(format!("invalid DA value: {original:?}"))),
    }
    components.year = digits[..4].parse().map_err(|_| malformed_value("DA", original))?;
    if digits.len() >= 6 {
        components.month = Some(digits[4..6].parse().map_err(|_| malformed_value("DA", original))?);
    }
    if digits.len() >= 8 {
        components.day = Some(digits[6..8].parse().map_err(|_| malformed_value("DA", original))?);
    }
    Ok(())
}

fn parse_time_digits(
    digits: &str,
    fraction: Option<&str>,
    original: &str,
    components: &mut Components,
) -> Result<()> {
    match digits.len() {
        2 | 4 | 6 => {}
        0 if fraction.is_none() => return Ok(()),
        _ => return Err(malformed_value("TM", original)),
    }
    components.hour = Some(digits[..2].parse().map_err(|_| malformed_value("TM", original))?);
    if digits.len() >= 4 {
        components.minute = Some(digits[2..4].parse().map_err(|_| malformed_value("TM", original))?);
    }
    if digits.len() >= 6 {
        components.second = Some(digits[4..6].parse().map_err(|_| malformed_value("TM", original))?);
    }
    if let Some(fraction) = fraction {
        if fraction.is_empty()
            || fraction.len() > 6
            || !fraction.bytes().all(|b| b.is_ascii_digit())
            || components.second.is_none()
        {
            return Err(malformed_value("TM", original));
        }
        let padded = format!("{fraction:0<9}");
        components.nanosecond = Some(padded.parse().map_err(|_| malformed_value("TM", original))?);
    }
    Ok(())
}

/// Turn components into an instant: the first instant of the named range, or
/// its last representable millisecond in ceiling mode. Ceiling only fills
/// the components the text left unparsed.
fn resolve(
    zone: FixedOffset,
    components: &Components,
    ceiling: bool,
    original: &str,
) -> Result<DateTime<Utc>> {
    let date = NaiveDate::from_ymd_opt(
        components.year,
        components.month.unwrap_or(1),
        components.day.unwrap_or(1),
    )
    .ok_or_else(|| malformed_value("date", original))?;
    let time = NaiveTime::from_hms_nano_opt(
        components.hour.unwrap_or(0),
        components.minute.unwrap_or(0),
        components.second.unwrap_or(0),
        components.nanosecond.unwrap_or(0),
    )
    .ok_or_else(|| malformed_value("time", original))?;
    let floor = local_to_utc(zone, NaiveDateTime::new(date, time), original)?;
    if !ceiling || components.nanosecond.is_some() {
        return Ok(floor);
    }
    let next = if components.second.is_some() {
        floor + Duration::seconds(1)
    } else if components.minute.is_some() {
        floor + Duration::minutes(1)
    } else if components.hour.is_some() {
        floor + Duration::hours(1)
    } else {
        let next_date = if components.day.is_some() {
            date.succ_opt()
        } else if let Some(month) = components.month {
            if month == 12 {
                NaiveDate::from_ymd_opt(components.year + 1, 1, 1)
            } else {
                NaiveDate::from_ymd_opt(components.year, month + 1, 1)
            }
        } else {
            NaiveDate::from_ymd_opt(components.year + 1, 1, 1)
        }
        .ok_or_else(|| malformed_value("date", original))?;
        local_to_utc(zone, next_date.and_time(NaiveTime::MIN), original)?
    };
    Ok(next - Duration::milliseconds(1))
}

fn local_to_utc(zone: FixedOffset, local: NaiveDateTime, original: &str) -> Result<DateTime<Utc>> {
    zone.from_local_datetime(&local)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| malformed_value("date/time", original))
}
