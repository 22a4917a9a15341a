use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, SubsecRound};
use serde::Serializer;

/// Day/month/year order used by the biometric API and the portal UI.
pub const DMY_FORMAT: &str = "%d/%m/%Y";

/// Wall-clock rendering used for every punch handed back to the UI.
pub const LOCAL_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const NAIVE_TIMESTAMP_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Four-digit, unsigned years only; `%Y` alone would accept `+262142`.
pub fn parse_dmy(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DMY_FORMAT)
        .ok()
        .filter(|date| (1..=9999).contains(&date.year()))
}

pub fn format_dmy(date: NaiveDate) -> String {
    date.format(DMY_FORMAT).to_string()
}

pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Last representable millisecond of `date` (23:59:59.999).
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_milli_opt(23, 59, 59, 999)
        .unwrap_or(NaiveDateTime::MAX)
}

pub fn format_local(timestamp: &NaiveDateTime) -> String {
    timestamp.format(LOCAL_DATETIME_FORMAT).to_string()
}

/// serde `serialize_with` hook for `NaiveDateTime` fields shown to the UI.
pub fn serialize_local<S>(timestamp: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_local(timestamp))
}

/// Parses the ISO-ish timestamps the biometric API emits.
///
/// Offsets, when present, are dropped after reading the wall clock they carry;
/// punches are naive local time throughout the system. Sub-millisecond digits
/// are truncated to match the `DATETIME(3)` column.
pub fn parse_upstream_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Some(with_offset.naive_local().trunc_subsecs(3));
    }

    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .map(start_of_day)
        })
        .map(|timestamp| timestamp.trunc_subsecs(3))
}
