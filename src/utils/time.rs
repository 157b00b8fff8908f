use anyhow::Result;
use chrono::{DateTime, FixedOffset, NaiveDate, TimeDelta, TimeZone, Utc};

const SECONDS_PER_HOUR: f64 = 3600.0;

pub fn display_offset(hours: i32) -> Result<FixedOffset> {
    FixedOffset::east_opt(hours * 3600)
        .ok_or_else(|| anyhow::anyhow!("UTC offset out of range: {} hours", hours))
}

/// Rounds an hour figure to two decimal places, half away from zero.
pub fn round_hours(hours: f64) -> f64 {
    (hours * 100.0).round() / 100.0
}

/// Converts a signed wall-clock span to fractional hours without rounding.
pub fn delta_to_hours(delta: TimeDelta) -> f64 {
    delta.num_seconds() as f64 / SECONDS_PER_HOUR
}

pub fn local_date(timestamp: DateTime<Utc>, offset: &FixedOffset) -> NaiveDate {
    timestamp.with_timezone(offset).date_naive()
}

/// UTC instant at which `date` begins in the display timezone.
pub fn start_of_local_day(date: NaiveDate, offset: &FixedOffset) -> DateTime<Utc> {
    let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default();
    offset
        .from_local_datetime(&midnight)
        .single()
        .map(|dt| dt.to_utc())
        .unwrap_or_else(|| midnight.and_utc())
}

pub fn format_hours(hours: f64) -> String {
    let total_minutes = (hours * 60.0).round() as i64;
    let sign = if total_minutes < 0 { "-" } else { "" };
    let minutes = total_minutes.abs();
    format!("{:.2} h ({}{}h {:02}m)", hours, sign, minutes / 60, minutes % 60)
}

pub fn format_datetime(datetime: DateTime<Utc>, offset: &FixedOffset) -> String {
    datetime
        .with_timezone(offset)
        .format("%Y-%m-%d %H:%M:%S %:z")
        .to_string()
}

pub fn format_time(datetime: DateTime<Utc>, offset: &FixedOffset) -> String {
    datetime.with_timezone(offset).format("%H:%M").to_string()
}
