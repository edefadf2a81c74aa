//! Report clock: telemetry timestamps and staleness.
//!
//! Device exports stamp `Last_Updated` as an Excel serial date (days since
//! 1899-12-30, fractional part = time of day). The engine never reads the
//! system clock; callers pass `as_of` explicitly.

use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Default age after which a device counts as offline.
pub const DEFAULT_STALE_DAYS: f64 = 5.0;

const SECONDS_PER_DAY: f64 = 86_400.0;

fn excel_epoch() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Convert an Excel serial date to a UTC instant.
pub fn excel_serial_to_datetime(serial: f64) -> Option<DateTime<Utc>> {
    if !serial.is_finite() {
        return None;
    }
    let seconds = (serial * SECONDS_PER_DAY).round() as i64;
    excel_epoch().checked_add_signed(Duration::try_seconds(seconds)?)
}

/// Convert a UTC instant back to an Excel serial date.
pub fn datetime_to_excel_serial(at: DateTime<Utc>) -> f64 {
    (at - excel_epoch()).num_seconds() as f64 / SECONDS_PER_DAY
}

/// Fractional days between the last report and `now`.
pub fn age_days(last_updated: f64, now: DateTime<Utc>) -> Option<f64> {
    let last = excel_serial_to_datetime(last_updated)?;
    Some((now - last).num_seconds() as f64 / SECONDS_PER_DAY)
}

/// True when telemetry is older than `threshold_days`.
/// A device that has never reported is stale.
pub fn is_stale(last_updated: Option<f64>, now: DateTime<Utc>, threshold_days: f64) -> bool {
    match last_updated.and_then(|serial| age_days(serial, now)) {
        Some(age) => age > threshold_days,
        None => true,
    }
}
