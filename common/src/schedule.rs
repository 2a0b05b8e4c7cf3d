use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Local, NaiveDateTime};

/// Substring the backend puts in one-shot (date) triggers.
pub const ONE_SHOT_MARKER: &str = "date[";
pub const ONE_TIME_LABEL: &str = "One-Time";
pub const PENDING_LABEL: &str = "Pending";

pub const SYSTEM_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Build the daily cron expression `"<minute> <hour> * * *"` from form fields.
///
/// Both fields accept leading zeros; the output carries none, so `("03", "30")`
/// becomes `"30 3 * * *"`.
pub fn compose_daily_cron(hour: &str, minute: &str) -> Result<String> {
    let h = parse_field(hour, "hour", 23)?;
    let m = parse_field(minute, "minute", 59)?;
    Ok(format!("{} {} * * *", m, h))
}

fn parse_field(raw: &str, name: &str, max: u32) -> Result<u32> {
    let raw = raw.trim();
    let value: u32 = raw
        .parse()
        .with_context(|| format!("Invalid {}: {:?}", name, raw))?;
    if value > max {
        return Err(anyhow!("Invalid {}: {} (expected 0-{})", name, value, max));
    }
    Ok(value)
}

/// Split `HH:MM` into its hour and minute parts.
pub fn split_time_of_day(s: &str) -> Result<(&str, &str)> {
    s.split_once(':')
        .ok_or_else(|| anyhow!("Invalid time format. Use HH:MM"))
}

/// Parse the `/api/time` payload, a space separated local date and time.
pub fn parse_system_time(s: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s.trim(), SYSTEM_TIME_FORMAT)
        .with_context(|| format!("Invalid system time: {:?}", s))
}

/// Render a backend timestamp in local time, or return it untouched when it
/// matches none of the known shapes.
pub fn format_timestamp(raw: &str) -> String {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&Local).format(SYSTEM_TIME_FORMAT).to_string();
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return dt.with_timezone(&Local).format(SYSTEM_TIME_FORMAT).to_string();
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return dt.format(SYSTEM_TIME_FORMAT).to_string();
        }
    }
    raw.to_string()
}
