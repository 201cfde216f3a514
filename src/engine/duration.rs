use chrono::NaiveDateTime;
use serde::Serializer;

/// Hours between two instants, floored at zero and rounded to two decimals.
pub fn elapsed_hours(start: NaiveDateTime, end: NaiveDateTime) -> f64 {
    let seconds = (end - start).num_seconds().max(0);
    round_hundredths(seconds as f64 / 3600.0)
}

fn round_hundredths(hours: f64) -> f64 {
    (hours * 100.0).round() / 100.0
}

pub fn format_hours(hours: f64) -> String {
    format!("{hours:.2}")
}

/// Serializes hours as a fixed two-decimal string ("7.92") for direct display.
pub fn serialize_hours<S>(hours: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_hours(*hours))
}
