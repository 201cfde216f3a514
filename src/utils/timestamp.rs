use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Deserializer, de::Error};

const MINUTE_FORMAT: &str = "%Y-%m-%dT%H:%M";
const SECOND_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Parses `YYYY-MM-DDTHH:MM`, as sent by the manual-entry form, or the same with
/// seconds.
pub fn parse_local(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, MINUTE_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, SECOND_FORMAT))
        .ok()
}

/// Serde adapter for an optional local date-time in either accepted format.
pub fn deserialize_optional<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;

    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_local(value).map(Some).ok_or_else(|| {
            D::Error::custom(format!(
                "invalid timestamp '{value}', expected YYYY-MM-DDTHH:MM"
            ))
        }),
    }
}

/// Current local time at minute precision, for scanner-originated events.
pub fn now_to_minute() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now)
}
