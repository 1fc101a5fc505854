use serde_json::Value;
use time::{format_description::well_known::Rfc3339, Date, OffsetDateTime, Time};

/// Midnight UTC on the first day of `now`'s calendar month
pub fn start_of_month(now: OffsetDateTime) -> OffsetDateTime {
    let now = now.to_offset(time::UtcOffset::UTC);
    now.replace_day(1)
        .map(|dt| dt.replace_time(Time::MIDNIGHT))
        .unwrap_or(now)
}

/// Parse a timestamp from a provider payload.
///
/// Numbers are Unix seconds; strings are RFC 3339 or a bare `YYYY-MM-DD`
/// (midnight UTC). Anything else yields `None`.
pub fn parse_timestamp(value: &Value) -> Option<OffsetDateTime> {
    match value {
        Value::Number(n) => {
            let secs = n.as_i64().or_else(|| n.as_f64().map(|f| f.floor() as i64))?;
            OffsetDateTime::from_unix_timestamp(secs).ok()
        }
        Value::String(s) => {
            let s = s.trim();
            OffsetDateTime::parse(s, &Rfc3339).ok().or_else(|| {
                let format = time::macros::format_description!("[year]-[month]-[day]");
                Date::parse(s, &format)
                    .ok()
                    .map(|date| date.midnight().assume_utc())
            })
        }
        _ => None,
    }
}
