use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;

/// Format of dates supplied by callers when listing the audit trail.
pub const LOG_QUERY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format of the per-day audit bucket names, e.g. `18-Oct-2026`.
pub const LOG_DAY_FORMAT: &str = "%d-%b-%Y";

/// Current time as seconds since the Unix epoch.
pub fn unix_now() -> i64 {
    Utc::now().timestamp()
}

/// Returns the current time in the configured timezone.
pub fn now_in_timezone(tz: &Tz) -> DateTime<Tz> {
    Utc::now().with_timezone(tz)
}

/// Returns today's date in the configured timezone.
pub fn today_local(tz: &Tz) -> NaiveDate {
    now_in_timezone(tz).date_naive()
}

/// Name of the audit bucket holding a day's records.
pub fn day_bucket_name(date: NaiveDate) -> String {
    date.format(LOG_DAY_FORMAT).to_string()
}

/// Parses a `YYYY-MM-DD hh:mm:ss` moment and returns its date.
pub fn parse_log_date(value: &str) -> Option<NaiveDate> {
    NaiveDateTime::parse_from_str(value.trim(), LOG_QUERY_FORMAT)
        .ok()
        .map(|moment| moment.date())
}
