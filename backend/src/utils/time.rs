use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;

/// Returns the current time in the configured timezone.
pub fn now_in_timezone(tz: &Tz) -> DateTime<Tz> {
    Utc::now().with_timezone(tz)
}

/// Returns today's date in the configured timezone.
pub fn today_local(tz: &Tz) -> NaiveDate {
    now_in_timezone(tz).date_naive()
}

/// Calendar date of an instant as seen in the configured timezone.
pub fn local_date(at: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    at.with_timezone(tz).date_naive()
}

/// Wall-clock time of an instant as seen in the configured timezone.
pub fn local_time(at: DateTime<Utc>, tz: &Tz) -> NaiveTime {
    at.with_timezone(tz).time()
}
