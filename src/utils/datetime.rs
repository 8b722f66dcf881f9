use chrono::{DateTime, Datelike, Days, NaiveTime, Utc, Weekday};
use chrono_tz::Tz;

/// Short clock time for reminders: `9:30am`, `4pm`.
pub fn format_event_time(time: NaiveTime) -> String {
    time.format("%-I:%M%P").to_string().replace(":00", "")
}

/// Most recent `event_day` in `tz` on or before `at`, keeping the local
/// time of day.
pub fn event_date_for(at: DateTime<Utc>, event_day: Weekday, tz: Tz) -> DateTime<Utc> {
    let local = at.with_timezone(&tz);
    let days_back = (local.weekday().num_days_from_monday() + 7
        - event_day.num_days_from_monday())
        % 7;

    local
        .checked_sub_days(Days::new(u64::from(days_back)))
        .map(|shifted| shifted.with_timezone(&Utc))
        .unwrap_or_else(|| at - chrono::Duration::days(i64::from(days_back)))
}
