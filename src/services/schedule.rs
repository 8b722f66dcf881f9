//! Pure decisions for the worker: given the current time and what was sent
//! last, should a job fire now.

use chrono::{DateTime, Datelike, Duration, NaiveTime, Timelike, Utc, Weekday};
use chrono_tz::Tz;

pub const POLL_DAY: Weekday = Weekday::Mon;
pub const POLL_HOUR: u32 = 7;
pub const POLL_MINUTE: u32 = 0;
pub const REMINDER_MINUTES_BEFORE: i64 = 30;
pub const SUMMARY_DAY: Weekday = Weekday::Fri;
pub const SUMMARY_HOUR: u32 = 7;
pub const SUMMARY_MINUTE: u32 = 0;
pub const CLEANUP_HOUR: u32 = 3;
pub const CLEANUP_MINUTE: u32 = 0;

/// Minimum whole days between two sends of the same weekly message.
const RESEND_GUARD_DAYS: i64 = 6;

fn sent_recently(last_sent: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    last_sent.is_some_and(|sent| (now - sent).num_days() < RESEND_GUARD_DAYS)
}

fn at(now: DateTime<Utc>, day: Weekday, hour: u32, minute: u32) -> bool {
    now.weekday() == day && now.hour() == hour && now.minute() == minute
}

pub fn should_send_poll(last_poll_sent_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    at(now, POLL_DAY, POLL_HOUR, POLL_MINUTE) && !sent_recently(last_poll_sent_at, now)
}

/// Reminders fire exactly half an hour before the event starts on the
/// node's event day, both read in the node's timezone. A reminder for a
/// 00:15 event goes out at 23:45 the evening before.
pub fn should_send_event_reminder(
    event_time: NaiveTime,
    last_reminder_sent_at: Option<DateTime<Utc>>,
    event_day: Weekday,
    tz: Tz,
    now: DateTime<Utc>,
) -> bool {
    let starts = now.with_timezone(&tz) + Duration::minutes(REMINDER_MINUTES_BEFORE);
    if starts.weekday() != event_day
        || starts.hour() != event_time.hour()
        || starts.minute() != event_time.minute()
    {
        return false;
    }

    !sent_recently(last_reminder_sent_at, now)
}

pub fn should_send_weekly_summary(
    last_summary_sent_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> bool {
    at(now, SUMMARY_DAY, SUMMARY_HOUR, SUMMARY_MINUTE) && !sent_recently(last_summary_sent_at, now)
}

/// Daily at 03:00 UTC.
pub fn should_cleanup_photos(now: DateTime<Utc>) -> bool {
    now.hour() == CLEANUP_HOUR && now.minute() == CLEANUP_MINUTE
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn test_sent_recently_counts_whole_days() {
        let now = utc(2024, 1, 15, 7, 0);
        assert!(sent_recently(Some(now - Duration::hours(6 * 24 - 1)), now));
        assert!(!sent_recently(Some(now - Duration::days(6)), now));
        assert!(!sent_recently(None, now));
    }

    #[test]
    fn test_reminder_wraps_midnight() {
        let t = NaiveTime::from_hms_opt(0, 15, 0).unwrap();
        // Wednesday 23:45 UTC, half an hour before Thursday 00:15
        assert!(should_send_event_reminder(t, None, Weekday::Thu, Tz::UTC, utc(2024, 1, 10, 23, 45)));
        assert!(!should_send_event_reminder(t, None, Weekday::Thu, Tz::UTC, utc(2024, 1, 11, 23, 45)));
    }

    #[test]
    fn test_reminder_uses_node_timezone() {
        let t = NaiveTime::from_hms_opt(18, 30, 0).unwrap();
        let bali: Tz = "Asia/Makassar".parse().unwrap();
        // Tuesday 10:00 UTC is 18:00 in Bali
        assert!(should_send_event_reminder(t, None, Weekday::Tue, bali, utc(2024, 1, 9, 10, 0)));
        assert!(!should_send_event_reminder(t, None, Weekday::Tue, bali, utc(2024, 1, 9, 18, 0)));
    }
}
