use std::collections::HashSet;

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};

use crate::database::models::{Node, PollAnswer};

const POLL_TIME: NaiveTime = match NaiveTime::from_hms_opt(7, 0, 0) {
    Some(time) => time,
    None => NaiveTime::MIN,
};

/// Most recent Monday 07:00 UTC at or before `now`, when the weekly poll
/// goes out.
pub fn week_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let days_since_monday = i64::from(now.weekday().num_days_from_monday());
    let monday = now.date_naive() - Duration::days(days_since_monday);
    let start = monday.and_time(POLL_TIME).and_utc();
    if now < start {
        start - Duration::weeks(1)
    } else {
        start
    }
}

/// Start of the attending window, or `None` once Friday 07:00 UTC has
/// passed and attendance stops counting until the next poll.
pub fn attending_window(now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let monday = week_start(now);
    let friday = monday + Duration::days(4);
    if now >= friday {
        return None;
    }
    Some(monday)
}

/// Yes answers to this week's polls of a node. Counts answers, not people.
pub async fn attending_count(
    pool: &sqlx::SqlitePool,
    node: &Node,
    now: DateTime<Utc>,
) -> Result<i64, sqlx::Error> {
    if node.group_id.is_none() {
        return Ok(0);
    }
    let Some(since) = attending_window(now) else {
        return Ok(0);
    };
    let answers = PollAnswer::yes_person_ids_since(pool, node.id, since).await?;
    Ok(answers.len() as i64)
}

/// People who said yes to one of this week's polls of a node.
pub async fn attending_person_ids(
    pool: &sqlx::SqlitePool,
    node: &Node,
    now: DateTime<Utc>,
) -> Result<HashSet<i64>, sqlx::Error> {
    if node.group_id.is_none() {
        return Ok(HashSet::new());
    }
    let Some(since) = attending_window(now) else {
        return Ok(HashSet::new());
    };
    let answers = PollAnswer::yes_person_ids_since(pool, node.id, since).await?;
    Ok(answers.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        // January 2024: the 8th is a Monday
        Utc.with_ymd_and_hms(2024, 1, d, h, mi, 0).unwrap()
    }

    #[test]
    fn test_window_open_during_week() {
        assert_eq!(attending_window(utc(8, 7, 0)), Some(utc(8, 7, 0)));
        assert_eq!(attending_window(utc(10, 12, 30)), Some(utc(8, 7, 0)));
        assert_eq!(attending_window(utc(12, 6, 59)), Some(utc(8, 7, 0)));
    }

    #[test]
    fn test_window_closed_from_friday_morning() {
        assert_eq!(attending_window(utc(12, 7, 0)), None);
        assert_eq!(attending_window(utc(13, 12, 0)), None);
        assert_eq!(attending_window(utc(14, 23, 0)), None);
    }

    #[test]
    fn test_week_start() {
        assert_eq!(week_start(utc(12, 7, 0)), utc(8, 7, 0));
        assert_eq!(week_start(utc(14, 23, 0)), utc(8, 7, 0));
        assert_eq!(week_start(utc(15, 6, 0)), utc(8, 7, 0));
        assert_eq!(week_start(utc(15, 7, 0)), utc(15, 7, 0));
    }

    #[test]
    fn test_monday_before_seven_is_closed() {
        // Falls back to last week's Monday, whose Friday has passed.
        assert_eq!(attending_window(utc(8, 6, 59)), None);
    }
}
