//! Messages the worker posts into groups.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc, Weekday};

use crate::database::models::{Event, EventKind, Group, Node, Poll, PollAnswer};
use crate::services::attendance::week_start;
use crate::services::telegram::TelegramApi;
use crate::utils::datetime::format_event_time;

pub const POLL_OPTIONS: [&str; 2] = ["✅  Yes", "👎  Not this week"];
pub const GLOBAL_CHAT_INVITE_URL: &str = "https://t.me/+XTK6oIHCVZFkNmY1";

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

pub fn poll_question(node: &Node) -> String {
    format!(
        "Who's coming to {} this {}?",
        node.display_name(),
        weekday_name(node.event_weekday())
    )
}

pub fn global_chat_invite() -> String {
    format!("...you can also join the [Hacka* global chat 🌏💻🤓]({GLOBAL_CHAT_INVITE_URL})")
}

/// Reminder text for an event, `None` for an unknown kind.
pub fn event_reminder_text(event: &Event) -> Option<String> {
    let time = format_event_time(event.time);
    let place = event.place.trim();

    let text = match event.event_kind()? {
        EventKind::Intros => format!("🔔👋  Reminder! *Intros are at {time}*"),
        EventKind::Demos => format!("🔔💻  Reminder! *Demos are at {time}*"),
        EventKind::Lunch if place.is_empty() => format!("🔔🍔  *Lunch at {time}*"),
        EventKind::Lunch => format!("🔔🍔  *Lunch at {time}* in {place}"),
        EventKind::Drinks if place.is_empty() => "🍺🍻🍷  Drinks time — let's go!".to_string(),
        EventKind::Drinks => format!("🍺🍻🍷  {place} — let's go!"),
    };
    Some(text)
}

/// Posts the weekly poll in the node's group, records it, follows up with
/// the global chat invite and tries to pin the poll.
pub async fn send_node_poll<T: TelegramApi>(
    telegram: &T,
    pool: &sqlx::SqlitePool,
    node: &Node,
    now: DateTime<Utc>,
) -> Result<Poll> {
    let group = node_group(pool, node).await?;
    let question = poll_question(node);

    let sent = telegram
        .send_poll(group.telegram_id, &question, &POLL_OPTIONS)
        .await?;
    let poll = Poll::record_sent(pool, &sent.poll_id, node.id, &sent.question, now).await?;

    telegram
        .send_message(group.telegram_id, &global_chat_invite())
        .await?;

    if let Err(e) = telegram.pin_message(group.telegram_id, sent.message_id).await {
        tracing::warn!("Failed to pin poll for {}: {}", node.name, e);
    }

    Ok(poll)
}

pub async fn send_event_reminder<T: TelegramApi>(
    telegram: &T,
    pool: &sqlx::SqlitePool,
    node: &Node,
    event: &Event,
) -> Result<()> {
    let text = event_reminder_text(event)
        .ok_or_else(|| anyhow!("unknown event kind '{}'", event.kind))?;
    let group = node_group(pool, node).await?;
    telegram.send_message(group.telegram_id, &text).await?;
    Ok(())
}

/// Yes answers per node for polls sent since this week's Monday poll, only
/// for nodes with at least one.
pub async fn weekly_attendance(
    pool: &sqlx::SqlitePool,
    now: DateTime<Utc>,
) -> Result<Vec<(Node, i64)>> {
    let since = week_start(now);
    let mut attendance = Vec::new();
    for node in Node::find_with_group(pool).await? {
        let count = PollAnswer::yes_person_ids_since(pool, node.id, since).await?.len() as i64;
        if count > 0 {
            attendance.push((node, count));
        }
    }
    Ok(attendance)
}

pub fn weekly_summary_text(attendance: &[(Node, i64)]) -> String {
    let total: i64 = attendance.iter().map(|(_, count)| count).sum();
    let noun = if total == 1 { "person" } else { "people" };

    let mut lines = vec![
        format!("📊 This week {total} {noun} went to a Hacka\\* node:"),
        String::new(),
    ];
    for (node, count) in attendance {
        lines.push(format!("  • {}: {}", node.display_name(), count));
    }
    lines.push(String::new());
    lines.push("🌏 Find your nearest node at https://hacka.network".to_string());
    lines.join("\n")
}

/// Sends the summary to the global group. Returns `false` without sending
/// when nobody attended.
pub async fn send_weekly_summary<T: TelegramApi>(
    telegram: &T,
    pool: &sqlx::SqlitePool,
    global_group: &Group,
    now: DateTime<Utc>,
) -> Result<bool> {
    let attendance = weekly_attendance(pool, now).await?;
    if attendance.is_empty() {
        tracing::info!("No attendance this week, skipping summary");
        return Ok(false);
    }

    telegram
        .send_message(global_group.telegram_id, &weekly_summary_text(&attendance))
        .await?;
    Ok(true)
}

async fn node_group(pool: &sqlx::SqlitePool, node: &Node) -> Result<Group> {
    let group_id = node
        .group_id
        .ok_or_else(|| anyhow!("node {} has no group", node.name))?;
    Group::find_by_id(pool, group_id)
        .await?
        .ok_or_else(|| anyhow!("group {} not found", group_id))
}
