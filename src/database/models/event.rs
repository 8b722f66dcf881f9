use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// Part of a meetup day that gets a reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Intros,
    Lunch,
    Demos,
    Drinks,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Intros => "intros",
            EventKind::Lunch => "lunch",
            EventKind::Demos => "demos",
            EventKind::Drinks => "drinks",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "intros" => Some(EventKind::Intros),
            "lunch" => Some(EventKind::Lunch),
            "demos" => Some(EventKind::Demos),
            "drinks" => Some(EventKind::Drinks),
            _ => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub node_id: i64,
    pub kind: String,
    /// Local time of day in the node's timezone.
    pub time: NaiveTime,
    pub place: String,
    pub last_reminder_sent_at: Option<DateTime<Utc>>,
}

const EVENT_COLUMNS: &str = "id, node_id, kind, time, place, last_reminder_sent_at";

impl Event {
    pub fn event_kind(&self) -> Option<EventKind> {
        EventKind::parse(&self.kind)
    }

    pub async fn create(
        pool: &sqlx::SqlitePool,
        node_id: i64,
        kind: EventKind,
        time: NaiveTime,
        place: &str,
    ) -> Result<Self, sqlx::Error> {
        let id = sqlx::query("INSERT INTO events (node_id, kind, time, place) VALUES (?, ?, ?, ?)")
            .bind(node_id)
            .bind(kind.as_str())
            .bind(time)
            .bind(place)
            .execute(pool)
            .await?
            .last_insert_rowid();

        Ok(Event {
            id,
            node_id,
            kind: kind.as_str().to_string(),
            time,
            place: place.to_string(),
            last_reminder_sent_at: None,
        })
    }

    pub async fn find_by_id(pool: &sqlx::SqlitePool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Event>(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_node(pool: &sqlx::SqlitePool, node_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE node_id = ? ORDER BY time"
        ))
        .bind(node_id)
        .fetch_all(pool)
        .await
    }

    pub async fn mark_reminder_sent(
        pool: &sqlx::SqlitePool,
        id: i64,
        sent_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE events SET last_reminder_sent_at = ? WHERE id = ?")
            .bind(sent_at)
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }
}
