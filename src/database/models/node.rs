use chrono::{DateTime, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::utils::text::name_slug;

/// A local Hacka* meetup, optionally linked to its Telegram group.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Node {
    pub id: i64,
    pub slug: String,
    pub group_id: Option<i64>,
    pub created: DateTime<Utc>,
    /// Year the node was established.
    pub established: Option<i64>,
    pub name: String,
    pub emoji: String,
    pub signup_url: String,
    pub location: String,
    pub timezone: String,
    pub disabled: bool,
    /// Weekday of the meetup, 0 = Monday.
    pub event_day: i64,
    pub last_poll_sent_at: Option<DateTime<Utc>>,
}

/// Fields accepted when creating a node.
#[derive(Debug, Clone)]
pub struct NewNode {
    pub name: String,
    pub group_id: Option<i64>,
    pub established: Option<i64>,
    pub emoji: String,
    pub signup_url: String,
    pub location: String,
    pub timezone: String,
    pub disabled: bool,
    pub event_day: Weekday,
}

impl NewNode {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            group_id: None,
            established: None,
            emoji: String::new(),
            signup_url: String::new(),
            location: String::new(),
            timezone: "UTC".to_string(),
            disabled: false,
            event_day: Weekday::Thu,
        }
    }
}

const NODE_COLUMNS: &str = "id, slug, group_id, created, established, name, emoji, signup_url, \
     location, timezone, disabled, event_day, last_poll_sent_at";

impl Node {
    /// Public identifier used by the API and photo hashtags.
    pub fn name_slug(&self) -> String {
        name_slug(&self.name)
    }

    /// Name with the emoji in front when there is one.
    pub fn display_name(&self) -> String {
        if self.emoji.is_empty() {
            self.name.clone()
        } else {
            format!("{} {}", self.emoji, self.name)
        }
    }

    /// Parsed timezone, UTC when the stored name is not a known zone.
    pub fn tz(&self) -> Tz {
        self.timezone.parse::<Tz>().unwrap_or_else(|_| {
            tracing::warn!("Unknown timezone '{}' for node {}, using UTC", self.timezone, self.name);
            Tz::UTC
        })
    }

    pub fn event_weekday(&self) -> Weekday {
        weekday_from_index(self.event_day)
    }

    pub async fn create(pool: &sqlx::SqlitePool, new: &NewNode) -> Result<Self, sqlx::Error> {
        let slug = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO nodes (slug, group_id, created, established, name, emoji, signup_url,
                               location, timezone, disabled, event_day)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&slug)
        .bind(new.group_id)
        .bind(Utc::now())
        .bind(new.established)
        .bind(&new.name)
        .bind(&new.emoji)
        .bind(&new.signup_url)
        .bind(&new.location)
        .bind(&new.timezone)
        .bind(new.disabled)
        .bind(i64::from(new.event_day.num_days_from_monday()))
        .execute(pool)
        .await?;

        sqlx::query_as::<_, Node>(&format!("SELECT {NODE_COLUMNS} FROM nodes WHERE slug = ?"))
            .bind(&slug)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &sqlx::SqlitePool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Node>(&format!("SELECT {NODE_COLUMNS} FROM nodes WHERE id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All nodes, oldest established first and undated ones last.
    pub async fn find_all(pool: &sqlx::SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Node>(&format!(
            "SELECT {NODE_COLUMNS} FROM nodes ORDER BY established IS NULL, established, id"
        ))
        .fetch_all(pool)
        .await
    }

    pub async fn find_enabled(pool: &sqlx::SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Node>(&format!(
            "SELECT {NODE_COLUMNS} FROM nodes WHERE disabled = 0 ORDER BY id"
        ))
        .fetch_all(pool)
        .await
    }

    /// Nodes the worker acts on: those linked to a group.
    pub async fn find_with_group(pool: &sqlx::SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Node>(&format!(
            "SELECT {NODE_COLUMNS} FROM nodes WHERE group_id IS NOT NULL ORDER BY id"
        ))
        .fetch_all(pool)
        .await
    }

    pub async fn first_for_group(
        pool: &sqlx::SqlitePool,
        group_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Node>(&format!(
            "SELECT {NODE_COLUMNS} FROM nodes WHERE group_id = ? ORDER BY id LIMIT 1"
        ))
        .bind(group_id)
        .fetch_optional(pool)
        .await
    }

    /// Enabled node whose name slug equals `slug`.
    pub async fn find_by_name_slug(
        pool: &sqlx::SqlitePool,
        slug: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let nodes = Self::find_enabled(pool).await?;
        Ok(nodes.into_iter().find(|node| node.name_slug() == slug))
    }

    pub async fn find_for_member(
        pool: &sqlx::SqlitePool,
        person_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Node>(
            r#"
            SELECT DISTINCT n.id, n.slug, n.group_id, n.created, n.established, n.name, n.emoji,
                   n.signup_url, n.location, n.timezone, n.disabled, n.event_day, n.last_poll_sent_at
            FROM nodes n
            JOIN group_people gp ON gp.group_id = n.group_id
            WHERE gp.person_id = ? AND gp.has_left = 0
            ORDER BY n.id
            "#,
        )
        .bind(person_id)
        .fetch_all(pool)
        .await
    }

    pub async fn mark_poll_sent(
        pool: &sqlx::SqlitePool,
        id: i64,
        sent_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE nodes SET last_poll_sent_at = ? WHERE id = ?")
            .bind(sent_at)
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }
}

/// Maps 0..=6 to Monday..Sunday; out of range values wrap.
pub fn weekday_from_index(index: i64) -> Weekday {
    match index.rem_euclid(7) {
        0 => Weekday::Mon,
        1 => Weekday::Tue,
        2 => Weekday::Wed,
        3 => Weekday::Thu,
        4 => Weekday::Fri,
        5 => Weekday::Sat,
        _ => Weekday::Sun,
    }
}
