use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A Telegram group or supergroup the bot has seen.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub telegram_id: i64,
    pub display_name: String,
    pub created: DateTime<Utc>,
    pub last_weekly_summary_sent_at: Option<DateTime<Utc>>,
}

/// Membership of a person in a group.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct GroupPerson {
    pub id: i64,
    pub group_id: i64,
    pub person_id: i64,
    pub created: DateTime<Utc>,
    pub has_left: bool,
    pub last_message_at: Option<DateTime<Utc>>,
}

const GROUP_COLUMNS: &str = "id, telegram_id, display_name, created, last_weekly_summary_sent_at";
const GROUP_PERSON_COLUMNS: &str = "id, group_id, person_id, created, has_left, last_message_at";

impl Group {
    pub async fn find_by_telegram_id(
        pool: &sqlx::SqlitePool,
        telegram_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Group>(&format!(
            "SELECT {GROUP_COLUMNS} FROM groups WHERE telegram_id = ?"
        ))
        .bind(telegram_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_id(
        pool: &sqlx::SqlitePool,
        id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Group>(&format!("SELECT {GROUP_COLUMNS} FROM groups WHERE id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Creates the group or refreshes its display name.
    pub async fn upsert(
        pool: &sqlx::SqlitePool,
        telegram_id: i64,
        display_name: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO groups (telegram_id, display_name, created)
            VALUES (?, ?, ?)
            ON CONFLICT (telegram_id) DO UPDATE SET display_name = excluded.display_name
            "#,
        )
        .bind(telegram_id)
        .bind(display_name)
        .bind(Utc::now())
        .execute(pool)
        .await?;

        Self::find_by_telegram_id(pool, telegram_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn has_node(&self, pool: &sqlx::SqlitePool) -> Result<bool, sqlx::Error> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM nodes WHERE group_id = ?")
            .bind(self.id)
            .fetch_one(pool)
            .await?;
        Ok(count > 0)
    }

    pub async fn mark_weekly_summary_sent(
        pool: &sqlx::SqlitePool,
        id: i64,
        sent_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE groups SET last_weekly_summary_sent_at = ? WHERE id = ?")
            .bind(sent_at)
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }
}

impl GroupPerson {
    pub async fn find(
        pool: &sqlx::SqlitePool,
        group_id: i64,
        person_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, GroupPerson>(&format!(
            "SELECT {GROUP_PERSON_COLUMNS} FROM group_people WHERE group_id = ? AND person_id = ?"
        ))
        .bind(group_id)
        .bind(person_id)
        .fetch_optional(pool)
        .await
    }

    /// Records that the person joined or left the group.
    pub async fn set_left(
        pool: &sqlx::SqlitePool,
        group_id: i64,
        person_id: i64,
        has_left: bool,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO group_people (group_id, person_id, created, has_left)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (group_id, person_id) DO UPDATE SET has_left = excluded.has_left
            "#,
        )
        .bind(group_id)
        .bind(person_id)
        .bind(Utc::now())
        .bind(has_left)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Marks the person as an active member who just spoke.
    pub async fn touch(
        pool: &sqlx::SqlitePool,
        group_id: i64,
        person_id: i64,
        message_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO group_people (group_id, person_id, created, has_left, last_message_at)
            VALUES (?, ?, ?, 0, ?)
            ON CONFLICT (group_id, person_id)
            DO UPDATE SET has_left = 0, last_message_at = excluded.last_message_at
            "#,
        )
        .bind(group_id)
        .bind(person_id)
        .bind(Utc::now())
        .bind(message_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Active memberships with a message in any of the given groups, most
    /// recent message first per person.
    pub async fn recent_chatters(
        pool: &sqlx::SqlitePool,
        group_ids: &[i64],
    ) -> Result<Vec<Self>, sqlx::Error> {
        if group_ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = group_ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let query = format!(
            "SELECT {GROUP_PERSON_COLUMNS} FROM group_people
             WHERE has_left = 0 AND last_message_at IS NOT NULL AND group_id IN ({placeholders})
             ORDER BY person_id, last_message_at DESC"
        );

        let mut query_builder = sqlx::query_as::<_, GroupPerson>(&query);
        for group_id in group_ids {
            query_builder = query_builder.bind(group_id);
        }

        query_builder.fetch_all(pool).await
    }

    /// Distinct active members across the given groups.
    pub async fn count_active_people(
        pool: &sqlx::SqlitePool,
        group_ids: &[i64],
    ) -> Result<i64, sqlx::Error> {
        if group_ids.is_empty() {
            return Ok(0);
        }

        let placeholders = group_ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let query = format!(
            "SELECT COUNT(DISTINCT person_id) FROM group_people
             WHERE has_left = 0 AND group_id IN ({placeholders})"
        );

        let mut query_builder = sqlx::query_scalar::<_, i64>(&query);
        for group_id in group_ids {
            query_builder = query_builder.bind(group_id);
        }

        query_builder.fetch_one(pool).await
    }
}
