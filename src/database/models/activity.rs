use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Per-day message counter for a person in a group.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ActivityDay {
    pub id: i64,
    pub person_id: i64,
    pub group_id: i64,
    pub date: NaiveDate,
    pub message_count: i64,
}

impl ActivityDay {
    pub async fn increment(
        pool: &sqlx::SqlitePool,
        person_id: i64,
        group_id: i64,
        date: NaiveDate,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO activity_days (person_id, group_id, date, message_count)
            VALUES (?, ?, ?, 1)
            ON CONFLICT (person_id, group_id, date)
            DO UPDATE SET message_count = message_count + 1
            "#,
        )
        .bind(person_id)
        .bind(group_id)
        .bind(date)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn find(
        pool: &sqlx::SqlitePool,
        person_id: i64,
        group_id: i64,
        date: NaiveDate,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ActivityDay>(
            "SELECT id, person_id, group_id, date, message_count FROM activity_days
             WHERE person_id = ? AND group_id = ? AND date = ?",
        )
        .bind(person_id)
        .bind(group_id)
        .bind(date)
        .fetch_optional(pool)
        .await
    }
}
