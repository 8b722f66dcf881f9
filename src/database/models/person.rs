use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::Node;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Person {
    pub id: i64,
    pub telegram_id: i64,
    pub is_bot: bool,
    pub first_name: String,
    pub username: String,
    /// When set the person is hidden from hacka.network and `/people`.
    pub privacy: bool,
    pub username_x: String,
    pub bio: String,
    pub onboarded: bool,
}

/// Telegram-side identity fields refreshed on every update.
#[derive(Debug, Clone, Default)]
pub struct TelegramProfile {
    pub telegram_id: i64,
    pub is_bot: bool,
    pub first_name: String,
    pub username: String,
}

const PERSON_COLUMNS: &str =
    "id, telegram_id, is_bot, first_name, username, privacy, username_x, bio, onboarded";

impl Person {
    pub async fn find_by_telegram_id(
        pool: &sqlx::SqlitePool,
        telegram_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Person>(&format!(
            "SELECT {PERSON_COLUMNS} FROM people WHERE telegram_id = ?"
        ))
        .bind(telegram_id)
        .fetch_optional(pool)
        .await
    }

    /// Creates the person or refreshes the Telegram profile fields, leaving
    /// the hacka.network profile untouched.
    pub async fn upsert(
        pool: &sqlx::SqlitePool,
        profile: &TelegramProfile,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO people (telegram_id, is_bot, first_name, username)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (telegram_id) DO UPDATE SET
                is_bot = excluded.is_bot,
                first_name = excluded.first_name,
                username = excluded.username
            "#,
        )
        .bind(profile.telegram_id)
        .bind(profile.is_bot)
        .bind(&profile.first_name)
        .bind(&profile.username)
        .execute(pool)
        .await?;

        Self::find_by_telegram_id(pool, profile.telegram_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn set_privacy(&mut self, pool: &sqlx::SqlitePool, privacy: bool) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE people SET privacy = ? WHERE id = ?")
            .bind(privacy)
            .bind(self.id)
            .execute(pool)
            .await?;
        self.privacy = privacy;
        Ok(())
    }

    pub async fn set_username_x(&mut self, pool: &sqlx::SqlitePool, username_x: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE people SET username_x = ? WHERE id = ?")
            .bind(username_x)
            .bind(self.id)
            .execute(pool)
            .await?;
        self.username_x = username_x.to_string();
        Ok(())
    }

    pub async fn set_bio(&mut self, pool: &sqlx::SqlitePool, bio: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE people SET bio = ? WHERE id = ?")
            .bind(bio)
            .bind(self.id)
            .execute(pool)
            .await?;
        self.bio = bio.to_string();
        Ok(())
    }

    pub async fn mark_onboarded(&mut self, pool: &sqlx::SqlitePool) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE people SET onboarded = 1 WHERE id = ?")
            .bind(self.id)
            .execute(pool)
            .await?;
        self.onboarded = true;
        Ok(())
    }

    /// Nodes whose group this person is an active member of.
    pub async fn nodes(&self, pool: &sqlx::SqlitePool) -> Result<Vec<Node>, sqlx::Error> {
        Node::find_for_member(pool, self.id).await
    }

    /// People with privacy off and a first name or X username, restricted
    /// to the given ids.
    pub async fn find_public_by_ids(
        pool: &sqlx::SqlitePool,
        ids: &[i64],
    ) -> Result<Vec<Self>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let query = format!(
            "SELECT {PERSON_COLUMNS} FROM people
             WHERE privacy = 0 AND (first_name != '' OR username_x != '') AND id IN ({placeholders})
             ORDER BY id"
        );

        let mut query_builder = sqlx::query_as::<_, Person>(&query);
        for id in ids {
            query_builder = query_builder.bind(id);
        }

        query_builder.fetch_all(pool).await
    }

    /// Public active members of a group, ordered by first name.
    pub async fn find_public_in_group(
        pool: &sqlx::SqlitePool,
        group_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Person>(
            r#"
            SELECT p.id, p.telegram_id, p.is_bot, p.first_name, p.username, p.privacy,
                   p.username_x, p.bio, p.onboarded
            FROM people p
            JOIN group_people gp ON gp.person_id = p.id
            WHERE gp.group_id = ? AND gp.has_left = 0 AND p.privacy = 0
              AND (p.first_name != '' OR p.username_x != '')
            ORDER BY p.first_name
            "#,
        )
        .bind(group_id)
        .fetch_all(pool)
        .await
    }
}
