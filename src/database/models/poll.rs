use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Weekly "who's coming" poll posted in a node group.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Poll {
    pub id: i64,
    pub telegram_id: String,
    pub created: DateTime<Utc>,
    pub node_id: Option<i64>,
    pub question: String,
    pub yes_count: i64,
    pub no_count: i64,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PollAnswer {
    pub id: i64,
    pub poll_id: i64,
    pub person_id: i64,
    pub yes: bool,
}

/// Aggregate poll state reported by Telegram.
#[derive(Debug, Clone, Default)]
pub struct PollState {
    pub question: String,
    pub yes_count: i64,
    pub no_count: i64,
}

const POLL_COLUMNS: &str = "id, telegram_id, created, node_id, question, yes_count, no_count";

impl Poll {
    pub async fn find_by_telegram_id(
        pool: &sqlx::SqlitePool,
        telegram_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Poll>(&format!("SELECT {POLL_COLUMNS} FROM polls WHERE telegram_id = ?"))
            .bind(telegram_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn create(
        pool: &sqlx::SqlitePool,
        telegram_id: &str,
        node_id: Option<i64>,
        question: &str,
        created: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query("INSERT INTO polls (telegram_id, created, node_id, question) VALUES (?, ?, ?, ?)")
            .bind(telegram_id)
            .bind(created)
            .bind(node_id)
            .bind(question)
            .execute(pool)
            .await?;

        Self::find_by_telegram_id(pool, telegram_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Records a poll the bot has just posted for a node, resetting counts.
    pub async fn record_sent(
        pool: &sqlx::SqlitePool,
        telegram_id: &str,
        node_id: i64,
        question: &str,
        created: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO polls (telegram_id, created, node_id, question, yes_count, no_count)
            VALUES (?, ?, ?, ?, 0, 0)
            ON CONFLICT (telegram_id) DO UPDATE SET
                node_id = excluded.node_id,
                question = excluded.question,
                yes_count = 0,
                no_count = 0
            "#,
        )
        .bind(telegram_id)
        .bind(created)
        .bind(node_id)
        .bind(question)
        .execute(pool)
        .await?;

        Self::find_by_telegram_id(pool, telegram_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Stores the latest counts. `node` replaces the linked node when given;
    /// `None` leaves the link alone.
    pub async fn upsert_state(
        pool: &sqlx::SqlitePool,
        telegram_id: &str,
        state: &PollState,
        node: Option<Option<i64>>,
    ) -> Result<Self, sqlx::Error> {
        match node {
            Some(node_id) => {
                sqlx::query(
                    r#"
                    INSERT INTO polls (telegram_id, created, node_id, question, yes_count, no_count)
                    VALUES (?, ?, ?, ?, ?, ?)
                    ON CONFLICT (telegram_id) DO UPDATE SET
                        node_id = excluded.node_id,
                        question = excluded.question,
                        yes_count = excluded.yes_count,
                        no_count = excluded.no_count
                    "#,
                )
                .bind(telegram_id)
                .bind(Utc::now())
                .bind(node_id)
                .bind(&state.question)
                .bind(state.yes_count)
                .bind(state.no_count)
                .execute(pool)
                .await?;
            }
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO polls (telegram_id, created, question, yes_count, no_count)
                    VALUES (?, ?, ?, ?, ?)
                    ON CONFLICT (telegram_id) DO UPDATE SET
                        question = excluded.question,
                        yes_count = excluded.yes_count,
                        no_count = excluded.no_count
                    "#,
                )
                .bind(telegram_id)
                .bind(Utc::now())
                .bind(&state.question)
                .bind(state.yes_count)
                .bind(state.no_count)
                .execute(pool)
                .await?;
            }
        }

        Self::find_by_telegram_id(pool, telegram_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }
}

impl PollAnswer {
    pub async fn find(
        pool: &sqlx::SqlitePool,
        poll_id: i64,
        person_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, PollAnswer>(
            "SELECT id, poll_id, person_id, yes FROM poll_answers WHERE poll_id = ? AND person_id = ?",
        )
        .bind(poll_id)
        .bind(person_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn upsert(
        pool: &sqlx::SqlitePool,
        poll_id: i64,
        person_id: i64,
        yes: bool,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO poll_answers (poll_id, person_id, yes) VALUES (?, ?, ?)
            ON CONFLICT (poll_id, person_id) DO UPDATE SET yes = excluded.yes
            "#,
        )
        .bind(poll_id)
        .bind(person_id)
        .bind(yes)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn retract(
        pool: &sqlx::SqlitePool,
        poll_id: i64,
        person_id: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM poll_answers WHERE poll_id = ? AND person_id = ?")
            .bind(poll_id)
            .bind(person_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// People who said yes to a poll of this node created at or after `since`.
    /// One entry per answer, so a person answering two polls appears twice.
    pub async fn yes_person_ids_since(
        pool: &sqlx::SqlitePool,
        node_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<i64>, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT pa.person_id
            FROM poll_answers pa
            JOIN polls p ON p.id = pa.poll_id
            WHERE p.node_id = ? AND p.created >= ? AND pa.yes = 1
            "#,
        )
        .bind(node_id)
        .bind(since)
        .fetch_all(pool)
        .await
    }

    /// `(person_id, node_id)` for every yes answer to a node poll.
    pub async fn yes_node_pairs(pool: &sqlx::SqlitePool) -> Result<Vec<(i64, i64)>, sqlx::Error> {
        sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT pa.person_id, p.node_id
            FROM poll_answers pa
            JOIN polls p ON p.id = pa.poll_id
            WHERE pa.yes = 1 AND p.node_id IS NOT NULL
            ORDER BY pa.id
            "#,
        )
        .fetch_all(pool)
        .await
    }
}
