use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Processed meetup photo, newest first by default.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Photo {
    pub id: i64,
    pub node_id: i64,
    pub telegram_file_id: String,
    #[serde(skip)]
    pub image_data: Vec<u8>,
    pub uploaded_by: Option<i64>,
    pub created: DateTime<Utc>,
}

/// Photo metadata joined with its node, without the image bytes.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PhotoSummary {
    pub id: i64,
    pub node_id: i64,
    pub node_name: String,
    pub node_emoji: String,
    pub created: DateTime<Utc>,
}

const PHOTO_COLUMNS: &str = "id, node_id, telegram_file_id, image_data, uploaded_by, created";

impl Photo {
    pub async fn create(
        pool: &sqlx::SqlitePool,
        node_id: i64,
        telegram_file_id: &str,
        image_data: &[u8],
        uploaded_by: Option<i64>,
        created: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error> {
        let id = sqlx::query(
            r#"
            INSERT INTO photos (node_id, telegram_file_id, image_data, uploaded_by, created)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(node_id)
        .bind(telegram_file_id)
        .bind(image_data)
        .bind(uploaded_by)
        .bind(created)
        .execute(pool)
        .await?
        .last_insert_rowid();

        Ok(Photo {
            id,
            node_id,
            telegram_file_id: telegram_file_id.to_string(),
            image_data: image_data.to_vec(),
            uploaded_by,
            created,
        })
    }

    pub async fn find_by_id(pool: &sqlx::SqlitePool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Photo>(&format!("SELECT {PHOTO_COLUMNS} FROM photos WHERE id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_file_id(
        pool: &sqlx::SqlitePool,
        telegram_file_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Photo>(&format!(
            "SELECT {PHOTO_COLUMNS} FROM photos WHERE telegram_file_id = ?"
        ))
        .bind(telegram_file_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn exists_for_file_id(
        pool: &sqlx::SqlitePool,
        telegram_file_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM photos WHERE telegram_file_id = ?",
        )
        .bind(telegram_file_id)
        .fetch_one(pool)
        .await?;
        Ok(count > 0)
    }

    pub async fn delete(pool: &sqlx::SqlitePool, id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM photos WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn count(pool: &sqlx::SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM photos")
            .fetch_one(pool)
            .await
    }

    /// Newest photos created at or after `since`, optionally for one node.
    pub async fn recent(
        pool: &sqlx::SqlitePool,
        node_id: Option<i64>,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<PhotoSummary>, sqlx::Error> {
        sqlx::query_as::<_, PhotoSummary>(
            r#"
            SELECT p.id, p.node_id, n.name AS node_name, n.emoji AS node_emoji, p.created
            FROM photos p
            JOIN nodes n ON n.id = p.node_id
            WHERE p.created >= ? AND (? IS NULL OR p.node_id = ?)
            ORDER BY p.created DESC, p.id DESC
            LIMIT ?
            "#,
        )
        .bind(since)
        .bind(node_id)
        .bind(node_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// `(id, node_id, created)` for every photo, used by date backfills.
    pub async fn all_dates(pool: &sqlx::SqlitePool) -> Result<Vec<(i64, i64, DateTime<Utc>)>, sqlx::Error> {
        sqlx::query_as::<_, (i64, i64, DateTime<Utc>)>(
            "SELECT id, node_id, created FROM photos ORDER BY id",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn set_created(
        pool: &sqlx::SqlitePool,
        id: i64,
        created: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE photos SET created = ? WHERE id = ?")
            .bind(created)
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Deletes everything but the newest `keep` photos; returns rows removed.
    pub async fn prune_oldest(pool: &sqlx::SqlitePool, keep: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM photos WHERE id NOT IN (
                SELECT id FROM photos ORDER BY created DESC, id DESC LIMIT ?
            )
            "#,
        )
        .bind(keep)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
