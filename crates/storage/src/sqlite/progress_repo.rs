use assessment_core::model::{CategoryKey, CategoryStatusMap};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, map_status_row, responses_from_json, responses_to_json, ser};
use crate::repository::{ProgressRepository, ProgressResponses, StorageError};

#[async_trait]
impl ProgressRepository for SqliteRepository {
    async fn load_category_status(&self) -> Result<CategoryStatusMap, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT category_key, status, current_progress, last_updated
                FROM form_progress
                WHERE user_id = ?1
            ",
        )
        .bind(self.user_i64()?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter()
            .map(|row| {
                let key: String = row.try_get("category_key").map_err(ser)?;
                Ok((CategoryKey::new(key), map_status_row(row)?))
            })
            .collect()
    }

    async fn load_saved_responses(
        &self,
        category: &CategoryKey,
    ) -> Result<Option<ProgressResponses>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT responses
                FROM progress_records
                WHERE user_id = ?1 AND category_key = ?2
            ",
        )
        .bind(self.user_i64()?)
        .bind(category.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let raw: String = row.try_get("responses").map_err(ser)?;
        responses_from_json(&raw).map(Some)
    }

    async fn save_progress(
        &self,
        category: &CategoryKey,
        progress_count: u32,
        responses: &ProgressResponses,
    ) -> Result<(), StorageError> {
        let user_id = self.user_i64()?;
        let now = Utc::now();
        let payload = responses_to_json(responses)?;
        let mut tx = self.pool.begin().await.map_err(conn)?;

        // A submitted category keeps its status; only the draft is refreshed.
        sqlx::query(
            r"
                INSERT INTO form_progress (user_id, category_key, status, current_progress, last_updated)
                VALUES (?1, ?2, 'in_progress', ?3, ?4)
                ON CONFLICT(user_id, category_key) DO UPDATE SET
                    status = CASE
                        WHEN form_progress.status = 'submitted' THEN 'submitted'
                        ELSE 'in_progress'
                    END,
                    current_progress = CASE
                        WHEN form_progress.status = 'submitted' THEN form_progress.current_progress
                        ELSE excluded.current_progress
                    END,
                    last_updated = excluded.last_updated
            ",
        )
        .bind(user_id)
        .bind(category.as_str())
        .bind(i64::from(progress_count))
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        sqlx::query(
            r"
                INSERT INTO progress_records (user_id, category_key, responses, updated_at)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(user_id, category_key) DO UPDATE SET
                    responses = excluded.responses,
                    updated_at = excluded.updated_at
            ",
        )
        .bind(user_id)
        .bind(category.as_str())
        .bind(payload)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        tx.commit().await.map_err(conn)?;
        Ok(())
    }
}
