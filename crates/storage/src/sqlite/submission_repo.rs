use assessment_core::model::CategoryKey;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, ser, submission_from_json, submission_to_json};
use crate::repository::{CategorySubmission, StorageError, SubmissionRepository};

impl SqliteRepository {
    /// Fetch the stored submission of a category.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the category was never submitted.
    pub async fn get_submission(
        &self,
        category: &CategoryKey,
    ) -> Result<CategorySubmission, StorageError> {
        let row = sqlx::query(
            r"
                SELECT responses
                FROM submissions
                WHERE user_id = ?1 AND category_key = ?2
            ",
        )
        .bind(self.user_i64()?)
        .bind(category.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;

        let raw: String = row.try_get("responses").map_err(ser)?;
        submission_from_json(&raw)
    }
}

#[async_trait]
impl SubmissionRepository for SqliteRepository {
    async fn submit_category(
        &self,
        category: &CategoryKey,
        submission: &CategorySubmission,
    ) -> Result<(), StorageError> {
        let user_id = self.user_i64()?;
        let now = Utc::now();
        let payload = submission_to_json(submission)?;
        let answered = i64::try_from(submission.len())
            .map_err(|_| StorageError::Serialization("submission too large".into()))?;
        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query(
            r"
                INSERT INTO submissions (user_id, category_key, responses, submitted_at)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(user_id, category_key) DO UPDATE SET
                    responses = excluded.responses,
                    submitted_at = excluded.submitted_at
            ",
        )
        .bind(user_id)
        .bind(category.as_str())
        .bind(payload)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        sqlx::query(
            r"
                INSERT INTO form_progress (user_id, category_key, status, current_progress, last_updated)
                VALUES (?1, ?2, 'submitted', ?3, ?4)
                ON CONFLICT(user_id, category_key) DO UPDATE SET
                    status = 'submitted',
                    current_progress = excluded.current_progress,
                    last_updated = excluded.last_updated
            ",
        )
        .bind(user_id)
        .bind(category.as_str())
        .bind(answered)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        tx.commit().await.map_err(conn)?;
        Ok(())
    }
}
