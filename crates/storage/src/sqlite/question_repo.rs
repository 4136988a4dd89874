use assessment_core::model::{CategoryKey, Question, QuestionId};
use async_trait::async_trait;
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, ser};
use crate::repository::{QuestionRepository, StorageError};

impl SqliteRepository {
    /// Replace the question set of a category, keeping the given order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    pub async fn replace_questions(
        &self,
        category: &CategoryKey,
        questions: &[Question],
    ) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query("DELETE FROM questions WHERE category_key = ?1")
            .bind(category.as_str())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        for (position, question) in questions.iter().enumerate() {
            let position = i64::try_from(position)
                .map_err(|_| StorageError::Serialization("question position overflow".into()))?;
            sqlx::query(
                r"
                    INSERT INTO questions (category_key, position, id, prompt)
                    VALUES (?1, ?2, ?3, ?4)
                ",
            )
            .bind(category.as_str())
            .bind(position)
            .bind(question.id.as_str())
            .bind(&question.prompt)
            .execute(&mut *tx)
            .await
            .map_err(|err| match err {
                sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::Conflict,
                other => conn(other),
            })?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(())
    }
}

#[async_trait]
impl QuestionRepository for SqliteRepository {
    async fn load_questions(&self, category: &CategoryKey) -> Result<Vec<Question>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, prompt
                FROM questions
                WHERE category_key = ?1
                ORDER BY position ASC
            ",
        )
        .bind(category.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter()
            .map(|row| {
                Ok(Question {
                    id: QuestionId::new(row.try_get::<String, _>("id").map_err(ser)?),
                    prompt: row.try_get("prompt").map_err(ser)?,
                })
            })
            .collect()
    }
}
