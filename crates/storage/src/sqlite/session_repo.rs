use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, ser};
use crate::repository::{SessionGateway, StorageError};

impl SqliteRepository {
    /// When this user last logged out, if ever.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the lookup fails.
    pub async fn last_logout_at(&self) -> Result<Option<DateTime<Utc>>, StorageError> {
        let row = sqlx::query("SELECT last_logout_at FROM user_sessions WHERE user_id = ?1")
            .bind(self.user_i64()?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;
        match row {
            Some(row) => row.try_get("last_logout_at").map_err(ser),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl SessionGateway for SqliteRepository {
    async fn logout(&self) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO user_sessions (user_id, last_logout_at)
                VALUES (?1, ?2)
                ON CONFLICT(user_id) DO UPDATE SET last_logout_at = excluded.last_logout_at
            ",
        )
        .bind(self.user_i64()?)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }
}
