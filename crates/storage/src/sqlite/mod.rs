use std::sync::Arc;
use std::time::Duration;

use assessment_core::model::UserId;
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use thiserror::Error;

use crate::repository::{
    ProgressRepository, QuestionRepository, SessionGateway, Storage, SubmissionRepository,
};

mod mapping;
mod migrate;
mod progress_repo;
mod question_repo;
mod session_repo;
mod submission_repo;

/// `SQLite` backend scoped to one user's questionnaire.
#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
    user_id: UserId,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SqliteInitError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl SqliteRepository {
    /// Connect to `SQLite` using the given URL.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the connection cannot be established or if
    /// enforcing foreign key constraints fails during setup.
    pub async fn connect(database_url: &str, user_id: UserId) -> Result<Self, SqliteInitError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    sqlx::query("PRAGMA foreign_keys = ON;")
                        .execute(&mut *conn)
                        .await?;
                    sqlx::query("PRAGMA journal_mode = WAL;")
                        .execute(&mut *conn)
                        .await?;
                    sqlx::query("PRAGMA busy_timeout = 5000;")
                        .execute(&mut *conn)
                        .await?;
                    Ok(())
                })
            })
            .connect(database_url)
            .await?;
        Ok(Self { pool, user_id })
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// The same database, scoped to another user.
    #[must_use]
    pub fn for_user(&self, user_id: UserId) -> Self {
        Self {
            pool: self.pool.clone(),
            user_id,
        }
    }

    /// Create tables if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if migration queries fail.
    pub async fn migrate(&self) -> Result<(), SqliteInitError> {
        migrate::run_migrations(&self.pool).await
    }

    fn user_i64(&self) -> Result<i64, crate::repository::StorageError> {
        mapping::id_i64("user_id", self.user_id.value())
    }
}

impl Storage {
    /// Build a `Storage` backed by `SQLite` for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if connection or migrations cannot be
    /// completed.
    pub async fn sqlite(database_url: &str, user_id: UserId) -> Result<Self, SqliteInitError> {
        let repo = SqliteRepository::connect(database_url, user_id).await?;
        repo.migrate().await?;
        let questions: Arc<dyn QuestionRepository> = Arc::new(repo.clone());
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo.clone());
        let submissions: Arc<dyn SubmissionRepository> = Arc::new(repo.clone());
        let session: Arc<dyn SessionGateway> = Arc::new(repo);
        Ok(Self {
            questions,
            progress,
            submissions,
            session,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SqliteRepository>();
    }
}
