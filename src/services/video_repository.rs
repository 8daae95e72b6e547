//! src/services/video_repository.rs
//!
//! VideoRepository — reads and updates video records in SQLite. Upload
//! handlers only ever touch the URL fields; creating records is exposed for
//! seeding and tests.

use crate::models::video::Video;
use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Bundled schema, applied by `--migrate` and by tests.
const SCHEMA: &str = include_str!("../../migrations/0001_init.sql");

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("video `{0}` not found")]
    VideoNotFound(Uuid),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Clone)]
pub struct VideoRepository {
    /// Shared SQLite connection pool used for metadata operations.
    pub db: Arc<SqlitePool>,
}

impl VideoRepository {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// Fetch a video record by id.
    ///
    /// Returns VideoNotFound if the row is missing.
    pub async fn get_video(&self, id: Uuid) -> RepoResult<Video> {
        sqlx::query_as::<_, Video>(
            "SELECT id, created_at, updated_at, title, description,
                    thumbnail_url, video_url, user_id
             FROM videos WHERE id = ?",
        )
        .bind(id)
        .fetch_one(&*self.db)
        .await
        .map_err(|err| match err {
            sqlx::Error::RowNotFound => RepoError::VideoNotFound(id),
            other => RepoError::Sqlx(other),
        })
    }

    /// Persist the mutable fields of `video` and bump `updated_at`.
    ///
    /// Returns the record as stored.
    pub async fn update_video(&self, video: &Video) -> RepoResult<Video> {
        let mut updated = video.clone();
        updated.updated_at = Utc::now();

        let result = sqlx::query(
            "UPDATE videos
             SET title = ?, description = ?, thumbnail_url = ?, video_url = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&video.title)
        .bind(&video.description)
        .bind(&video.thumbnail_url)
        .bind(&video.video_url)
        .bind(updated.updated_at)
        .bind(video.id)
        .execute(&*self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepoError::VideoNotFound(video.id));
        }
        Ok(updated)
    }

    /// Insert a fresh video record with no media attached.
    pub async fn create_video(
        &self,
        user_id: Uuid,
        title: &str,
        description: &str,
    ) -> RepoResult<Video> {
        let now = Utc::now();
        let video = Video {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            title: title.to_string(),
            description: description.to_string(),
            thumbnail_url: None,
            video_url: None,
            user_id,
        };

        sqlx::query(
            "INSERT INTO videos (id, created_at, updated_at, title, description, user_id)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(video.id)
        .bind(video.created_at)
        .bind(video.updated_at)
        .bind(&video.title)
        .bind(&video.description)
        .bind(video.user_id)
        .execute(&*self.db)
        .await?;

        Ok(video)
    }

    /// Lightweight connectivity check used by the readiness probe.
    pub async fn ping(&self) -> RepoResult<()> {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&*self.db)
            .await?;
        Ok(())
    }
}

/// Apply the bundled schema statement by statement.
pub async fn migrate(db: &SqlitePool) -> RepoResult<()> {
    let statements = SCHEMA
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>();

    tracing::info!("Running {} migration statements...", statements.len());

    for stmt in statements {
        tracing::debug!("Executing migration SQL: {}", stmt);
        sqlx::query(stmt).execute(db).await?;
    }
    Ok(())
}
