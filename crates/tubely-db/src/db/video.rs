use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool};
use tubely_core::models::Video;
use tubely_core::AppError;
use uuid::Uuid;

const VIDEO_COLUMNS: &str =
    "id, user_id, title, description, thumbnail_url, video_url, created_at, updated_at";

/// Row shape of the `videos` table; ids are stored as text.
#[derive(sqlx::FromRow)]
struct VideoRow {
    id: String,
    user_id: String,
    title: String,
    description: String,
    thumbnail_url: Option<String>,
    video_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<VideoRow> for Video {
    type Error = AppError;

    fn try_from(row: VideoRow) -> Result<Self, Self::Error> {
        Ok(Video {
            id: Uuid::parse_str(&row.id)?,
            user_id: Uuid::parse_str(&row.user_id)?,
            title: row.title,
            description: row.description,
            thumbnail_url: row.thumbnail_url,
            video_url: row.video_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for video records
#[derive(Clone)]
pub struct VideoRepository {
    pool: SqlitePool,
}

impl VideoRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a draft record with no video or thumbnail yet.
    #[tracing::instrument(skip(self, description), fields(db.table = "videos", db.operation = "insert"))]
    pub async fn create(
        &self,
        user_id: Uuid,
        title: &str,
        description: &str,
    ) -> Result<Video, AppError> {
        let now = Utc::now();
        let video = Video {
            id: Uuid::new_v4(),
            user_id,
            title: title.to_string(),
            description: description.to_string(),
            thumbnail_url: None,
            video_url: None,
            created_at: now,
            updated_at: now,
        };

        sqlx::query::<Sqlite>(
            r#"
            INSERT INTO videos (id, user_id, title, description, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(video.id.to_string())
        .bind(video.user_id.to_string())
        .bind(&video.title)
        .bind(&video.description)
        .bind(video.created_at)
        .bind(video.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(video)
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select", db.record_id = %id))]
    pub async fn get(&self, id: Uuid) -> Result<Option<Video>, AppError> {
        let row = sqlx::query_as::<Sqlite, VideoRow>(&format!(
            "SELECT {} FROM videos WHERE id = ?",
            VIDEO_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Video::try_from).transpose()
    }

    /// All records owned by `user_id`, newest first.
    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select"))]
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Video>, AppError> {
        let rows = sqlx::query_as::<Sqlite, VideoRow>(&format!(
            "SELECT {} FROM videos WHERE user_id = ? ORDER BY created_at DESC",
            VIDEO_COLUMNS
        ))
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Video::try_from).collect()
    }

    /// Store the unsigned storage key of a committed upload.
    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "update", db.record_id = %id))]
    pub async fn set_video_url(&self, id: Uuid, storage_key: &str) -> Result<Video, AppError> {
        self.update_column(id, "video_url", storage_key).await
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "update", db.record_id = %id))]
    pub async fn set_thumbnail_url(&self, id: Uuid, url: &str) -> Result<Video, AppError> {
        self.update_column(id, "thumbnail_url", url).await
    }

    /// Round-trip to the database, for health checks.
    pub async fn ping(&self) -> Result<(), AppError> {
        sqlx::query::<Sqlite>("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn update_column(
        &self,
        id: Uuid,
        column: &'static str,
        value: &str,
    ) -> Result<Video, AppError> {
        let result = sqlx::query::<Sqlite>(&format!(
            "UPDATE videos SET {} = ?, updated_at = ? WHERE id = ?",
            column
        ))
        .bind(value)
        .bind(Utc::now())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Couldn't find video".to_string()));
        }

        self.get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Couldn't find video".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect;

    async fn repository() -> VideoRepository {
        let pool = connect("sqlite::memory:", 1).await.unwrap();
        VideoRepository::new(pool)
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = repository().await;
        let user_id = Uuid::new_v4();

        let created = repo.create(user_id, "Boots", "A pair of boots").await.unwrap();
        let fetched = repo.get(created.id).await.unwrap().unwrap();

        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.user_id, user_id);
        assert_eq!(fetched.title, "Boots");
        assert_eq!(fetched.description, "A pair of boots");
        assert!(fetched.video_url.is_none());
        assert!(fetched.thumbnail_url.is_none());
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let repo = repository().await;
        assert!(repo.get(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_video_url_stores_key() {
        let repo = repository().await;
        let video = repo.create(Uuid::new_v4(), "Clip", "").await.unwrap();

        let updated = repo
            .set_video_url(video.id, "landscape/0123456789abcdef0123456789abcdef.mp4")
            .await
            .unwrap();

        assert_eq!(
            updated.video_url.as_deref(),
            Some("landscape/0123456789abcdef0123456789abcdef.mp4")
        );
        assert!(updated.updated_at >= video.updated_at);
    }

    #[tokio::test]
    async fn test_set_thumbnail_url() {
        let repo = repository().await;
        let video = repo.create(Uuid::new_v4(), "Clip", "").await.unwrap();
        let url = format!("/api/thumbnails/{}", video.id);

        let updated = repo.set_thumbnail_url(video.id, &url).await.unwrap();
        assert_eq!(updated.thumbnail_url, Some(url));
    }

    #[tokio::test]
    async fn test_update_missing_record_is_not_found() {
        let repo = repository().await;
        let result = repo.set_video_url(Uuid::new_v4(), "other/x.mp4").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_for_user_is_scoped() {
        let repo = repository().await;
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        repo.create(alice, "first", "").await.unwrap();
        repo.create(alice, "second", "").await.unwrap();
        repo.create(bob, "other", "").await.unwrap();

        let videos = repo.list_for_user(alice).await.unwrap();
        assert_eq!(videos.len(), 2);
        assert!(videos.iter().all(|v| v.user_id == alice));
    }
}
