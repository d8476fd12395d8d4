use chrono::Utc;
use marquee_core::{error::Result, types::*};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

fn video_from_row(row: &SqliteRow) -> Video {
    Video {
        id: row.get("id"),
        uuid: row.get("uuid"),
        url: row.get("url"),
        name: row.get("name"),
        channel_id: row.get("channel_id"),
    }
}

/// Create a video
pub async fn create(pool: &SqlitePool, video: CreateVideo) -> Result<Video> {
    let now = Utc::now().timestamp_millis();

    let result = sqlx::query(
        "INSERT INTO videos (uuid, url, name, channel_id, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&video.uuid)
    .bind(&video.url)
    .bind(&video.name)
    .bind(video.channel_id)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(Video {
        id: result.last_insert_rowid(),
        uuid: video.uuid,
        url: video.url,
        name: video.name,
        channel_id: video.channel_id,
    })
}

/// Get video by ID
pub async fn get_by_id(pool: &SqlitePool, id: VideoId) -> Result<Option<Video>> {
    let row = sqlx::query("SELECT id, uuid, url, name, channel_id FROM videos WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row.as_ref().map(video_from_row))
}

/// Get video by its federation URL
pub async fn get_by_url(pool: &SqlitePool, url: &str) -> Result<Option<Video>> {
    let row = sqlx::query("SELECT id, uuid, url, name, channel_id FROM videos WHERE url = ?")
        .bind(url)
        .fetch_optional(pool)
        .await?;

    Ok(row.as_ref().map(video_from_row))
}
