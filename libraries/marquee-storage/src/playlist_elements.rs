use marquee_core::{error::Result, types::*};
use sqlx::{Row, SqlitePool};

/// Elements of a playlist, ordered by position
pub async fn list(pool: &SqlitePool, playlist_id: PlaylistId) -> Result<Vec<PlaylistElement>> {
    let rows = sqlx::query(
        r#"
        SELECT id, playlist_id, url, position, start_timestamp, stop_timestamp, video_id
        FROM playlist_elements
        WHERE playlist_id = ?
        ORDER BY position, id
        "#,
    )
    .bind(playlist_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| PlaylistElement {
            id: row.get("id"),
            playlist_id: row.get("playlist_id"),
            url: row.get("url"),
            position: row.get("position"),
            start_timestamp: row.get("start_timestamp"),
            stop_timestamp: row.get("stop_timestamp"),
            video_id: row.get("video_id"),
        })
        .collect())
}

/// Number of elements in a playlist
pub async fn count(pool: &SqlitePool, playlist_id: PlaylistId) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) AS count FROM playlist_elements WHERE playlist_id = ?")
        .bind(playlist_id)
        .fetch_one(pool)
        .await?;

    Ok(row.get("count"))
}
