use crate::time::{from_millis, to_millis};
use crate::StorageError;
use chrono::{DateTime, Utc};
use marquee_core::{error::Result, types::*, MarqueeError};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::debug;

const PLAYLIST_COLUMNS: &str = r#"
    id, uuid, url, name, description, visibility, owner_account_id, channel_id,
    thumbnail_filename, last_refreshed_at, created_at, updated_at
"#;

fn playlist_from_row(row: &SqliteRow) -> Result<Playlist> {
    let visibility: String = row.get("visibility");

    Ok(Playlist {
        id: row.get("id"),
        uuid: row.get("uuid"),
        url: row.get("url"),
        name: row.get("name"),
        description: row.get("description"),
        visibility: Visibility::from_str(&visibility)
            .ok_or_else(|| StorageError::corrupt("visibility", &visibility))?,
        owner_account_id: row.get("owner_account_id"),
        channel_id: row.get("channel_id"),
        thumbnail_filename: row.get("thumbnail_filename"),
        last_refreshed_at: from_millis("last_refreshed_at", row.get("last_refreshed_at"))?,
        created_at: from_millis("created_at", row.get("created_at"))?,
        updated_at: from_millis("updated_at", row.get("updated_at"))?,
    })
}

/// Get playlist by ID
pub async fn get_by_id(pool: &SqlitePool, id: PlaylistId) -> Result<Option<Playlist>> {
    let row = sqlx::query(&format!("SELECT {PLAYLIST_COLUMNS} FROM playlists WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(playlist_from_row).transpose()
}

/// Get playlist by its federation URL
pub async fn get_by_url(pool: &SqlitePool, url: &str) -> Result<Option<Playlist>> {
    let row = sqlx::query(&format!("SELECT {PLAYLIST_COLUMNS} FROM playlists WHERE url = ?"))
        .bind(url)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(playlist_from_row).transpose()
}

/// Playlists last checked before `refreshed_before`, oldest first
pub async fn list_stale(
    pool: &SqlitePool,
    refreshed_before: DateTime<Utc>,
    limit: u32,
) -> Result<Vec<Playlist>> {
    let rows = sqlx::query(&format!(
        r#"
        SELECT {PLAYLIST_COLUMNS}
        FROM playlists
        WHERE last_refreshed_at < ?
        ORDER BY last_refreshed_at ASC, id ASC
        LIMIT ?
        "#
    ))
    .bind(to_millis(refreshed_before))
    .bind(i64::from(limit))
    .fetch_all(pool)
    .await?;

    rows.iter().map(playlist_from_row).collect()
}

/// Record that the remote copy was checked at `at`, leaving content untouched
pub async fn mark_refreshed(pool: &SqlitePool, id: PlaylistId, at: DateTime<Utc>) -> Result<()> {
    let result = sqlx::query("UPDATE playlists SET last_refreshed_at = ? WHERE id = ?")
        .bind(to_millis(at))
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(MarqueeError::PlaylistNotFound(id));
    }

    Ok(())
}

/// Set or clear the stored miniature file name
pub async fn set_thumbnail(
    pool: &SqlitePool,
    id: PlaylistId,
    filename: Option<&str>,
) -> Result<()> {
    let result = sqlx::query("UPDATE playlists SET thumbnail_filename = ? WHERE id = ?")
        .bind(filename)
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(MarqueeError::PlaylistNotFound(id));
    }

    Ok(())
}

/// Delete playlist (elements go with it through the foreign key cascade)
///
/// Returns `false` when no such playlist existed.
pub async fn delete(pool: &SqlitePool, id: PlaylistId) -> Result<bool> {
    let result = sqlx::query("DELETE FROM playlists WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Upsert a playlist by URL and replace its whole element set
///
/// Both steps run in one transaction, so concurrent readers observe either
/// the previous playlist state with its previous elements or the new state
/// with the new elements. The UUID and creation date of an existing row are
/// kept.
pub async fn apply_reconciliation(
    pool: &SqlitePool,
    playlist: &UpsertPlaylist,
    elements: &[CreatePlaylistElement],
) -> Result<Playlist> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query(
        r#"
        INSERT INTO playlists (
            uuid, url, name, description, visibility, owner_account_id, channel_id,
            last_refreshed_at, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(url) DO UPDATE SET
            name = excluded.name,
            description = excluded.description,
            visibility = excluded.visibility,
            owner_account_id = excluded.owner_account_id,
            channel_id = excluded.channel_id,
            last_refreshed_at = excluded.last_refreshed_at,
            updated_at = excluded.updated_at
        RETURNING id
        "#,
    )
    .bind(&playlist.uuid)
    .bind(&playlist.url)
    .bind(&playlist.name)
    .bind(&playlist.description)
    .bind(playlist.visibility.as_str())
    .bind(playlist.owner_account_id)
    .bind(playlist.channel_id)
    .bind(to_millis(playlist.refreshed_at))
    .bind(to_millis(playlist.created_at))
    .bind(to_millis(playlist.updated_at))
    .fetch_one(&mut *tx)
    .await?;

    let id: PlaylistId = row.get("id");

    let removed = sqlx::query("DELETE FROM playlist_elements WHERE playlist_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    for element in elements {
        sqlx::query(
            r#"
            INSERT INTO playlist_elements (
                playlist_id, url, position, start_timestamp, stop_timestamp, video_id
            )
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(&element.url)
        .bind(element.position)
        .bind(element.start_timestamp)
        .bind(element.stop_timestamp)
        .bind(element.video_id)
        .execute(&mut *tx)
        .await?;
    }

    let row = sqlx::query(&format!("SELECT {PLAYLIST_COLUMNS} FROM playlists WHERE id = ?"))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
    let stored = playlist_from_row(&row)?;

    tx.commit().await?;

    debug!(
        playlist_id = id,
        url = %playlist.url,
        removed,
        inserted = elements.len(),
        "Replaced playlist elements"
    );

    Ok(stored)
}
