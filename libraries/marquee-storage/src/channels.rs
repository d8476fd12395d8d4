use chrono::Utc;
use marquee_core::{error::Result, types::*};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

fn channel_from_row(row: &SqliteRow) -> Channel {
    Channel {
        id: row.get("id"),
        url: row.get("url"),
        display_name: row.get("display_name"),
        account_id: row.get("account_id"),
    }
}

/// Create a channel owned by an existing account
pub async fn create(pool: &SqlitePool, channel: CreateChannel) -> Result<Channel> {
    let now = Utc::now().timestamp_millis();

    let result = sqlx::query(
        "INSERT INTO channels (url, display_name, account_id, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&channel.url)
    .bind(&channel.display_name)
    .bind(channel.account_id)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(Channel {
        id: result.last_insert_rowid(),
        url: channel.url,
        display_name: channel.display_name,
        account_id: channel.account_id,
    })
}

/// Get channel by ID
pub async fn get_by_id(pool: &SqlitePool, id: ChannelId) -> Result<Option<Channel>> {
    let row = sqlx::query("SELECT id, url, display_name, account_id FROM channels WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row.as_ref().map(channel_from_row))
}

/// Get channel by actor URL
pub async fn get_by_url(pool: &SqlitePool, url: &str) -> Result<Option<Channel>> {
    let row = sqlx::query("SELECT id, url, display_name, account_id FROM channels WHERE url = ?")
        .bind(url)
        .fetch_optional(pool)
        .await?;

    Ok(row.as_ref().map(channel_from_row))
}
