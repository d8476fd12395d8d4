use chrono::Utc;
use marquee_core::{error::Result, types::*};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

fn account_from_row(row: &SqliteRow) -> Account {
    Account {
        id: row.get("id"),
        url: row.get("url"),
        display_name: row.get("display_name"),
    }
}

/// Create an account
pub async fn create(pool: &SqlitePool, account: CreateAccount) -> Result<Account> {
    let now = Utc::now().timestamp_millis();

    let result = sqlx::query(
        "INSERT INTO accounts (url, display_name, created_at) VALUES (?, ?, ?)",
    )
    .bind(&account.url)
    .bind(&account.display_name)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(Account {
        id: result.last_insert_rowid(),
        url: account.url,
        display_name: account.display_name,
    })
}

/// Get account by ID
pub async fn get_by_id(pool: &SqlitePool, id: AccountId) -> Result<Option<Account>> {
    let row = sqlx::query("SELECT id, url, display_name FROM accounts WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row.as_ref().map(account_from_row))
}

/// Get account by actor URL
pub async fn get_by_url(pool: &SqlitePool, url: &str) -> Result<Option<Account>> {
    let row = sqlx::query("SELECT id, url, display_name FROM accounts WHERE url = ?")
        .bind(url)
        .fetch_optional(pool)
        .await?;

    Ok(row.as_ref().map(account_from_row))
}
