//! Common test utilities and fixtures
#![allow(dead_code)]

use image::{ImageFormat, Rgb, RgbImage};
use marquee_core::types::*;
use sqlx::SqlitePool;
use std::io::Cursor;
use tempfile::TempDir;

/// Create a test database with migrations applied
///
/// The returned directory owns the database file; keep it alive.
pub async fn create_test_database() -> (SqlitePool, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_url = format!("sqlite://{}", temp_dir.path().join("test.db").display());

    let pool = marquee_storage::create_pool(&db_url)
        .await
        .expect("Failed to create pool");
    marquee_storage::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    (pool, temp_dir)
}

pub async fn create_account(pool: &SqlitePool, url: &str) -> Account {
    marquee_storage::accounts::create(
        pool,
        CreateAccount {
            url: url.to_string(),
            display_name: "alice".to_string(),
        },
    )
    .await
    .expect("Failed to create account")
}

pub async fn create_video(pool: &SqlitePool, url: &str) -> Video {
    marquee_storage::videos::create(
        pool,
        CreateVideo {
            uuid: uuid::Uuid::new_v4().to_string(),
            url: url.to_string(),
            name: "Sunset over the dunes".to_string(),
            channel_id: None,
        },
    )
    .await
    .expect("Failed to create video")
}

/// PNG-encoded gradient of the given size
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });

    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, ImageFormat::Png)
        .expect("Failed to encode PNG");
    bytes.into_inner()
}
