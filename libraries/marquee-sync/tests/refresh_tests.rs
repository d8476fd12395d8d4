//! End-to-end tests of the refresh pipeline against fakes and real SQLite


use chrono::Duration;
use marquee_core::types::*;
use marquee_core::Clock;
use marquee_federation::ValidationError;
use marquee_storage::playlists;
use marquee_sync::{RefreshOutcome, SyncError};
use serde_json::json;
use test_helpers::*;

fn element_links(count: usize) -> Vec<serde_json::Value> {
    (1..=count).map(|n| json!(element_url(n))).collect()
}

fn stored_set(elements: &[PlaylistElement]) -> Vec<(String, i32, VideoId)> {
    elements
        .iter()
        .map(|e| (e.url.clone(), e.position, e.video_id))
        .collect()
}

// ============================================================================
// Staleness
// ============================================================================

mod staleness {
    use super::*;

    #[tokio::test]
    async fn test_fresh_playlist_is_not_fetched() {
        let h = Harness::new().await;
        let playlist = h
            .seed_playlist(h.clock.now() - Duration::hours(1), &[])
            .await;

        let outcome = h.refresher.refresh_if_needed(playlist.id).await.unwrap();

        assert_eq!(outcome, RefreshOutcome::Unchanged(playlist));
        assert!(h.fetcher.requests().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_playlist_id() {
        let h = Harness::new().await;

        let result = h.refresher.refresh_if_needed(4242).await;

        assert!(matches!(result, Err(SyncError::PlaylistNotFound(4242))));
    }

    #[tokio::test]
    async fn test_concurrent_refreshes_fetch_once() {
        let h = Harness::new().await;
        let v1 = h.add_video("v1").await;
        let playlist = h.seed_stale_playlist(&[v1]).await;

        h.fetcher
            .respond(PLAYLIST_URL, manifest_with_items("Road trip", element_links(1)));
        h.serve_element(1, "v1", Some(1));

        let (first, second) = tokio::join!(
            h.refresher.refresh_if_needed(playlist.id),
            h.refresher.refresh_if_needed(playlist.id)
        );

        let outcomes = [first.unwrap(), second.unwrap()];
        let refreshed = outcomes
            .iter()
            .filter(|o| matches!(o, RefreshOutcome::Refreshed(_)))
            .count();
        let unchanged = outcomes
            .iter()
            .filter(|o| matches!(o, RefreshOutcome::Unchanged(_)))
            .count();

        assert_eq!(refreshed, 1);
        assert_eq!(unchanged, 1);
        assert_eq!(h.fetcher.request_count(PLAYLIST_URL), 1);
        assert!(h.refresher.locks().is_empty());
    }
}

// ============================================================================
// Successful refresh
// ============================================================================

mod refreshed {
    use super::*;

    #[tokio::test]
    async fn test_three_items_replace_elements_in_order() {
        let h = Harness::new().await;
        let old = h.add_video("old").await;
        let v1 = h.add_video("v1").await;
        let v2 = h.add_video("v2").await;
        let v3 = h.add_video("v3").await;
        let playlist = h.seed_stale_playlist(&[old]).await;

        h.fetcher
            .respond(PLAYLIST_URL, manifest_with_items("Road trip", element_links(3)));
        h.serve_element(1, "v1", Some(1));
        h.serve_element(2, "v2", Some(2));
        h.serve_element(3, "v3", Some(3));

        let outcome = h.refresher.refresh_if_needed(playlist.id).await.unwrap();

        let RefreshOutcome::Refreshed(updated) = outcome else {
            panic!("expected a refresh, got {outcome:?}");
        };
        assert_eq!(updated.id, playlist.id);
        assert_eq!(updated.uuid, PLAYLIST_UUID);
        assert_eq!(updated.name, "Road trip");
        assert_eq!(updated.description.as_deref(), Some("Songs for the car"));
        assert_eq!(updated.last_refreshed_at, h.clock.now());

        let elements = h.elements(playlist.id).await;
        assert_eq!(
            stored_set(&elements),
            vec![
                (element_url(1), 1, v1),
                (element_url(2), 2, v2),
                (element_url(3), 3, v3),
            ]
        );
        assert!(h
            .videos
            .hints()
            .iter()
            .all(|hint| *hint == VideoFetchHint::OnlyVideo));
    }

    #[tokio::test]
    async fn test_failed_item_is_dropped_and_others_keep_positions() {
        let h = Harness::new().await;
        let v1 = h.add_video("v1").await;
        let v3 = h.add_video("v3").await;
        let playlist = h.seed_stale_playlist(&[]).await;

        h.fetcher
            .respond(PLAYLIST_URL, manifest_with_items("Road trip", element_links(3)));
        h.serve_element(1, "v1", Some(1));
        // Nobody knows v2
        h.serve_element(2, "v2", Some(2));
        h.serve_element(3, "v3", Some(3));

        let outcome = h.refresher.refresh_if_needed(playlist.id).await.unwrap();
        assert!(matches!(outcome, RefreshOutcome::Refreshed(_)));

        let elements = h.elements(playlist.id).await;
        assert_eq!(
            stored_set(&elements),
            vec![(element_url(1), 1, v1), (element_url(3), 3, v3)]
        );
    }

    #[tokio::test]
    async fn test_missing_positions_use_collection_order() {
        let h = Harness::new().await;
        let v1 = h.add_video("v1").await;
        let v2 = h.add_video("v2").await;
        let playlist = h.seed_stale_playlist(&[]).await;

        h.fetcher
            .respond(PLAYLIST_URL, manifest_with_items("Road trip", element_links(2)));
        h.serve_element(1, "v1", None);
        h.serve_element(2, "v2", None);

        h.refresher.refresh_if_needed(playlist.id).await.unwrap();

        let positions: Vec<(i32, VideoId)> = h
            .elements(playlist.id)
            .await
            .iter()
            .map(|e| (e.position, e.video_id))
            .collect();
        assert_eq!(positions, vec![(1, v1), (2, v2)]);
    }

    #[tokio::test]
    async fn test_declared_values_fill_in_missing_fields() {
        let h = Harness::new().await;
        let v1 = h.add_video("v1").await;
        let playlist = h.seed_stale_playlist(&[]).await;

        let items = vec![json!({
            "id": element_url(1),
            "position": 4,
            "startTimestamp": 15,
        })];
        h.fetcher
            .respond(PLAYLIST_URL, manifest_with_items("Road trip", items));
        h.serve_element(1, "v1", None);

        h.refresher.refresh_if_needed(playlist.id).await.unwrap();

        let elements = h.elements(playlist.id).await;
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].position, 4);
        assert_eq!(elements[0].start_timestamp, Some(15));
        assert_eq!(elements[0].stop_timestamp, None);
        assert_eq!(elements[0].video_id, v1);
    }

    #[tokio::test]
    async fn test_element_claiming_another_host_is_dropped() {
        let h = Harness::new().await;
        h.add_video("v1").await;
        let v2 = h.add_video("v2").await;
        let playlist = h.seed_stale_playlist(&[]).await;

        h.fetcher
            .respond(PLAYLIST_URL, manifest_with_items("Road trip", element_links(2)));
        let mut spoofed = element_json(1, "v1", Some(1));
        spoofed["id"] = json!("https://elsewhere.example/video-playlists/road-trip/elements/1");
        h.fetcher.respond(&element_url(1), spoofed);
        h.serve_element(2, "v2", Some(2));

        h.refresher.refresh_if_needed(playlist.id).await.unwrap();

        let elements = h.elements(playlist.id).await;
        assert_eq!(stored_set(&elements), vec![(element_url(2), 2, v2)]);
    }

    #[tokio::test]
    async fn test_refresh_is_idempotent() {
        let h = Harness::new().await;
        h.add_video("v1").await;
        h.add_video("v2").await;
        let playlist = h.seed_stale_playlist(&[]).await;

        h.fetcher
            .respond(PLAYLIST_URL, manifest_with_items("Road trip", element_links(2)));
        h.serve_element(1, "v1", Some(1));
        h.serve_element(2, "v2", Some(2));

        h.refresher.refresh_if_needed(playlist.id).await.unwrap();
        let first = h.playlist(playlist.id).await.unwrap();
        let first_elements = stored_set(&h.elements(playlist.id).await);

        h.clock.advance(Duration::hours(3));
        let outcome = h.refresher.refresh_if_needed(playlist.id).await.unwrap();
        assert!(matches!(outcome, RefreshOutcome::Refreshed(_)));

        let second = h.playlist(playlist.id).await.unwrap();
        assert_eq!(stored_set(&h.elements(playlist.id).await), first_elements);
        assert_eq!(
            Playlist {
                last_refreshed_at: first.last_refreshed_at,
                ..second.clone()
            },
            first
        );
        assert_eq!(second.last_refreshed_at, h.clock.now());
    }

    #[tokio::test]
    async fn test_element_fetches_stay_within_concurrency_bound() {
        let h = Harness::build(
            FakeFetcher::with_delay(std::time::Duration::from_millis(20)),
            |config| config.element_concurrency = 3,
        )
        .await;
        for n in 1..=10 {
            h.add_video(&format!("v{n}")).await;
            h.serve_element(n, &format!("v{n}"), Some(n as i32));
        }
        let playlist = h.seed_stale_playlist(&[]).await;
        h.fetcher
            .respond(PLAYLIST_URL, manifest_with_items("Road trip", element_links(10)));

        h.refresher.refresh_if_needed(playlist.id).await.unwrap();

        assert_eq!(h.elements(playlist.id).await.len(), 10);
        let peak = h.fetcher.max_in_flight();
        assert!(peak <= 3, "{peak} element fetches in flight");
        assert!(peak >= 2, "element fetches never overlapped");
    }

    #[tokio::test]
    async fn test_page_ceiling_keeps_gathered_items() {
        let h = Harness::build(FakeFetcher::new(), |config| config.max_pages = 3).await;
        for n in 1..=5 {
            h.add_video(&format!("v{n}")).await;
            h.serve_element(n, &format!("v{n}"), Some(n as i32));
            h.fetcher.respond(
                &page_url(n),
                page_json(n, vec![json!(element_url(n))], Some(page_url(n + 1))),
            );
        }
        let playlist = h.seed_stale_playlist(&[]).await;
        h.fetcher
            .respond(PLAYLIST_URL, manifest_with_first("Road trip", &page_url(1)));

        let outcome = h.refresher.refresh_if_needed(playlist.id).await.unwrap();
        assert!(matches!(outcome, RefreshOutcome::Refreshed(_)));

        // The manifest is the first of the three pages
        assert_eq!(h.fetcher.request_count(&page_url(1)), 1);
        assert_eq!(h.fetcher.request_count(&page_url(2)), 1);
        assert_eq!(h.fetcher.request_count(&page_url(3)), 0);

        let positions: Vec<i32> = h
            .elements(playlist.id)
            .await
            .iter()
            .map(|e| e.position)
            .collect();
        assert_eq!(positions, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_cyclic_collection_stores_each_element_once() {
        let h = Harness::new().await;
        let v1 = h.add_video("v1").await;
        let v2 = h.add_video("v2").await;
        h.serve_element(1, "v1", None);
        h.serve_element(2, "v2", None);
        h.fetcher.respond(
            &page_url(1),
            page_json(1, vec![json!(element_url(1))], Some(page_url(2))),
        );
        h.fetcher.respond(
            &page_url(2),
            page_json(2, vec![json!(element_url(2))], Some(page_url(1))),
        );
        let playlist = h.seed_stale_playlist(&[]).await;
        h.fetcher
            .respond(PLAYLIST_URL, manifest_with_first("Road trip", &page_url(1)));

        let outcome = h.refresher.refresh_if_needed(playlist.id).await.unwrap();
        assert!(matches!(outcome, RefreshOutcome::Refreshed(_)));

        assert_eq!(h.fetcher.request_count(&page_url(1)), 1);
        assert_eq!(
            stored_set(&h.elements(playlist.id).await),
            vec![(element_url(1), 1, v1), (element_url(2), 2, v2)]
        );
    }

    #[tokio::test]
    async fn test_broken_page_truncates_crawl() {
        let h = Harness::new().await;
        h.add_video("v1").await;
        h.serve_element(1, "v1", Some(1));
        h.fetcher.respond(
            &page_url(1),
            page_json(1, vec![json!(element_url(1))], Some(page_url(2))),
        );
        h.fetcher.respond_status(&page_url(2), 503, json!({}));
        let playlist = h.seed_stale_playlist(&[]).await;
        h.fetcher
            .respond(PLAYLIST_URL, manifest_with_first("Road trip", &page_url(1)));

        let outcome = h.refresher.refresh_if_needed(playlist.id).await.unwrap();

        assert!(matches!(outcome, RefreshOutcome::Refreshed(_)));
        assert_eq!(h.elements(playlist.id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_collection_updates_metadata_only() {
        let h = Harness::new().await;
        let old = h.add_video("old").await;
        let playlist = h.seed_stale_playlist(&[old]).await;

        let mut manifest = manifest_json("Renamed");
        manifest["icon"] = json!({ "type": "Image", "url": ICON_URL });
        h.fetcher.respond(PLAYLIST_URL, manifest);

        let outcome = h.refresher.refresh_if_needed(playlist.id).await.unwrap();

        let RefreshOutcome::Refreshed(updated) = outcome else {
            panic!("expected a refresh, got {outcome:?}");
        };
        assert_eq!(updated.name, "Renamed");
        assert!(h.elements(playlist.id).await.is_empty());
        assert!(h.images.calls().is_empty());
    }
}

// ============================================================================
// Remote failures
// ============================================================================

mod remote_failures {
    use super::*;

    #[tokio::test]
    async fn test_gone_playlist_is_deleted() {
        let h = Harness::new().await;
        let v1 = h.add_video("v1").await;
        let playlist = h.seed_stale_playlist(&[v1]).await;
        // No route: the fetcher answers 404

        let outcome = h.refresher.refresh_if_needed(playlist.id).await.unwrap();

        assert_eq!(
            outcome,
            RefreshOutcome::Deleted {
                id: playlist.id,
                url: PLAYLIST_URL.to_string(),
            }
        );
        assert!(h.playlist(playlist.id).await.is_none());
        assert!(h.elements(playlist.id).await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_manifest_keeps_elements_and_advances_check() {
        let h = Harness::new().await;
        let v1 = h.add_video("v1").await;
        let playlist = h.seed_stale_playlist(&[v1]).await;

        let mut manifest = manifest_json("Road trip");
        manifest["type"] = json!("Video");
        h.fetcher.respond(PLAYLIST_URL, manifest);

        let outcome = h.refresher.refresh_if_needed(playlist.id).await.unwrap();

        let RefreshOutcome::Unchanged(kept) = outcome else {
            panic!("expected the playlist to be kept, got {outcome:?}");
        };
        assert_eq!(kept.name, "Old name");
        assert_eq!(kept.last_refreshed_at, h.clock.now());

        let stored = h.playlist(playlist.id).await.unwrap();
        assert_eq!(stored.last_refreshed_at, h.clock.now());
        assert_eq!(stored.name, "Old name");
        assert_eq!(h.elements(playlist.id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_undecodable_body_keeps_content() {
        let h = Harness::new().await;
        let v1 = h.add_video("v1").await;
        let playlist = h.seed_stale_playlist(&[v1]).await;
        h.fetcher.respond_garbage(PLAYLIST_URL);

        let outcome = h.refresher.refresh_if_needed(playlist.id).await.unwrap();

        assert!(matches!(outcome, RefreshOutcome::Unchanged(_)));
        assert_eq!(h.elements(playlist.id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_server_error_keeps_content() {
        let h = Harness::new().await;
        let v1 = h.add_video("v1").await;
        let playlist = h.seed_stale_playlist(&[v1]).await;
        h.fetcher.respond_status(PLAYLIST_URL, 500, json!({}));

        let outcome = h.refresher.refresh_if_needed(playlist.id).await.unwrap();

        assert!(matches!(outcome, RefreshOutcome::Unchanged(_)));
        let stored = h.playlist(playlist.id).await.unwrap();
        assert_eq!(stored.last_refreshed_at, h.clock.now());
        assert_eq!(h.elements(playlist.id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_manifest_from_other_host_keeps_content() {
        let h = Harness::new().await;
        let v1 = h.add_video("v1").await;
        let playlist = h.seed_stale_playlist(&[v1]).await;

        let mut manifest = manifest_json("Hijacked");
        manifest["id"] = json!("https://elsewhere.example/video-playlists/road-trip");
        h.fetcher.respond(PLAYLIST_URL, manifest);

        let outcome = h.refresher.refresh_if_needed(playlist.id).await.unwrap();

        assert!(matches!(outcome, RefreshOutcome::Unchanged(_)));
        assert_eq!(h.playlist(playlist.id).await.unwrap().name, "Old name");
    }

    #[tokio::test]
    async fn test_manifest_with_other_identifier_keeps_content() {
        let h = Harness::new().await;
        let playlist = h.seed_stale_playlist(&[]).await;

        let mut manifest = manifest_json("Moved");
        manifest["id"] = json!("https://remote.example/video-playlists/another");
        h.fetcher.respond(PLAYLIST_URL, manifest);

        let outcome = h.refresher.refresh_if_needed(playlist.id).await.unwrap();

        assert!(matches!(outcome, RefreshOutcome::Unchanged(_)));
        assert!(playlists::get_by_url(&h.pool, "https://remote.example/video-playlists/another")
            .await
            .unwrap()
            .is_none());
    }
}

// ============================================================================
// Channel attribution
// ============================================================================

mod attribution {
    use super::*;

    #[tokio::test]
    async fn test_single_channel_takes_ownership() {
        let h = Harness::new().await;
        let channel = h.add_channel().await;
        let playlist = h.seed_stale_playlist(&[]).await;

        let mut manifest = manifest_json("Road trip");
        manifest["attributedTo"] = json!([CHANNEL_URL]);
        h.fetcher.respond(PLAYLIST_URL, manifest);

        let RefreshOutcome::Refreshed(updated) =
            h.refresher.refresh_if_needed(playlist.id).await.unwrap()
        else {
            panic!("expected a refresh");
        };

        assert_eq!(updated.channel_id, Some(channel.id));
        assert_eq!(updated.owner_account_id, channel.account_id);
    }

    #[tokio::test]
    async fn test_ambiguous_attribution_stays_account_owned() {
        let h = Harness::new().await;
        h.add_channel().await;
        let playlist = h.seed_stale_playlist(&[]).await;

        let mut manifest = manifest_json("Road trip");
        manifest["attributedTo"] = json!([CHANNEL_URL, "https://remote.example/video-channels/other"]);
        h.fetcher.respond(PLAYLIST_URL, manifest);

        let RefreshOutcome::Refreshed(updated) =
            h.refresher.refresh_if_needed(playlist.id).await.unwrap()
        else {
            panic!("expected a refresh");
        };

        assert_eq!(updated.channel_id, None);
        assert_eq!(updated.owner_account_id, h.owner);
    }

    #[tokio::test]
    async fn test_unresolvable_actor_stays_account_owned() {
        let h = Harness::new().await;
        let playlist = h.seed_stale_playlist(&[]).await;

        let mut manifest = manifest_json("Road trip");
        manifest["attributedTo"] = json!([CHANNEL_URL]);
        h.fetcher.respond(PLAYLIST_URL, manifest);

        let RefreshOutcome::Refreshed(updated) =
            h.refresher.refresh_if_needed(playlist.id).await.unwrap()
        else {
            panic!("expected a refresh");
        };

        assert_eq!(updated.channel_id, None);
        assert_eq!(updated.owner_account_id, h.owner);
    }

    #[tokio::test]
    async fn test_malformed_actor_does_not_block_refresh() {
        let h = Harness::new().await;
        h.add_channel().await;
        let old = h.add_video("old").await;
        let v1 = h.add_video("v1").await;
        h.serve_element(1, "v1", Some(1));
        let playlist = h.seed_stale_playlist(&[old]).await;

        let mut manifest = manifest_with_items("Road trip", element_links(1));
        manifest["attributedTo"] = json!([CHANNEL_URL, "acct:bob@remote.example"]);
        h.fetcher.respond(PLAYLIST_URL, manifest);

        let RefreshOutcome::Refreshed(updated) =
            h.refresher.refresh_if_needed(playlist.id).await.unwrap()
        else {
            panic!("expected a refresh");
        };

        assert_eq!(updated.name, "Road trip");
        assert_eq!(updated.channel_id, None);
        assert_eq!(updated.owner_account_id, h.owner);

        let videos: Vec<VideoId> = h
            .elements(playlist.id)
            .await
            .iter()
            .map(|e| e.video_id)
            .collect();
        assert_eq!(videos, vec![v1]);
    }

    #[tokio::test]
    async fn test_only_malformed_actor_stays_account_owned() {
        let h = Harness::new().await;
        h.add_channel().await;
        let playlist = h.seed_stale_playlist(&[]).await;

        let mut manifest = manifest_json("Road trip");
        manifest["attributedTo"] = json!(["acct:bob@remote.example"]);
        h.fetcher.respond(PLAYLIST_URL, manifest);

        let RefreshOutcome::Refreshed(updated) =
            h.refresher.refresh_if_needed(playlist.id).await.unwrap()
        else {
            panic!("expected a refresh");
        };

        assert_eq!(updated.name, "Road trip");
        assert_eq!(updated.channel_id, None);
        assert_eq!(updated.owner_account_id, h.owner);
    }
}

// ============================================================================
// Thumbnails
// ============================================================================

mod thumbnails {
    use super::*;

    fn manifest_with_icon(items: usize) -> serde_json::Value {
        let mut manifest = manifest_with_items("Road trip", element_links(items));
        manifest["icon"] = json!({
            "type": "Image",
            "url": ICON_URL,
            "mediaType": "image/jpeg",
            "width": 280,
            "height": 157
        });
        manifest
    }

    #[tokio::test]
    async fn test_icon_is_fetched_for_non_empty_playlist() {
        let h = Harness::new().await;
        h.add_video("v1").await;
        h.serve_element(1, "v1", Some(1));
        let playlist = h.seed_stale_playlist(&[]).await;
        h.fetcher.respond(PLAYLIST_URL, manifest_with_icon(1));

        let RefreshOutcome::Refreshed(updated) =
            h.refresher.refresh_if_needed(playlist.id).await.unwrap()
        else {
            panic!("expected a refresh");
        };

        let expected_name = format!("{PLAYLIST_UUID}.jpg");
        let calls = h.images.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, ICON_URL);
        assert_eq!(calls[0].1, expected_name);
        assert_eq!((calls[0].2.width, calls[0].2.height), (280, 157));

        assert_eq!(updated.thumbnail_filename.as_deref(), Some(expected_name.as_str()));
        let stored = h.playlist(playlist.id).await.unwrap();
        assert_eq!(stored.thumbnail_filename, updated.thumbnail_filename);
    }

    #[tokio::test]
    async fn test_failed_icon_fetch_does_not_fail_refresh() {
        let h = Harness::new().await;
        h.add_video("v1").await;
        h.serve_element(1, "v1", Some(1));
        h.images.fail();
        let playlist = h.seed_stale_playlist(&[]).await;
        h.fetcher.respond(PLAYLIST_URL, manifest_with_icon(1));

        let RefreshOutcome::Refreshed(updated) =
            h.refresher.refresh_if_needed(playlist.id).await.unwrap()
        else {
            panic!("expected a refresh");
        };

        assert_eq!(updated.thumbnail_filename, None);
        assert_eq!(h.elements(playlist.id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_relative_icon_is_fetched_from_playlist_host() {
        let h = Harness::new().await;
        let old = h.add_video("old").await;
        let v1 = h.add_video("v1").await;
        h.serve_element(1, "v1", Some(1));
        let playlist = h.seed_stale_playlist(&[old]).await;

        let mut manifest = manifest_with_icon(1);
        manifest["icon"]["url"] = json!("/static/thumbnails/road-trip.jpg");
        h.fetcher.respond(PLAYLIST_URL, manifest);

        let outcome = h.refresher.refresh_if_needed(playlist.id).await.unwrap();
        assert!(matches!(outcome, RefreshOutcome::Refreshed(_)));

        let elements = h.elements(playlist.id).await;
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].video_id, v1);

        let calls = h.images.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, ICON_URL);
    }

    #[tokio::test]
    async fn test_unusable_icon_is_ignored() {
        let h = Harness::new().await;
        let v1 = h.add_video("v1").await;
        h.serve_element(1, "v1", Some(1));
        let playlist = h.seed_stale_playlist(&[]).await;

        let mut manifest = manifest_with_icon(1);
        manifest["icon"]["url"] = json!("ftp://remote.example/road-trip.jpg");
        h.fetcher.respond(PLAYLIST_URL, manifest);

        let RefreshOutcome::Refreshed(updated) =
            h.refresher.refresh_if_needed(playlist.id).await.unwrap()
        else {
            panic!("expected a refresh");
        };

        assert_eq!(updated.thumbnail_filename, None);
        assert!(h.images.calls().is_empty());
        assert_eq!(h.elements(playlist.id).await[0].video_id, v1);
    }

    #[tokio::test]
    async fn test_removed_icon_clears_thumbnail() {
        let h = Harness::new().await;
        h.add_video("v1").await;
        h.serve_element(1, "v1", Some(1));
        let playlist = h.seed_stale_playlist(&[]).await;
        playlists::set_thumbnail(&h.pool, playlist.id, Some("old.jpg"))
            .await
            .unwrap();
        h.fetcher
            .respond(PLAYLIST_URL, manifest_with_items("Road trip", element_links(1)));

        h.refresher.refresh_if_needed(playlist.id).await.unwrap();

        assert_eq!(h.playlist(playlist.id).await.unwrap().thumbnail_filename, None);
        assert!(h.images.calls().is_empty());
    }
}

// ============================================================================
// Import and batch refresh
// ============================================================================

mod import {
    use super::*;

    #[tokio::test]
    async fn test_import_creates_playlist() {
        let h = Harness::new().await;
        let v1 = h.add_video("v1").await;
        h.serve_element(1, "v1", Some(1));
        h.fetcher
            .respond(PLAYLIST_URL, manifest_with_items("Road trip", element_links(1)));

        let playlist = h
            .refresher
            .fetch_remote_playlist(PLAYLIST_URL, h.owner)
            .await
            .unwrap();

        assert_eq!(playlist.url, PLAYLIST_URL);
        assert_eq!(playlist.uuid, PLAYLIST_UUID);
        assert_eq!(playlist.owner_account_id, h.owner);
        assert_eq!(playlist.visibility, Visibility::Public);
        assert_eq!(playlist.last_refreshed_at, h.clock.now());
        assert_eq!(
            stored_set(&h.elements(playlist.id).await),
            vec![(element_url(1), 1, v1)]
        );
    }

    #[tokio::test]
    async fn test_import_of_known_fresh_playlist_does_not_fetch() {
        let h = Harness::new().await;
        let seeded = h
            .seed_playlist(h.clock.now() - Duration::minutes(5), &[])
            .await;

        let playlist = h
            .refresher
            .fetch_remote_playlist(PLAYLIST_URL, h.owner)
            .await
            .unwrap();

        assert_eq!(playlist, seeded);
        assert!(h.fetcher.requests().is_empty());
    }

    #[tokio::test]
    async fn test_import_reports_remote_errors() {
        let h = Harness::new().await;

        let result = h.refresher.fetch_remote_playlist(PLAYLIST_URL, h.owner).await;
        assert!(matches!(result, Err(SyncError::NotFound { .. })));

        h.fetcher.respond_status(PLAYLIST_URL, 502, json!({}));
        let result = h.refresher.fetch_remote_playlist(PLAYLIST_URL, h.owner).await;
        assert!(matches!(result, Err(SyncError::TransientFetch(_))));

        assert!(playlists::get_by_url(&h.pool, PLAYLIST_URL)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_import_rejects_invalid_url() {
        let h = Harness::new().await;

        let result = h.refresher.fetch_remote_playlist("ftp://remote.example/p", h.owner).await;

        assert!(matches!(
            result,
            Err(SyncError::Validation {
                source: ValidationError::InvalidUrl { .. },
                ..
            })
        ));
        assert!(h.fetcher.requests().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_stale_reports_outcomes() {
        let h = Harness::new().await;
        let playlist = h.seed_stale_playlist(&[]).await;
        h.fetcher
            .respond(PLAYLIST_URL, manifest_json("Road trip"));

        let report = h.refresher.refresh_stale(10).await.unwrap();
        assert_eq!(report.refreshed, 1);
        assert_eq!(report.total(), 1);

        // Nothing is stale any more
        let report = h.refresher.refresh_stale(10).await.unwrap();
        assert_eq!(report.total(), 0);

        h.fetcher.forget(PLAYLIST_URL);
        h.clock.advance(Duration::hours(3));
        let report = h.refresher.refresh_stale(10).await.unwrap();
        assert_eq!(report.deleted, 1);
        assert!(h.playlist(playlist.id).await.is_none());
    }
}
