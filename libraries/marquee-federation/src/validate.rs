//! Validation of fetched federation objects.
//!
//! Every decoder either yields a fully checked value or a `ValidationError`;
//! nothing half-populated leaves this module.

use crate::activity::{RawElement, RawItem, RawPage, RawPageRef, RawPlaylist};
use crate::error::ValidationError;
use crate::types::{
    AttributedActor, CollectionPage, ElementObject, Icon, PageRef, PlaylistManifest, RemoteItemReference,
};
use chrono::{DateTime, Utc};
use marquee_core::types::Visibility;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

type Result<T> = std::result::Result<T, ValidationError>;

/// Longest identifier accepted from a remote host
pub const MAX_URL_LENGTH: usize = 2000;

const MAX_NAME_LENGTH: usize = 120;

const PLAYLIST_TYPE: &str = "Playlist";
const ELEMENT_TYPE: &str = "PlaylistElement";
const PAGE_TYPES: [&str; 5] = [
    "OrderedCollection",
    "OrderedCollectionPage",
    "Collection",
    "CollectionPage",
    PLAYLIST_TYPE,
];

/// Whether `value` is an absolute http(s) URL with a host, within length limits
pub fn is_valid_object_url(value: &str) -> bool {
    parse_url("id", value).is_ok()
}

/// Whether `declared` lives on the host (and port) that served it
pub fn same_host(declared: &Url, fetched_from: &Url) -> bool {
    match (declared.host_str(), fetched_from.host_str()) {
        (Some(declared_host), Some(fetched_host)) => {
            declared_host.eq_ignore_ascii_case(fetched_host)
                && declared.port_or_known_default() == fetched_from.port_or_known_default()
        }
        _ => false,
    }
}

/// Structural check of a playlist body, without the origin rule
pub fn is_manifest_valid(body: &Value) -> bool {
    parse_manifest(body).is_ok()
}

/// Structural check of a playlist element body, without the origin rule
pub fn is_element_valid(body: &Value) -> bool {
    parse_element(body).is_ok()
}

/// Decode a playlist fetched from `fetched_from`
pub fn decode_manifest(body: &Value, fetched_from: &Url) -> Result<PlaylistManifest> {
    let manifest = parse_manifest(body)?;
    check_origin(&manifest.id, fetched_from)?;
    Ok(manifest)
}

/// Decode a playlist element fetched from `fetched_from`
pub fn decode_element(body: &Value, fetched_from: &Url) -> Result<ElementObject> {
    let element = parse_element(body)?;
    check_origin(&element.id, fetched_from)?;
    Ok(element)
}

/// Decode a collection page fetched from `fetched_from`
///
/// Relative `first`/`next` links are resolved against `fetched_from`.
pub fn decode_page(body: &Value, fetched_from: &Url) -> Result<CollectionPage> {
    let raw = RawPage::deserialize(body)?;
    page_from_raw(raw, fetched_from)
}

fn parse_manifest(body: &Value) -> Result<PlaylistManifest> {
    let raw = RawPlaylist::deserialize(body)?;
    expect_type(&raw.kind, PLAYLIST_TYPE)?;

    let id = parse_url("id", &raw.id)?;

    uuid::Uuid::parse_str(&raw.uuid).map_err(|_| ValidationError::InvalidUuid(raw.uuid.clone()))?;

    let name_length = raw.name.chars().count();
    if name_length == 0 || name_length > MAX_NAME_LENGTH {
        return Err(ValidationError::InvalidName(name_length));
    }

    let published = parse_date("published", &raw.published)?;
    let updated = parse_date("updated", &raw.updated)?;

    let attributed_to = raw
        .attributed_to
        .map(|actors| actors.into_vec())
        .unwrap_or_default()
        .into_iter()
        .map(|actor| {
            let actor = actor.into_id();
            match parse_url("attributedTo", &actor) {
                Ok(url) => AttributedActor::Url(url),
                Err(_) => AttributedActor::Malformed(actor),
            }
        })
        .collect();

    // Relative icon URLs are resolved against the playlist id
    let icon = raw
        .icon
        .and_then(|icons| icons.into_vec().into_iter().next())
        .and_then(|image| match resolve_link("icon", &id, &image.url) {
            Ok(url) => Some(Icon {
                url,
                media_type: image.media_type,
                width: image.width,
                height: image.height,
            }),
            Err(e) => {
                warn!(playlist = %id, error = %e, "Ignoring unusable playlist icon");
                None
            }
        });

    // The playlist is also the root of its own item collection
    let page = RawPage::deserialize(body)?;
    let total_items = page.total_items.map(|n| non_negative("totalItems", n)).transpose()?;
    let collection = page_from_raw(page, &id)?;

    Ok(PlaylistManifest {
        visibility: Visibility::from_audience(&raw.to),
        id,
        uuid: raw.uuid,
        name: raw.name,
        description: raw.content.filter(|content| !content.is_empty()),
        audience: raw.to,
        published,
        updated,
        attributed_to,
        icon,
        total_items: total_items.map(|n| n as u64),
        collection,
    })
}

fn parse_element(body: &Value) -> Result<ElementObject> {
    let raw = RawElement::deserialize(body)?;
    expect_type(&raw.kind, ELEMENT_TYPE)?;

    Ok(ElementObject {
        id: parse_url("id", &raw.id)?,
        video_url: parse_url("url", &raw.url)?,
        position: raw.position.map(|p| bounded("position", p, 1)).transpose()?,
        start_timestamp: raw
            .start_timestamp
            .map(|t| bounded("startTimestamp", t, 0))
            .transpose()?,
        stop_timestamp: raw
            .stop_timestamp
            .map(|t| bounded("stopTimestamp", t, 0))
            .transpose()?,
    })
}

fn page_from_raw(raw: RawPage, base: &Url) -> Result<CollectionPage> {
    match raw.kind.as_deref() {
        Some(kind) if PAGE_TYPES.contains(&kind) => {}
        Some(kind) => {
            return Err(ValidationError::WrongType {
                expected: "OrderedCollection",
                found: kind.to_string(),
            })
        }
        None => {
            return Err(ValidationError::WrongType {
                expected: "OrderedCollection",
                found: "nothing".to_string(),
            })
        }
    }

    let id = raw.id.as_deref().map(|id| parse_url("id", id)).transpose()?;
    if let Some(id) = &id {
        check_origin(id, base)?;
    }

    if let Some(total) = raw.total_items {
        non_negative("totalItems", total)?;
    }

    let first = match raw.first {
        Some(RawPageRef::Link(link)) => Some(PageRef::Link(resolve_link("first", base, &link)?)),
        Some(RawPageRef::Page(page)) => Some(PageRef::Embedded(Box::new(page_from_raw(*page, base)?))),
        None => None,
    };

    let next = raw
        .next
        .as_deref()
        .map(|link| resolve_link("next", base, link))
        .transpose()?;

    let entries = raw.ordered_items.or(raw.items).unwrap_or_default();
    let mut items = Vec::with_capacity(entries.len());
    let mut skipped_items = 0;

    for entry in &entries {
        match item_from_value(entry, base) {
            Ok(item) => items.push(item),
            Err(e) => {
                debug!(page = %base, error = %e, "Skipping collection item");
                skipped_items += 1;
            }
        }
    }

    Ok(CollectionPage {
        id,
        first,
        next,
        items,
        skipped_items,
    })
}

fn item_from_value(value: &Value, base: &Url) -> Result<RemoteItemReference> {
    match RawItem::deserialize(value)? {
        RawItem::Link(link) => Ok(RemoteItemReference::link(resolve_link("items", base, &link)?)),
        RawItem::Object {
            id,
            position,
            start_timestamp,
            stop_timestamp,
        } => Ok(RemoteItemReference {
            url: resolve_link("items", base, &id)?,
            position: position.map(|p| bounded("position", p, 1)).transpose()?,
            start_timestamp: start_timestamp
                .map(|t| bounded("startTimestamp", t, 0))
                .transpose()?,
            stop_timestamp: stop_timestamp
                .map(|t| bounded("stopTimestamp", t, 0))
                .transpose()?,
        }),
    }
}

fn expect_type(found: &str, expected: &'static str) -> Result<()> {
    if found == expected {
        Ok(())
    } else {
        Err(ValidationError::WrongType {
            expected,
            found: found.to_string(),
        })
    }
}

fn check_origin(declared: &Url, fetched_from: &Url) -> Result<()> {
    if same_host(declared, fetched_from) {
        Ok(())
    } else {
        Err(ValidationError::ForeignOrigin {
            declared: declared.to_string(),
            fetched_from: fetched_from.to_string(),
        })
    }
}

fn parse_url(field: &'static str, value: &str) -> Result<Url> {
    let invalid = || ValidationError::InvalidUrl {
        field,
        value: value.chars().take(200).collect(),
    };

    if value.len() > MAX_URL_LENGTH {
        return Err(invalid());
    }

    let url = Url::parse(value).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(invalid());
    }

    Ok(url)
}

fn resolve_link(field: &'static str, base: &Url, link: &str) -> Result<Url> {
    let joined = base.join(link).map_err(|_| ValidationError::InvalidUrl {
        field,
        value: link.chars().take(200).collect(),
    })?;
    parse_url(field, joined.as_str())
}

fn parse_date(field: &'static str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|date| date.with_timezone(&Utc))
        .map_err(|_| ValidationError::InvalidDate {
            field,
            value: value.to_string(),
        })
}

fn non_negative(field: &'static str, value: i64) -> Result<i64> {
    if value < 0 {
        Err(ValidationError::OutOfRange { field, value })
    } else {
        Ok(value)
    }
}

fn bounded(field: &'static str, value: i64, min: i64) -> Result<i32> {
    if value < min || value > i64::from(i32::MAX) {
        return Err(ValidationError::OutOfRange { field, value });
    }
    Ok(value as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use marquee_core::types::PUBLIC_AUDIENCE;
    use serde_json::json;

    const PLAYLIST_URL: &str = "https://remote.example/video-playlists/2a7c";

    fn url(value: &str) -> Url {
        Url::parse(value).unwrap()
    }

    fn playlist_body() -> Value {
        json!({
            "type": "Playlist",
            "id": PLAYLIST_URL,
            "uuid": "2a7c1b58-3a56-4f0e-9f7d-7d1bde2a4c11",
            "name": "Road trip",
            "content": "Songs for the car",
            "published": "2024-03-01T10:00:00.000Z",
            "updated": "2024-03-02T10:00:00.000Z",
            "to": [PUBLIC_AUDIENCE],
            "attributedTo": ["https://remote.example/video-channels/travel"],
            "icon": {
                "type": "Image",
                "url": "https://remote.example/static/thumbnails/2a7c.jpg",
                "mediaType": "image/jpeg",
                "width": 280,
                "height": 157
            },
            "totalItems": 2,
            "first": "https://remote.example/video-playlists/2a7c?page=1"
        })
    }

    fn element_body() -> Value {
        json!({
            "type": "PlaylistElement",
            "id": "https://remote.example/video-playlists/2a7c/videos/11",
            "url": "https://remote.example/videos/watch/9c1e",
            "position": 2,
            "startTimestamp": 30,
            "stopTimestamp": 90
        })
    }

    #[test]
    fn test_valid_manifest_decodes() {
        let manifest = decode_manifest(&playlist_body(), &url(PLAYLIST_URL)).unwrap();

        assert_eq!(manifest.name, "Road trip");
        assert_eq!(manifest.description.as_deref(), Some("Songs for the car"));
        assert_eq!(manifest.visibility, Visibility::Public);
        assert_eq!(manifest.total_items, Some(2));
        assert_eq!(manifest.attributed_to.len(), 1);
        assert_eq!(
            manifest.icon.as_ref().map(|icon| icon.url.as_str()),
            Some("https://remote.example/static/thumbnails/2a7c.jpg")
        );
        assert_eq!(
            manifest.collection.first,
            Some(PageRef::Link(url("https://remote.example/video-playlists/2a7c?page=1")))
        );
    }

    #[test]
    fn test_relative_icon_resolves_against_playlist() {
        let mut body = playlist_body();
        body["icon"]["url"] = json!("/static/thumbnails/2a7c.jpg");

        let manifest = decode_manifest(&body, &url(PLAYLIST_URL)).unwrap();
        assert_eq!(
            manifest.icon.map(|icon| icon.url),
            Some(url("https://remote.example/static/thumbnails/2a7c.jpg"))
        );
    }

    #[test]
    fn test_unusable_icon_is_dropped() {
        let mut body = playlist_body();
        body["icon"]["url"] = json!("data:image/png;base64,AAAA");

        let manifest = decode_manifest(&body, &url(PLAYLIST_URL)).unwrap();
        assert_eq!(manifest.icon, None);
    }

    #[test]
    fn test_malformed_actor_is_kept_as_sent() {
        let mut body = playlist_body();
        body["attributedTo"] = json!([
            "https://remote.example/video-channels/travel",
            "acct:bob@remote.example"
        ]);

        let manifest = decode_manifest(&body, &url(PLAYLIST_URL)).unwrap();
        assert_eq!(
            manifest.attributed_to,
            vec![
                AttributedActor::Url(url("https://remote.example/video-channels/travel")),
                AttributedActor::Malformed("acct:bob@remote.example".to_string()),
            ]
        );
    }

    #[test]
    fn test_manifest_without_public_marker_is_unlisted() {
        let mut body = playlist_body();
        body["to"] = json!(["https://remote.example/accounts/alice/followers"]);

        let manifest = decode_manifest(&body, &url(PLAYLIST_URL)).unwrap();
        assert_eq!(manifest.visibility, Visibility::Unlisted);
    }

    #[test]
    fn test_manifest_from_other_host_rejected() {
        let result = decode_manifest(&playlist_body(), &url("https://evil.example/playlists/1"));
        assert!(matches!(result, Err(ValidationError::ForeignOrigin { .. })));

        // Structurally it is still fine
        assert!(is_manifest_valid(&playlist_body()));
    }

    #[test]
    fn test_manifest_field_checks() {
        let cases = [
            ("type", json!("Video")),
            ("id", json!("ftp://remote.example/p")),
            ("uuid", json!("not-a-uuid")),
            ("name", json!("")),
            ("published", json!("yesterday")),
            ("to", json!("https://www.w3.org/ns/activitystreams#Public")),
            ("totalItems", json!(-1)),
        ];

        for (field, value) in cases {
            let mut body = playlist_body();
            body[field] = value;
            assert!(!is_manifest_valid(&body), "{field} should be rejected");
        }
    }

    #[test]
    fn test_manifest_name_too_long_rejected() {
        let mut body = playlist_body();
        body["name"] = json!("x".repeat(121));

        assert_eq!(parse_manifest(&body).unwrap_err(), ValidationError::InvalidName(121));
    }

    #[test]
    fn test_manifest_with_embedded_first_page() {
        let mut body = playlist_body();
        body["first"] = json!({
            "type": "OrderedCollectionPage",
            "orderedItems": [
                "https://remote.example/video-playlists/2a7c/videos/10",
                "https://remote.example/video-playlists/2a7c/videos/11"
            ],
            "next": "?page=2"
        });

        let manifest = decode_manifest(&body, &url(PLAYLIST_URL)).unwrap();
        let Some(PageRef::Embedded(first)) = manifest.collection.first else {
            panic!("expected embedded first page");
        };
        assert_eq!(first.items.len(), 2);
        assert_eq!(
            first.next,
            Some(url("https://remote.example/video-playlists/2a7c?page=2"))
        );
    }

    #[test]
    fn test_valid_element_decodes() {
        let fetched_from = url("https://remote.example/video-playlists/2a7c/videos/11");
        let element = decode_element(&element_body(), &fetched_from).unwrap();

        assert_eq!(element.video_url, url("https://remote.example/videos/watch/9c1e"));
        assert_eq!(element.position, Some(2));
        assert_eq!(element.start_timestamp, Some(30));
        assert_eq!(element.stop_timestamp, Some(90));
    }

    #[test]
    fn test_element_field_checks() {
        let cases = [
            ("type", json!("Playlist")),
            ("url", json!("not a url")),
            ("position", json!(0)),
            ("startTimestamp", json!(-5)),
            ("position", json!("two")),
        ];

        for (field, value) in cases {
            let mut body = element_body();
            body[field] = value;
            assert!(!is_element_valid(&body), "{field} should be rejected");
        }
    }

    #[test]
    fn test_element_position_is_optional() {
        let mut body = element_body();
        body.as_object_mut().unwrap().remove("position");

        let element = parse_element(&body).unwrap();
        assert_eq!(element.position, None);
    }

    #[test]
    fn test_element_from_other_host_rejected() {
        let result = decode_element(&element_body(), &url("https://evil.example/e/11"));
        assert!(matches!(result, Err(ValidationError::ForeignOrigin { .. })));
    }

    #[test]
    fn test_page_skips_bad_items_only() {
        let fetched_from = url("https://remote.example/video-playlists/2a7c?page=1");
        let body = json!({
            "type": "OrderedCollectionPage",
            "id": fetched_from.as_str(),
            "orderedItems": [
                "https://remote.example/video-playlists/2a7c/videos/10",
                42,
                { "id": "https://remote.example/video-playlists/2a7c/videos/11", "position": 2 },
                "mailto:someone@remote.example"
            ],
            "next": "https://remote.example/video-playlists/2a7c?page=2"
        });

        let page = decode_page(&body, &fetched_from).unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.skipped_items, 2);
        assert_eq!(page.items[1].position, Some(2));
    }

    #[test]
    fn test_page_without_type_rejected() {
        let fetched_from = url("https://remote.example/video-playlists/2a7c?page=1");
        let body = json!({ "orderedItems": [] });

        assert!(matches!(
            decode_page(&body, &fetched_from),
            Err(ValidationError::WrongType { .. })
        ));
    }

    #[test]
    fn test_same_host_compares_host_and_port() {
        let a = url("https://remote.example/a");

        assert!(same_host(&a, &url("https://REMOTE.example/b")));
        assert!(same_host(&a, &url("https://remote.example:443/b")));
        assert!(!same_host(&a, &url("https://remote.example:8443/b")));
        assert!(!same_host(&a, &url("https://sub.remote.example/b")));
    }

    #[test]
    fn test_object_url_rules() {
        assert!(is_valid_object_url("https://remote.example/videos/1"));
        assert!(is_valid_object_url("http://localhost:9000/videos/1"));
        assert!(!is_valid_object_url("/videos/1"));
        assert!(!is_valid_object_url("file:///etc/passwd"));

        let long = format!("https://remote.example/{}", "a".repeat(MAX_URL_LENGTH));
        assert!(!is_valid_object_url(&long));
    }
}
