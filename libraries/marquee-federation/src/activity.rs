//! Raw wire shapes of the federation vocabulary.
//!
//! These mirror the JSON as sent by remote hosts and are only ever consumed
//! by `validate`, which turns them into the checked values of `types`.

use serde::Deserialize;
use serde_json::Value;

/// A field that may hold a single value or an array of them
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }
}

/// Link to another object, either bare or as an object carrying an `id`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Reference {
    Link(String),
    Object { id: String },
}

impl Reference {
    pub(crate) fn into_id(self) -> String {
        match self {
            Reference::Link(id) | Reference::Object { id } => id,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawImage {
    pub url: String,
    pub media_type: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// `first` of a collection: a link, or the first page embedded in place
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawPageRef {
    Link(String),
    Page(Box<RawPage>),
}

/// Any of the collection/page types, including the playlist itself
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawPage {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub id: Option<String>,
    pub first: Option<RawPageRef>,
    pub next: Option<String>,
    pub total_items: Option<i64>,

    // Items are decoded one by one so a single bad entry only skips itself
    pub items: Option<Vec<Value>>,
    pub ordered_items: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawPlaylist {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    pub uuid: String,
    pub name: String,
    pub content: Option<String>,
    pub published: String,
    pub updated: String,
    pub to: Vec<String>,
    pub attributed_to: Option<OneOrMany<Reference>>,
    pub icon: Option<OneOrMany<RawImage>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawElement {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    pub url: String,
    pub position: Option<i64>,
    pub start_timestamp: Option<i64>,
    pub stop_timestamp: Option<i64>,
}

/// Collection entry: a link to an element, or the element embedded
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawItem {
    Link(String),
    #[serde(rename_all = "camelCase")]
    Object {
        id: String,
        position: Option<i64>,
        start_timestamp: Option<i64>,
        stop_timestamp: Option<i64>,
    },
}
