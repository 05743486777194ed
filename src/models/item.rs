//! Item record returned by the search engine.

use serde::{Deserialize, Serialize};

/// Release season of an item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimeSeason {
    #[serde(default)]
    pub season: String,
    #[serde(default)]
    pub year: Option<i64>,
}

/// A single dataset record as produced by the engine.
///
/// Only `sources`, `title` and `picture` are guaranteed; everything else
/// defaults when absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord {
    pub sources: Vec<String>,
    pub title: String,
    pub picture: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub episodes: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub anime_season: Option<AnimeSeason>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub synonyms: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}
