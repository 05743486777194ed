//! Translation of raw UI input into a [`SearchQuery`].

use crate::models::{EpisodeFilter, FilterItem, FilterList, SearchQuery};

/// Raw input signals held by a feed session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryInput {
    /// Free-text title filter.
    pub title: String,
    /// Comma-separated tag list; `!` negates a tag.
    pub tag_text: String,
    /// Tag combinator toggle (`true` = any-match).
    pub tag_or: bool,
    pub typ: FilterList,
    pub status: FilterList,
    pub episodes: EpisodeFilter,
}

impl QueryInput {
    pub fn build(&self) -> SearchQuery {
        SearchQuery {
            typ: self.typ.clone(),
            tag: FilterList {
                items: parse_filter_items(&self.tag_text),
                or: self.tag_or,
            },
            status: self.status.clone(),
            title: self.title.clone(),
            episodes: self.episodes.clone(),
        }
    }

    /// The tag currently being typed: last segment, without `!`.
    pub fn partial_tag(&self) -> &str {
        let last = self.tag_text.rsplit(',').next().unwrap_or("").trim_start();
        last.strip_prefix('!').unwrap_or(last).trim()
    }

    /// Replace the last tag segment with `tag`, keeping a `!` prefix.
    pub fn replace_last_tag(&mut self, tag: &str) {
        let (head, last) = match self.tag_text.rfind(',') {
            Some(idx) => (&self.tag_text[..=idx], &self.tag_text[idx + 1..]),
            None => ("", self.tag_text.as_str()),
        };
        let prefix = if last.trim_start().starts_with('!') { "!" } else { "" };
        self.tag_text = format!("{}{}{}", head, prefix, tag);
    }
}

/// Parse comma-separated filter text.
///
/// Segments are trimmed; a leading `!` marks exclusion. Empty segments,
/// including the trailing one left by a trailing comma, are dropped.
pub fn parse_filter_items(text: &str) -> Vec<FilterItem> {
    text.split(',')
        .filter_map(|segment| {
            let segment = segment.trim();
            let item = match segment.strip_prefix('!') {
                Some(value) => FilterItem::exclude(value.trim()),
                None => FilterItem::include(segment),
            };
            (!item.value.is_empty()).then_some(item)
        })
        .collect()
}
