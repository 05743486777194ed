//! Structured search query matching the engine's JSON contract.

use serde::{Deserialize, Serialize};

/// One entry of a multi-value filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterItem {
    pub value: String,
    pub not: bool,
}

impl FilterItem {
    pub fn include(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            not: false,
        }
    }

    pub fn exclude(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            not: true,
        }
    }
}

/// Inclusion/exclusion list with its combinator (`or` = any-match, else all-match).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterList {
    pub items: Vec<FilterItem>,
    pub or: bool,
}

/// Comparison applied to an item's episode count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Bigger,
    Smaller,
    #[default]
    BiggerEq,
    SmallerEq,
    Eq,
}

/// Episode-count filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeFilter {
    pub number: i64,
    pub operation: Operation,
}

/// The query sent to the search engine.
///
/// Field order is the serialization order; two equal queries always
/// serialize to the same string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub typ: FilterList,
    pub tag: FilterList,
    pub status: FilterList,
    pub title: String,
    pub episodes: EpisodeFilter,
}

impl SearchQuery {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_query_json_shape() {
        let json = SearchQuery::default().to_json().unwrap();
        assert_eq!(
            json,
            r#"{"typ":{"items":[],"or":false},"tag":{"items":[],"or":false},"status":{"items":[],"or":false},"title":"","episodes":{"number":0,"operation":"BiggerEq"}}"#
        );
    }

    #[test]
    fn test_filter_items_serialize_with_negation() {
        let query = SearchQuery {
            tag: FilterList {
                items: vec![FilterItem::exclude("horror"), FilterItem::include("comedy")],
                or: true,
            },
            episodes: EpisodeFilter {
                number: 12,
                operation: Operation::SmallerEq,
            },
            ..Default::default()
        };
        let value = serde_json::to_value(&query).unwrap();
        assert_eq!(value["tag"]["items"][0]["value"], "horror");
        assert_eq!(value["tag"]["items"][0]["not"], true);
        assert_eq!(value["tag"]["or"], true);
        assert_eq!(value["episodes"]["operation"], "SmallerEq");
    }
}
