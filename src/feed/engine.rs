//! Capability contract of the external search engine and the rendering surface.

use crate::errors::AppError;
use crate::models::ItemRecord;

/// The search engine consumed by the result feed.
///
/// `initialize` is called exactly once, before any query. Pages are 1-indexed.
pub trait SearchEngine {
    /// Parse and index the dataset text.
    fn initialize(&mut self, dataset: String) -> Result<(), AppError>;

    /// One page of items matching `query_json`.
    fn search(
        &self,
        query_json: &str,
        page: usize,
        page_size: usize,
    ) -> Result<Vec<ItemRecord>, AppError>;

    /// Total matches for `query_json`, independent of pagination.
    fn search_count(&self, query_json: &str) -> Result<usize, AppError>;

    /// Tag names containing `partial`.
    fn tag_search(
        &self,
        partial: &str,
        page: usize,
        page_size: usize,
    ) -> Result<Vec<String>, AppError>;
}

/// Rendering surface driven by the feed.
pub trait FeedView {
    fn clear_results(&mut self);
    fn show_count(&mut self, count: usize);
    fn append_items(&mut self, items: &[ItemRecord]);
    fn show_suggestions(&mut self, tags: &[String]);
    fn hide_suggestions(&mut self);
}
