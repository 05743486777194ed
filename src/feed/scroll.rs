//! Infinite-scroll trigger.

/// Distance from the document bottom at which the next page is requested.
pub const SCROLL_THRESHOLD: f64 = 300.0;

/// Viewport geometry at the time of a scroll event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub viewport_height: f64,
    pub scroll_y: f64,
    pub document_height: f64,
}

impl ScrollMetrics {
    pub fn near_bottom(&self, threshold: f64) -> bool {
        self.viewport_height + self.scroll_y + threshold >= self.document_height
    }
}
