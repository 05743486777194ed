//! Paginated result feed.
//!
//! Session state is explicit: the current input, the last dispatched query,
//! the next page number and a generation counter. Every page request carries
//! the generation it was issued under; a delivery from an older generation
//! is dropped, so a slow response can never land in a newer feed.

use crate::errors::AppError;
use crate::models::ItemRecord;

use super::engine::{FeedView, SearchEngine};
use super::query_builder::QueryInput;
use super::scroll::{ScrollMetrics, SCROLL_THRESHOLD};

/// Feed lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedState {
    /// Nothing dispatched yet.
    Idle,
    /// Input changed since the last dispatch.
    QueryDirty,
    /// A page request is outstanding.
    Fetching,
    /// The last requested page has been appended.
    Rendered,
}

/// An outstanding page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub generation: u64,
    pub page: usize,
    pub query: String,
}

/// State of one interactive query session.
#[derive(Debug, Clone)]
pub struct FeedSession {
    input: QueryInput,
    page_size: usize,
    dirty: bool,
    fetching: bool,
    next_page: usize,
    generation: u64,
    last_dispatched: Option<String>,
}

impl FeedSession {
    pub fn new(page_size: usize) -> Self {
        Self {
            input: QueryInput::default(),
            page_size: page_size.max(1),
            dirty: false,
            fetching: false,
            next_page: 1,
            generation: 0,
            last_dispatched: None,
        }
    }

    pub fn state(&self) -> FeedState {
        if self.dirty {
            FeedState::QueryDirty
        } else if self.last_dispatched.is_none() {
            FeedState::Idle
        } else if self.fetching {
            FeedState::Fetching
        } else {
            FeedState::Rendered
        }
    }

    pub fn input(&self) -> &QueryInput {
        &self.input
    }

    /// Page number the next page request will ask for.
    pub fn next_page(&self) -> usize {
        self.next_page
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Mutable access to the input; marks the query dirty.
    pub fn input_mut(&mut self) -> &mut QueryInput {
        self.dirty = true;
        &mut self.input
    }

    /// Run a query-change cycle if the serialized query differs from the
    /// last dispatched one. Returns whether a new cycle ran.
    pub fn refresh<E, V>(&mut self, engine: &E, view: &mut V) -> Result<bool, AppError>
    where
        E: SearchEngine,
        V: FeedView,
    {
        let query = self.input.build().to_json()?;
        self.dirty = false;
        if self.last_dispatched.as_deref() == Some(query.as_str()) {
            return Ok(false);
        }

        self.reset(query.clone(), view);
        if let Err(e) = self.show_first_page(&query, engine, view) {
            // Forget the failed dispatch so the same query runs again.
            self.last_dispatched = None;
            self.fetching = false;
            self.dirty = true;
            return Err(e);
        }
        Ok(true)
    }

    fn show_first_page<E, V>(
        &mut self,
        query: &str,
        engine: &E,
        view: &mut V,
    ) -> Result<(), AppError>
    where
        E: SearchEngine,
        V: FeedView,
    {
        let count = engine.search_count(query)?;
        view.show_count(count);
        self.load_next_page(engine, view)?;
        Ok(())
    }

    /// Clear the feed and start a new generation for `query`.
    fn reset<V: FeedView>(&mut self, query: String, view: &mut V) {
        self.generation += 1;
        self.next_page = 1;
        self.fetching = false;
        self.last_dispatched = Some(query);
        view.clear_results();
        tracing::debug!("Feed reset to generation {}", self.generation);
    }

    /// Issue the next page request, or `None` while one is outstanding or
    /// before any query was dispatched.
    pub fn issue_page(&mut self) -> Option<PageRequest> {
        if self.fetching {
            return None;
        }
        let query = self.last_dispatched.clone()?;
        let request = PageRequest {
            generation: self.generation,
            page: self.next_page,
            query,
        };
        self.next_page += 1;
        self.fetching = true;
        Some(request)
    }

    /// Append a delivered page. Returns `false` if the request was
    /// superseded by a newer query and the items were discarded.
    pub fn deliver<V: FeedView>(
        &mut self,
        request: &PageRequest,
        items: &[ItemRecord],
        view: &mut V,
    ) -> bool {
        if request.generation != self.generation {
            tracing::debug!(
                "Discarding page {} from stale generation {} (current {})",
                request.page,
                request.generation,
                self.generation
            );
            return false;
        }
        view.append_items(items);
        self.fetching = false;
        true
    }

    /// Give up on a failed request; its page number will be requested again.
    pub fn abandon(&mut self, request: &PageRequest) {
        if request.generation == self.generation && self.fetching {
            self.next_page = request.page;
            self.fetching = false;
        }
    }

    /// Issue, fetch and deliver the next page in one step.
    pub fn load_next_page<E, V>(&mut self, engine: &E, view: &mut V) -> Result<bool, AppError>
    where
        E: SearchEngine,
        V: FeedView,
    {
        let Some(request) = self.issue_page() else {
            return Ok(false);
        };
        match engine.search(&request.query, request.page, self.page_size) {
            Ok(items) => Ok(self.deliver(&request, &items, view)),
            Err(e) => {
                self.abandon(&request);
                Err(e)
            }
        }
    }

    /// Scroll listener: near the bottom, append the next page.
    ///
    /// There is no end-of-data check; an empty page appends nothing.
    pub fn on_scroll<E, V>(
        &mut self,
        metrics: ScrollMetrics,
        engine: &E,
        view: &mut V,
    ) -> Result<bool, AppError>
    where
        E: SearchEngine,
        V: FeedView,
    {
        if !metrics.near_bottom(SCROLL_THRESHOLD) {
            return Ok(false);
        }
        if (self.dirty || self.last_dispatched.is_none()) && self.refresh(engine, view)? {
            return Ok(true);
        }
        self.load_next_page(engine, view)
    }

    pub fn on_title_input<E, V>(
        &mut self,
        title: &str,
        engine: &E,
        view: &mut V,
    ) -> Result<bool, AppError>
    where
        E: SearchEngine,
        V: FeedView,
    {
        self.input_mut().title = title.to_string();
        view.hide_suggestions();
        self.refresh(engine, view)
    }

    pub fn on_tag_mode_change<E, V>(
        &mut self,
        or: bool,
        engine: &E,
        view: &mut V,
    ) -> Result<bool, AppError>
    where
        E: SearchEngine,
        V: FeedView,
    {
        self.input_mut().tag_or = or;
        view.hide_suggestions();
        self.refresh(engine, view)
    }

    /// Tag keystroke: show suggestions for the partial tag, then refresh.
    /// A failed suggestion lookup hides the overlay and does not block the refresh.
    pub fn on_tag_input<E, V>(
        &mut self,
        tag_text: &str,
        engine: &E,
        view: &mut V,
    ) -> Result<bool, AppError>
    where
        E: SearchEngine,
        V: FeedView,
    {
        self.input_mut().tag_text = tag_text.to_string();
        match engine.tag_search(self.input.partial_tag(), 1, self.page_size) {
            Ok(suggestions) => view.show_suggestions(&suggestions),
            Err(e) => {
                tracing::warn!("Tag suggestions unavailable: {}", e);
                view.hide_suggestions();
            }
        }
        self.refresh(engine, view)
    }

    /// Accept a suggestion in place of the tag being typed.
    pub fn select_suggestion<E, V>(
        &mut self,
        tag: &str,
        engine: &E,
        view: &mut V,
    ) -> Result<bool, AppError>
    where
        E: SearchEngine,
        V: FeedView,
    {
        self.input_mut().replace_last_tag(tag);
        view.hide_suggestions();
        self.refresh(engine, view)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::models::FilterItem;

    /// Engine returning `total` synthetic items, recording every call.
    struct FakeEngine {
        total: usize,
        searches: RefCell<Vec<(String, usize)>>,
        counts: RefCell<usize>,
        tag_queries: RefCell<Vec<String>>,
        count_failures: Cell<usize>,
        search_failures: Cell<usize>,
        tag_failures: Cell<usize>,
    }

    /// Consume one pending failure, if any.
    fn take_failure(failures: &Cell<usize>, what: &str) -> Result<(), AppError> {
        match failures.get() {
            0 => Ok(()),
            n => {
                failures.set(n - 1);
                Err(AppError::Engine(format!("{} failed", what)))
            }
        }
    }

    impl FakeEngine {
        fn new(total: usize) -> Self {
            Self {
                total,
                searches: RefCell::new(Vec::new()),
                counts: RefCell::new(0),
                tag_queries: RefCell::new(Vec::new()),
                count_failures: Cell::new(0),
                search_failures: Cell::new(0),
                tag_failures: Cell::new(0),
            }
        }

        fn pages(&self) -> Vec<usize> {
            self.searches.borrow().iter().map(|(_, p)| *p).collect()
        }
    }

    impl SearchEngine for FakeEngine {
        fn initialize(&mut self, _dataset: String) -> Result<(), AppError> {
            Ok(())
        }

        fn search(
            &self,
            query_json: &str,
            page: usize,
            page_size: usize,
        ) -> Result<Vec<ItemRecord>, AppError> {
            take_failure(&self.search_failures, "search")?;
            self.searches
                .borrow_mut()
                .push((query_json.to_string(), page));
            let start = (page - 1) * page_size;
            Ok((start..self.total.min(start + page_size))
                .map(|i| ItemRecord {
                    title: format!("item-{}", i),
                    ..Default::default()
                })
                .collect())
        }

        fn search_count(&self, _query_json: &str) -> Result<usize, AppError> {
            take_failure(&self.count_failures, "count")?;
            *self.counts.borrow_mut() += 1;
            Ok(self.total)
        }

        fn tag_search(
            &self,
            partial: &str,
            _page: usize,
            _page_size: usize,
        ) -> Result<Vec<String>, AppError> {
            self.tag_queries.borrow_mut().push(partial.to_string());
            take_failure(&self.tag_failures, "tag search")?;
            Ok(vec![format!("{}-suggested", partial)])
        }
    }

    #[derive(Default)]
    struct RecordingView {
        items: Vec<String>,
        clears: usize,
        count: Option<usize>,
        suggestions: Option<Vec<String>>,
    }

    impl FeedView for RecordingView {
        fn clear_results(&mut self) {
            self.items.clear();
            self.clears += 1;
        }

        fn show_count(&mut self, count: usize) {
            self.count = Some(count);
        }

        fn append_items(&mut self, items: &[ItemRecord]) {
            self.items.extend(items.iter().map(|i| i.title.clone()));
        }

        fn show_suggestions(&mut self, tags: &[String]) {
            self.suggestions = Some(tags.to_vec());
        }

        fn hide_suggestions(&mut self) {
            self.suggestions = None;
        }
    }

    fn bottom() -> ScrollMetrics {
        ScrollMetrics {
            viewport_height: 800.0,
            scroll_y: 1000.0,
            document_height: 1900.0,
        }
    }

    #[test]
    fn test_first_refresh_counts_and_renders_page_one() {
        let engine = FakeEngine::new(50);
        let mut view = RecordingView::default();
        let mut session = FeedSession::new(20);
        assert_eq!(session.state(), FeedState::Idle);

        assert!(session.refresh(&engine, &mut view).unwrap());
        assert_eq!(view.count, Some(50));
        assert_eq!(view.items.len(), 20);
        assert_eq!(engine.pages(), vec![1]);
        assert_eq!(session.state(), FeedState::Rendered);
        assert_eq!(session.next_page(), 2);
    }

    #[test]
    fn test_unchanged_query_does_not_redraw() {
        let engine = FakeEngine::new(50);
        let mut view = RecordingView::default();
        let mut session = FeedSession::new(20);

        session.refresh(&engine, &mut view).unwrap();
        session.input_mut().title = String::new();
        assert!(!session.refresh(&engine, &mut view).unwrap());
        assert_eq!(view.clears, 1);
        assert_eq!(*engine.counts.borrow(), 1);
        assert_eq!(engine.pages(), vec![1]);
    }

    #[test]
    fn test_scroll_pages_are_monotonic_and_appended() {
        let engine = FakeEngine::new(100);
        let mut view = RecordingView::default();
        let mut session = FeedSession::new(10);

        session.refresh(&engine, &mut view).unwrap();
        for _ in 0..3 {
            assert!(session.on_scroll(bottom(), &engine, &mut view).unwrap());
        }

        assert_eq!(engine.pages(), vec![1, 2, 3, 4]);
        assert_eq!(view.items.len(), 40);
        assert_eq!(view.items[0], "item-0");
        assert_eq!(view.items[39], "item-39");
        assert_eq!(view.clears, 1);
    }

    #[test]
    fn test_scroll_away_from_bottom_does_nothing() {
        let engine = FakeEngine::new(100);
        let mut view = RecordingView::default();
        let mut session = FeedSession::new(10);
        session.refresh(&engine, &mut view).unwrap();

        let top = ScrollMetrics {
            viewport_height: 800.0,
            scroll_y: 0.0,
            document_height: 5000.0,
        };
        assert!(!session.on_scroll(top, &engine, &mut view).unwrap());
        assert_eq!(engine.pages(), vec![1]);
    }

    #[test]
    fn test_scroll_past_end_appends_empty_pages() {
        let engine = FakeEngine::new(5);
        let mut view = RecordingView::default();
        let mut session = FeedSession::new(10);

        session.refresh(&engine, &mut view).unwrap();
        assert!(session.on_scroll(bottom(), &engine, &mut view).unwrap());
        assert!(session.on_scroll(bottom(), &engine, &mut view).unwrap());

        assert_eq!(engine.pages(), vec![1, 2, 3]);
        assert_eq!(view.items.len(), 5);
        assert_eq!(session.next_page(), 4);
    }

    #[test]
    fn test_title_change_resets_feed() {
        let engine = FakeEngine::new(100);
        let mut view = RecordingView::default();
        let mut session = FeedSession::new(10);

        session.refresh(&engine, &mut view).unwrap();
        session.on_scroll(bottom(), &engine, &mut view).unwrap();
        assert_eq!(session.next_page(), 3);

        assert!(session.on_title_input("bebop", &engine, &mut view).unwrap());
        assert_eq!(view.clears, 2);
        assert_eq!(view.items.len(), 10);
        assert_eq!(view.items[0], "item-0");
        assert_eq!(engine.pages(), vec![1, 2, 1]);
        assert_eq!(session.next_page(), 2);
        assert!(engine.searches.borrow()[2].0.contains(r#""title":"bebop""#));
    }

    #[test]
    fn test_stale_generation_is_discarded() {
        let engine = FakeEngine::new(100);
        let mut view = RecordingView::default();
        let mut session = FeedSession::new(10);
        session.refresh(&engine, &mut view).unwrap();

        let slow = session.issue_page().unwrap();
        assert_eq!(slow.page, 2);
        assert_eq!(session.state(), FeedState::Fetching);
        assert!(session.issue_page().is_none());

        session.on_title_input("new", &engine, &mut view).unwrap();
        let late = engine.search(&slow.query, slow.page, 10).unwrap();
        assert!(!session.deliver(&slow, &late, &mut view));

        assert_eq!(view.items.len(), 10);
        assert_eq!(view.items[0], "item-0");
        assert_eq!(session.next_page(), 2);
    }

    #[test]
    fn test_abandoned_request_reuses_page_number() {
        let engine = FakeEngine::new(100);
        let mut view = RecordingView::default();
        let mut session = FeedSession::new(10);
        session.refresh(&engine, &mut view).unwrap();

        let request = session.issue_page().unwrap();
        session.abandon(&request);
        assert_eq!(session.state(), FeedState::Rendered);
        assert_eq!(session.issue_page().unwrap().page, request.page);
    }

    #[test]
    fn test_tag_input_suggests_partial_and_refreshes() {
        let engine = FakeEngine::new(30);
        let mut view = RecordingView::default();
        let mut session = FeedSession::new(10);

        session.on_tag_input("action,!hor", &engine, &mut view).unwrap();
        assert_eq!(engine.tag_queries.borrow().as_slice(), ["hor"]);
        assert_eq!(
            view.suggestions.as_deref(),
            Some(&["hor-suggested".to_string()][..])
        );
        assert_eq!(
            session.input().build().tag.items,
            vec![FilterItem::include("action"), FilterItem::exclude("hor")]
        );
        assert_eq!(engine.pages(), vec![1]);
    }

    #[test]
    fn test_select_suggestion_replaces_last_segment() {
        let engine = FakeEngine::new(30);
        let mut view = RecordingView::default();
        let mut session = FeedSession::new(10);

        session.on_tag_input("action,!hor", &engine, &mut view).unwrap();
        assert!(session
            .select_suggestion("horror", &engine, &mut view)
            .unwrap());

        assert_eq!(session.input().tag_text, "action,!horror");
        assert!(view.suggestions.is_none());
        assert_eq!(view.clears, 2);
        assert_eq!(engine.pages(), vec![1, 1]);
    }

    #[test]
    fn test_trailing_comma_keystroke_does_not_redraw() {
        let engine = FakeEngine::new(30);
        let mut view = RecordingView::default();
        let mut session = FeedSession::new(10);

        session.on_tag_input("action", &engine, &mut view).unwrap();
        assert!(!session.on_tag_input("action,", &engine, &mut view).unwrap());
        assert_eq!(view.clears, 1);
        assert_eq!(engine.tag_queries.borrow().len(), 2);
    }

    #[test]
    fn test_tag_mode_change_is_a_query_change() {
        let engine = FakeEngine::new(30);
        let mut view = RecordingView::default();
        let mut session = FeedSession::new(10);

        session.on_tag_input("a,b", &engine, &mut view).unwrap();
        assert!(session.on_tag_mode_change(true, &engine, &mut view).unwrap());
        assert!(session.input().build().tag.or);
        assert_eq!(session.generation(), 2);
    }

    #[test]
    fn test_failed_count_retries_same_query() {
        let engine = FakeEngine::new(30);
        engine.count_failures.set(1);
        let mut view = RecordingView::default();
        let mut session = FeedSession::new(10);

        assert!(matches!(
            session.on_title_input("x", &engine, &mut view),
            Err(AppError::Engine(_))
        ));
        assert_eq!(session.state(), FeedState::QueryDirty);
        assert_eq!(view.count, None);

        assert!(session.on_title_input("x", &engine, &mut view).unwrap());
        assert_eq!(view.count, Some(30));
        assert_eq!(view.items.len(), 10);
        assert_eq!(engine.pages(), vec![1]);
        assert_eq!(session.state(), FeedState::Rendered);
    }

    #[test]
    fn test_failed_first_page_retries_same_query() {
        let engine = FakeEngine::new(30);
        engine.search_failures.set(1);
        let mut view = RecordingView::default();
        let mut session = FeedSession::new(10);

        assert!(session.refresh(&engine, &mut view).is_err());
        assert!(view.items.is_empty());

        assert!(session.refresh(&engine, &mut view).unwrap());
        assert_eq!(view.items.len(), 10);
        assert_eq!(engine.pages(), vec![1]);
        assert_eq!(session.next_page(), 2);
    }

    #[test]
    fn test_scroll_after_failed_refresh_reruns_query() {
        let engine = FakeEngine::new(30);
        engine.count_failures.set(1);
        let mut view = RecordingView::default();
        let mut session = FeedSession::new(10);

        assert!(session.refresh(&engine, &mut view).is_err());
        assert!(session.on_scroll(bottom(), &engine, &mut view).unwrap());
        assert_eq!(view.count, Some(30));
        assert_eq!(engine.pages(), vec![1]);
    }

    #[test]
    fn test_tag_suggestion_failure_still_refreshes() {
        let engine = FakeEngine::new(30);
        engine.tag_failures.set(1);
        let mut view = RecordingView::default();
        view.suggestions = Some(vec!["old".to_string()]);
        let mut session = FeedSession::new(10);

        assert!(session.on_tag_input("act", &engine, &mut view).unwrap());
        assert!(view.suggestions.is_none());
        assert_eq!(view.count, Some(30));
        assert_eq!(engine.pages(), vec![1]);
        assert_eq!(session.state(), FeedState::Rendered);
        assert_eq!(
            session.input().build().tag.items,
            vec![FilterItem::include("act")]
        );
    }
}
