use std::time::{Duration, Instant};
use tracing::debug;

use super::{Debounce, Loadable, Screen, clamp_selection};
use crate::api::ApiClient;
use crate::model::{CommentFilter, CommentPage, CommentSnippet, SNIPPET_CATEGORIES};

/// Comment library with category filter, paging and debounced search.
#[derive(Debug)]
pub struct LibraryScreen {
    pub page: Loadable<CommentPage>,
    pub filter: CommentFilter,
    pub search_input: String,
    pub selected: usize,
    debounce: Debounce,
}

impl LibraryScreen {
    pub fn new(debounce: Duration) -> Self {
        Self {
            page: Loadable::Idle,
            filter: CommentFilter::default(),
            search_input: String::new(),
            selected: 0,
            debounce: Debounce::new(debounce),
        }
    }

    pub fn snippets(&self) -> &[CommentSnippet] {
        self.page.loaded().map(|p| p.items.as_slice()).unwrap_or(&[])
    }

    pub fn select_next(&mut self) {
        let len = self.snippets().len();
        super::select_next(&mut self.selected, len);
    }

    pub fn select_prev(&mut self) {
        super::select_prev(&mut self.selected);
    }

    /// All -> Support -> ... -> Crisis -> All.
    pub fn cycle_category(&mut self) {
        let next = match self.filter.category.as_deref() {
            None => SNIPPET_CATEGORIES.first(),
            Some(current) => SNIPPET_CATEGORIES
                .iter()
                .position(|c| *c == current)
                .and_then(|i| SNIPPET_CATEGORIES.get(i + 1)),
        };
        self.filter.category = next.map(|c| c.to_string());
        self.restart();
    }

    pub fn next_page(&mut self) {
        let last = self.page.loaded().map(CommentPage::page_count).unwrap_or(1);
        if self.filter.page < last {
            self.filter.page += 1;
            self.begin_load();
        }
    }

    pub fn prev_page(&mut self) {
        if self.filter.page > 1 {
            self.filter.page -= 1;
            self.begin_load();
        }
    }

    pub fn push_search_char(&mut self, c: char, now: Instant) {
        self.search_input.push(c);
        self.debounce.touch(now);
    }

    pub fn pop_search_char(&mut self, now: Instant) {
        if self.search_input.pop().is_some() {
            self.debounce.touch(now);
        }
    }

    /// Apply the typed search once the debounce settles. Returns true when a
    /// new fetch was scheduled.
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.debounce.ready(now) {
            return false;
        }
        let search = self.search_input.trim();
        let next = (!search.is_empty()).then(|| search.to_string());
        if next == self.filter.search {
            return false;
        }
        debug!("library search: {next:?}");
        self.filter.search = next;
        self.restart();
        true
    }

    fn restart(&mut self) {
        self.filter.page = 1;
        self.selected = 0;
        self.begin_load();
    }
}

impl Screen for LibraryScreen {
    fn begin_load(&mut self) {
        self.page = Loadable::Loading;
    }

    fn wants_load(&self) -> bool {
        self.page.is_loading()
    }

    fn load(&mut self, api: &ApiClient) {
        self.page = Loadable::from_result(api.comments(&self.filter));
        let len = self.snippets().len();
        clamp_selection(&mut self.selected, len);
    }

    fn error(&self) -> Option<&str> {
        self.page.error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen() -> LibraryScreen {
        LibraryScreen::new(Duration::from_millis(300))
    }

    #[test]
    fn category_cycle_wraps_to_all() {
        let mut library = screen();
        library.cycle_category();
        assert_eq!(library.filter.category.as_deref(), Some("Support"));
        for _ in 1..SNIPPET_CATEGORIES.len() {
            library.cycle_category();
        }
        assert_eq!(library.filter.category.as_deref(), Some("Crisis"));
        library.cycle_category();
        assert_eq!(library.filter.category, None);
    }

    #[test]
    fn typing_applies_after_debounce() {
        let start = Instant::now();
        let mut library = screen();
        library.filter.page = 3;
        library.push_search_char('f', start);
        library.push_search_char('e', start + Duration::from_millis(100));
        assert!(!library.tick(start + Duration::from_millis(200)));
        assert!(library.tick(start + Duration::from_millis(450)));
        assert_eq!(library.filter.search.as_deref(), Some("fe"));
        assert_eq!(library.filter.page, 1);
        assert!(library.wants_load());
    }

    #[test]
    fn unchanged_search_does_not_refetch() {
        let start = Instant::now();
        let mut library = screen();
        library.push_search_char(' ', start);
        assert!(!library.tick(start + Duration::from_secs(1)));
        assert!(!library.wants_load());
    }

    #[test]
    fn paging_is_bounded() {
        let mut library = screen();
        library.page = Loadable::Loaded(CommentPage {
            items: Vec::new(),
            total: 45,
            page: 1,
            limit: 20,
        });
        library.next_page();
        assert_eq!(library.filter.page, 2);
        library.page = Loadable::Loaded(CommentPage {
            items: Vec::new(),
            total: 45,
            page: 2,
            limit: 20,
        });
        library.next_page();
        library.page = Loadable::Loaded(CommentPage {
            items: Vec::new(),
            total: 45,
            page: 3,
            limit: 20,
        });
        library.next_page();
        assert_eq!(library.filter.page, 3);
        library.prev_page();
        library.prev_page();
        library.prev_page();
        assert_eq!(library.filter.page, 1);
    }
}
