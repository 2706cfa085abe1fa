//! Screen state for the operator dashboard.
//!
//! Each screen owns its fetched data as a [`Loadable`] and exposes action
//! methods that call the backend and patch local state only when the call
//! succeeds. Nothing here renders; the terminal UI reads these structs.

mod hubs;
mod learning;
mod library;
mod overview;
mod personas;
mod review;
mod settings;

pub use hubs::{HubFocus, HubScreen};
pub use learning::LearningScreen;
pub use library::LibraryScreen;
pub use overview::OverviewScreen;
pub use personas::{PersonasScreen, TEMPERATURE_STEP};
pub use review::ReviewScreen;
pub use settings::{KNOWLEDGE_SECTION, SettingsScreen, SettingsTab};

use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::api::{ApiClient, ApiError};
use crate::config::DashboardSettings;
use crate::{Platform, Timeframe};

/// The nine dashboard screens, in sidebar order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Route {
    #[default]
    Overview,
    ReviewQueue,
    Settings,
    TikTokHub,
    InstagramHub,
    XHub,
    Personas,
    CommentLibrary,
    AiLearning,
}

impl Route {
    pub const ALL: [Route; 9] = [
        Route::Overview,
        Route::ReviewQueue,
        Route::Settings,
        Route::TikTokHub,
        Route::InstagramHub,
        Route::XHub,
        Route::Personas,
        Route::CommentLibrary,
        Route::AiLearning,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Route::Overview => "/overview",
            Route::ReviewQueue => "/review",
            Route::Settings => "/settings",
            Route::TikTokHub => "/hub/tiktok",
            Route::InstagramHub => "/hub/instagram",
            Route::XHub => "/hub/x",
            Route::Personas => "/personas",
            Route::CommentLibrary => "/library",
            Route::AiLearning => "/learning",
        }
    }

    /// Parse a path; a missing leading slash and a trailing slash are tolerated.
    pub fn from_path(path: &str) -> Option<Route> {
        let trimmed = path.trim().trim_end_matches('/');
        let normalized = if trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{trimmed}")
        };
        if normalized == "/" {
            return Some(Route::Overview);
        }
        Route::ALL.into_iter().find(|r| r.path() == normalized)
    }

    pub fn label(self) -> &'static str {
        match self {
            Route::Overview => "Overview",
            Route::ReviewQueue => "Review Queue",
            Route::Settings => "Settings",
            Route::TikTokHub => "TikTok Hub",
            Route::InstagramHub => "Instagram Hub",
            Route::XHub => "X Hub",
            Route::Personas => "AI Personality",
            Route::CommentLibrary => "Comment Library",
            Route::AiLearning => "AI Learning",
        }
    }

    pub fn hub(platform: Platform) -> Route {
        match platform {
            Platform::TikTok => Route::TikTokHub,
            Platform::Instagram => Route::InstagramHub,
            Platform::X => Route::XHub,
        }
    }

    pub fn platform(self) -> Option<Platform> {
        match self {
            Route::TikTokHub => Some(Platform::TikTok),
            Route::InstagramHub => Some(Platform::Instagram),
            Route::XHub => Some(Platform::X),
            _ => None,
        }
    }

    fn index(self) -> usize {
        Route::ALL.iter().position(|r| *r == self).unwrap_or(0)
    }
}

/// Fetch state of one backend resource.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Loadable<T> {
    #[default]
    Idle,
    Loading,
    Loaded(T),
    Failed(String),
}

impl<T> Loadable<T> {
    pub fn from_result(result: Result<T, ApiError>) -> Self {
        match result {
            Ok(value) => Loadable::Loaded(value),
            Err(err) => Loadable::Failed(err.to_string()),
        }
    }

    pub fn loaded(&self) -> Option<&T> {
        match self {
            Loadable::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn loaded_mut(&mut self) -> Option<&mut T> {
        match self {
            Loadable::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Loadable::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Loadable::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// A dashboard screen the shell can (re)load.
pub trait Screen {
    /// Mark the screen's data stale; the next tick fetches it.
    fn begin_load(&mut self);

    fn wants_load(&self) -> bool;

    fn load(&mut self, api: &ApiClient);

    fn error(&self) -> Option<&str>;
}

/// Move a list cursor down, clamping at the end.
pub fn select_next(selected: &mut usize, len: usize) {
    if len > 0 && *selected < len - 1 {
        *selected += 1;
    }
}

/// Move a list cursor up, clamping at the start.
pub fn select_prev(selected: &mut usize) {
    if *selected > 0 {
        *selected -= 1;
    }
}

/// Pull a cursor back inside a list that may have shrunk.
pub fn clamp_selection(selected: &mut usize, len: usize) {
    if len == 0 {
        *selected = 0;
    } else if *selected >= len {
        *selected = len - 1;
    }
}

/// Navigation list with the review-queue badge.
#[derive(Debug)]
pub struct Sidebar {
    pub cursor: usize,
    pub pending_count: Option<usize>,
    poll_interval: Duration,
    last_poll: Option<Instant>,
}

impl Sidebar {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            cursor: 0,
            pending_count: None,
            poll_interval,
            last_poll: None,
        }
    }

    pub fn highlighted(&self) -> Route {
        Route::ALL[self.cursor.min(Route::ALL.len() - 1)]
    }

    pub fn select_next(&mut self) {
        select_next(&mut self.cursor, Route::ALL.len());
    }

    pub fn select_prev(&mut self) {
        select_prev(&mut self.cursor);
    }

    /// Force a poll on the next tick.
    pub fn invalidate(&mut self) {
        self.last_poll = None;
    }

    pub fn poll_due(&self, now: Instant) -> bool {
        self.last_poll
            .is_none_or(|last| now.duration_since(last) >= self.poll_interval)
    }

    /// Re-fetch the pending count; a failed poll keeps the previous badge.
    pub fn refresh_pending(&mut self, api: &ApiClient, now: Instant) {
        self.last_poll = Some(now);
        match api.review_queue() {
            Ok(queue) => {
                let count = queue.pending();
                debug!("pending review count: {count}");
                self.pending_count = Some(count);
            }
            Err(err) => debug!("pending count poll failed: {err}"),
        }
    }
}

/// Search-input debounce: fires once after `delay` of quiet.
#[derive(Debug, Clone)]
pub struct Debounce {
    delay: Duration,
    last_input: Option<Instant>,
}

impl Debounce {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_input: None,
        }
    }

    /// Record an input event, restarting the timer.
    pub fn touch(&mut self, now: Instant) {
        self.last_input = Some(now);
    }

    pub fn is_pending(&self) -> bool {
        self.last_input.is_some()
    }

    /// True once the quiet period has elapsed; the timer is then cleared.
    pub fn ready(&mut self, now: Instant) -> bool {
        match self.last_input {
            Some(at) if now.duration_since(at) >= self.delay => {
                self.last_input = None;
                true
            }
            _ => false,
        }
    }
}

/// All screen state plus the current route.
pub struct Dashboard {
    pub route: Route,
    pub sidebar: Sidebar,
    pub overview: OverviewScreen,
    pub review: ReviewScreen,
    pub settings: SettingsScreen,
    pub tiktok: HubScreen,
    pub instagram: HubScreen,
    pub x: HubScreen,
    pub personas: PersonasScreen,
    pub library: LibraryScreen,
    pub learning: LearningScreen,
}

impl Dashboard {
    pub fn new(settings: &DashboardSettings, timeframe: Timeframe) -> Self {
        Self {
            route: Route::Overview,
            sidebar: Sidebar::new(settings.pending_poll_interval()),
            overview: OverviewScreen::new(timeframe),
            review: ReviewScreen::default(),
            settings: SettingsScreen::default(),
            tiktok: HubScreen::new(Platform::TikTok),
            instagram: HubScreen::new(Platform::Instagram),
            x: HubScreen::new(Platform::X),
            personas: PersonasScreen::default(),
            library: LibraryScreen::new(settings.search_debounce()),
            learning: LearningScreen::default(),
        }
    }

    pub fn hub(&self, platform: Platform) -> &HubScreen {
        match platform {
            Platform::TikTok => &self.tiktok,
            Platform::Instagram => &self.instagram,
            Platform::X => &self.x,
        }
    }

    pub fn hub_mut(&mut self, platform: Platform) -> &mut HubScreen {
        match platform {
            Platform::TikTok => &mut self.tiktok,
            Platform::Instagram => &mut self.instagram,
            Platform::X => &mut self.x,
        }
    }

    pub fn screen(&self, route: Route) -> &dyn Screen {
        match route {
            Route::Overview => &self.overview,
            Route::ReviewQueue => &self.review,
            Route::Settings => &self.settings,
            Route::TikTokHub => &self.tiktok,
            Route::InstagramHub => &self.instagram,
            Route::XHub => &self.x,
            Route::Personas => &self.personas,
            Route::CommentLibrary => &self.library,
            Route::AiLearning => &self.learning,
        }
    }

    pub fn screen_mut(&mut self, route: Route) -> &mut dyn Screen {
        match route {
            Route::Overview => &mut self.overview,
            Route::ReviewQueue => &mut self.review,
            Route::Settings => &mut self.settings,
            Route::TikTokHub => &mut self.tiktok,
            Route::InstagramHub => &mut self.instagram,
            Route::XHub => &mut self.x,
            Route::Personas => &mut self.personas,
            Route::CommentLibrary => &mut self.library,
            Route::AiLearning => &mut self.learning,
        }
    }

    /// Switch screens. The target refetches on the next tick, as does the
    /// sidebar badge.
    pub fn navigate(&mut self, route: Route) {
        info!("navigate {} -> {}", self.route.path(), route.path());
        self.route = route;
        self.sidebar.cursor = route.index();
        self.sidebar.invalidate();
        self.screen_mut(route).begin_load();
    }

    /// Re-fetch the current screen after an error.
    pub fn retry(&mut self) {
        let route = self.route;
        self.screen_mut(route).begin_load();
    }

    /// Fetch whatever the current screen is waiting on. Returns true if a
    /// request was made.
    pub fn load_current(&mut self, api: &ApiClient) -> bool {
        let route = self.route;
        let screen = self.screen_mut(route);
        if !screen.wants_load() {
            return false;
        }
        screen.load(api);
        true
    }

    pub fn current_error(&self) -> Option<&str> {
        self.screen(self.route).error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_paths_round_trip() {
        for route in Route::ALL {
            assert_eq!(Route::from_path(route.path()), Some(route));
        }
    }

    #[test]
    fn route_parsing_tolerates_slashes() {
        assert_eq!(Route::from_path("review"), Some(Route::ReviewQueue));
        assert_eq!(Route::from_path("/hub/x/"), Some(Route::XHub));
        assert_eq!(Route::from_path("/"), Some(Route::Overview));
        assert_eq!(Route::from_path("/nowhere"), None);
    }

    #[test]
    fn hub_routes_map_to_platforms() {
        for platform in Platform::ALL {
            assert_eq!(Route::hub(platform).platform(), Some(platform));
        }
        assert_eq!(Route::Settings.platform(), None);
    }

    #[test]
    fn test_select_next_empty() {
        let mut selected = 0;
        select_next(&mut selected, 0);
        assert_eq!(selected, 0);
    }

    #[test]
    fn test_select_next_prev_clamps() {
        let mut selected = 0;
        select_next(&mut selected, 3);
        select_next(&mut selected, 3);
        assert_eq!(selected, 2);
        select_next(&mut selected, 3);
        assert_eq!(selected, 2);

        select_prev(&mut selected);
        select_prev(&mut selected);
        assert_eq!(selected, 0);
        select_prev(&mut selected);
        assert_eq!(selected, 0);
    }

    #[test]
    fn clamp_selection_after_shrink() {
        let mut selected = 4;
        clamp_selection(&mut selected, 2);
        assert_eq!(selected, 1);
        clamp_selection(&mut selected, 0);
        assert_eq!(selected, 0);
    }

    #[test]
    fn loadable_from_result() {
        let ok: Loadable<u32> = Loadable::from_result(Ok(3));
        assert_eq!(ok.loaded(), Some(&3));
        let failed: Loadable<u32> = Loadable::from_result(Err(ApiError::Status {
            status: 500,
            detail: "boom".to_string(),
        }));
        assert_eq!(failed.error(), Some("API error 500: boom"));
    }

    #[test]
    fn debounce_fires_once_after_quiet_period() {
        let start = Instant::now();
        let mut debounce = Debounce::new(Duration::from_millis(300));
        assert!(!debounce.ready(start));

        debounce.touch(start);
        assert!(!debounce.ready(start + Duration::from_millis(100)));

        debounce.touch(start + Duration::from_millis(200));
        assert!(!debounce.ready(start + Duration::from_millis(400)));
        assert!(debounce.ready(start + Duration::from_millis(500)));
        assert!(!debounce.ready(start + Duration::from_millis(900)));
        assert!(!debounce.is_pending());
    }

    #[test]
    fn sidebar_polls_when_invalidated_or_stale() {
        let now = Instant::now();
        let mut sidebar = Sidebar::new(Duration::from_secs(30));
        assert!(sidebar.poll_due(now));
        sidebar.last_poll = Some(now);
        assert!(!sidebar.poll_due(now + Duration::from_secs(5)));
        assert!(sidebar.poll_due(now + Duration::from_secs(30)));
        sidebar.invalidate();
        assert!(sidebar.poll_due(now));
    }

    #[test]
    fn navigate_marks_target_for_loading() {
        let mut dashboard = Dashboard::new(&DashboardSettings::default(), Timeframe::Day);
        dashboard.navigate(Route::AiLearning);
        assert_eq!(dashboard.route, Route::AiLearning);
        assert_eq!(dashboard.sidebar.highlighted(), Route::AiLearning);
        assert!(dashboard.screen(Route::AiLearning).wants_load());
        assert!(!dashboard.screen(Route::Personas).wants_load());
    }
}
