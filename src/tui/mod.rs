mod render;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::fmt::Display;
use std::io;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::Platform;
use crate::api::{ApiClient, ApiError};
use crate::dashboard::{Dashboard, HubFocus, Route, Screen, SettingsTab};
use crate::state::LocalStore;

const STATUS_TTL: Duration = Duration::from_secs(3);
const TICK: Duration = Duration::from_millis(200);

/// Actions that need a y/n before they hit the backend.
#[derive(Debug, Clone, PartialEq)]
enum ConfirmAction {
    KillSwitch { active: bool },
    Disconnect(Platform),
    RemovePost,
}

/// What a text prompt's contents are used for on Enter.
#[derive(Debug, Clone, PartialEq)]
enum InputPurpose {
    EditReview,
    RejectReason,
    PostDraft,
    KillSwitchReason,
    OAuthCode,
    VoiceTest,
    UploadPath,
    PersonaDocument,
    PersonaName { document: String },
}

impl InputPurpose {
    fn title(&self) -> &'static str {
        match self {
            InputPurpose::EditReview => "Edit reply (Enter approves)",
            InputPurpose::RejectReason => "Reject reason (optional)",
            InputPurpose::PostDraft => "Draft comment",
            InputPurpose::KillSwitchReason => "Kill switch reason (optional)",
            InputPurpose::OAuthCode => "OAuth authorization code",
            InputPurpose::VoiceTest => "Post text to test the voice against",
            InputPurpose::UploadPath => "Path of document to upload",
            InputPurpose::PersonaDocument => "Path of document to build a persona from",
            InputPurpose::PersonaName { .. } => "Name for the new persona",
        }
    }
}

#[derive(Debug, Clone)]
struct InputPrompt {
    purpose: InputPurpose,
    buffer: String,
}

/// Application state for the dashboard TUI.
pub struct App {
    api: ApiClient,
    store: LocalStore,
    pub dashboard: Dashboard,
    should_quit: bool,
    show_help: bool,
    searching: bool,
    input: Option<InputPrompt>,
    confirm_action: Option<ConfirmAction>,
    status_message: Option<(String, Instant)>,
}

impl App {
    /// Build the app, opening `start` (or the last stored screen, or Overview).
    pub fn new(api: ApiClient, store: LocalStore, mut dashboard: Dashboard, start: Option<Route>) -> Self {
        let route = start
            .or_else(|| store.last_route().ok().flatten())
            .unwrap_or_default();
        dashboard.navigate(route);
        Self {
            api,
            store,
            dashboard,
            should_quit: false,
            show_help: false,
            searching: false,
            input: None,
            confirm_action: None,
            status_message: None,
        }
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some((message.into(), Instant::now()));
    }

    /// Report the outcome of a backend action on the status line.
    fn report<T, E: Display>(&mut self, what: &str, result: std::result::Result<T, E>) -> Option<T> {
        match result {
            Ok(value) => {
                self.set_status(format!("{what}: done"));
                Some(value)
            }
            Err(err) => {
                warn!("{what} failed: {err}");
                self.set_status(format!("{what} failed: {err}"));
                None
            }
        }
    }

    fn navigate(&mut self, route: Route) {
        self.searching = false;
        self.dashboard.navigate(route);
        if let Err(err) = self.store.set_last_route(route) {
            warn!("could not persist last screen: {err}");
        }
    }

    fn navigate_offset(&mut self, forward: bool) {
        let len = Route::ALL.len();
        let current = Route::ALL
            .iter()
            .position(|r| *r == self.dashboard.route)
            .unwrap_or(0);
        let next = if forward {
            (current + 1) % len
        } else {
            (current + len - 1) % len
        };
        self.navigate(Route::ALL[next]);
    }

    fn prompt(&mut self, purpose: InputPurpose, initial: &str) {
        self.input = Some(InputPrompt {
            purpose,
            buffer: initial.to_string(),
        });
    }

    /// Handle keyboard input, dispatching to the appropriate handler.
    fn handle_input(&mut self, key: KeyEvent) -> Result<()> {
        if let Some(action) = self.confirm_action.take() {
            if matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y')) {
                self.confirm(action);
            }
            return Ok(());
        }

        if self.input.is_some() {
            self.handle_prompt_input(key);
            return Ok(());
        }

        if self.show_help {
            self.show_help = false;
            return Ok(());
        }

        if self.searching {
            self.handle_search_input(key);
            return Ok(());
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Tab => self.navigate_offset(true),
            KeyCode::BackTab => self.navigate_offset(false),
            KeyCode::Char(c @ '1'..='9') => {
                let index = c as usize - '1' as usize;
                if let Some(route) = Route::ALL.get(index) {
                    self.navigate(*route);
                }
            }
            KeyCode::Char('r') => {
                self.dashboard.retry();
                self.dashboard.sidebar.invalidate();
            }
            _ => self.handle_screen_input(key),
        }
        Ok(())
    }

    fn handle_prompt_input(&mut self, key: KeyEvent) {
        let Some(prompt) = self.input.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc => self.input = None,
            KeyCode::Backspace => {
                prompt.buffer.pop();
            }
            KeyCode::Char(c) => prompt.buffer.push(c),
            KeyCode::Enter => {
                if let Some(prompt) = self.input.take() {
                    self.submit(prompt);
                }
            }
            _ => {}
        }
    }

    fn handle_search_input(&mut self, key: KeyEvent) {
        let now = Instant::now();
        match key.code {
            KeyCode::Esc | KeyCode::Enter => self.searching = false,
            KeyCode::Backspace => self.dashboard.library.pop_search_char(now),
            KeyCode::Char(c) => self.dashboard.library.push_search_char(c, now),
            _ => {}
        }
    }

    fn handle_screen_input(&mut self, key: KeyEvent) {
        match self.dashboard.route {
            Route::Overview => self.handle_overview_input(key),
            Route::ReviewQueue => self.handle_review_input(key),
            Route::Settings => self.handle_settings_input(key),
            Route::TikTokHub | Route::InstagramHub | Route::XHub => self.handle_hub_input(key),
            Route::Personas => self.handle_personas_input(key),
            Route::CommentLibrary => self.handle_library_input(key),
            Route::AiLearning => {}
        }
    }

    fn handle_overview_input(&mut self, key: KeyEvent) {
        let overview = &mut self.dashboard.overview;
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => overview.select_next(),
            KeyCode::Char('k') | KeyCode::Up => overview.select_prev(),
            KeyCode::Char('t') => overview.cycle_timeframe(),
            KeyCode::Enter => {
                if let Some(route) = overview.drill_in() {
                    self.navigate(route);
                }
            }
            _ => {}
        }
    }

    fn handle_review_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down | KeyCode::Char('n') => self.dashboard.review.next(),
            KeyCode::Char('k') | KeyCode::Up | KeyCode::Char('p') => self.dashboard.review.prev(),
            KeyCode::Char('a') => {
                let result = self.dashboard.review.approve(&self.api);
                if let Some(Some(_)) = self.report("Approve", result) {
                    self.dashboard.sidebar.invalidate();
                }
            }
            KeyCode::Char('x') => {
                if self.dashboard.review.current().is_some() {
                    self.prompt(InputPurpose::RejectReason, "");
                }
            }
            KeyCode::Char('e') => {
                if let Some(text) = self.dashboard.review.current().map(|i| i.proposed_text.clone()) {
                    self.prompt(InputPurpose::EditReview, &text);
                }
            }
            KeyCode::Char('g') => {
                let result = self.dashboard.review.regenerate(&self.api);
                self.report("Regenerate draft", result);
            }
            _ => {}
        }
    }

    fn handle_settings_input(&mut self, key: KeyEvent) {
        let settings = &mut self.dashboard.settings;
        let tab = settings.tab;
        match key.code {
            KeyCode::Char('l') | KeyCode::Right => settings.switch_tab(tab.next()),
            KeyCode::Char('h') | KeyCode::Left => settings.switch_tab(tab.prev()),
            KeyCode::Char('j') | KeyCode::Down => settings.select_next(),
            KeyCode::Char('k') | KeyCode::Up => settings.select_prev(),
            _ => match tab {
                SettingsTab::Connections => self.handle_connections_input(key),
                SettingsTab::Voice if key.code == KeyCode::Char('v') => {
                    self.prompt(InputPurpose::VoiceTest, "");
                }
                SettingsTab::Knowledge if key.code == KeyCode::Char('u') => {
                    self.prompt(InputPurpose::UploadPath, "");
                }
                SettingsTab::Execution if key.code == KeyCode::Char('K') => {
                    let active = self
                        .dashboard
                        .settings
                        .kill_switch()
                        .is_some_and(|k| k.active);
                    self.confirm_action = Some(ConfirmAction::KillSwitch { active: !active });
                }
                _ => {}
            },
        }
    }

    fn handle_connections_input(&mut self, key: KeyEvent) {
        let platform = self.dashboard.settings.selected_platform();
        match key.code {
            KeyCode::Char('c') => {
                let result = self.dashboard.settings.connect_selected(&self.api);
                self.report(&format!("Connect {}", platform.display_name()), result);
            }
            KeyCode::Char('d') => self.confirm_action = Some(ConfirmAction::Disconnect(platform)),
            KeyCode::Char('t') => {
                let result = self
                    .dashboard
                    .settings
                    .test_selected(&self.api)
                    .map(|t| t.healthy);
                match result {
                    Ok(healthy) => self.set_status(format!(
                        "{} connection {}",
                        platform.display_name(),
                        if healthy { "healthy" } else { "unhealthy" }
                    )),
                    Err(err) => {
                        self.report::<(), ApiError>("Connection test", Err(err));
                    }
                }
            }
            KeyCode::Char('o') => self.prompt(InputPurpose::OAuthCode, ""),
            _ => {}
        }
    }

    fn handle_hub_input(&mut self, key: KeyEvent) {
        let Some(platform) = self.dashboard.route.platform() else {
            return;
        };
        let hub = self.dashboard.hub_mut(platform);
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => hub.select_next(),
            KeyCode::Char('k') | KeyCode::Up => hub.select_prev(),
            KeyCode::Char('f') => hub.toggle_focus(),
            KeyCode::Char('F') if hub.has_review_posts() => hub.cycle_filter(),
            KeyCode::Char('a') => match hub.focus {
                HubFocus::Drafts => {
                    let result = hub.approve_draft(&self.api);
                    if let Some(Some(_)) = self.report("Approve draft", result) {
                        self.dashboard.sidebar.invalidate();
                    }
                }
                HubFocus::Posts => {
                    let result = hub.approve_post(&self.api, None);
                    self.report("Approve post", result);
                }
            },
            KeyCode::Char('x') if hub.focus == HubFocus::Drafts => {
                let result = hub.reject_draft(&self.api);
                if let Some(Some(_)) = self.report("Reject draft", result) {
                    self.dashboard.sidebar.invalidate();
                }
            }
            KeyCode::Char('e') if hub.focus == HubFocus::Posts => {
                if let Some(draft) = hub
                    .selected_post()
                    .map(|p| p.draft_comment.clone().unwrap_or_default())
                {
                    self.prompt(InputPurpose::PostDraft, &draft);
                }
            }
            KeyCode::Char('D') if hub.focus == HubFocus::Posts && hub.selected_post().is_some() => {
                self.confirm_action = Some(ConfirmAction::RemovePost);
            }
            _ => {}
        }
    }

    fn handle_personas_input(&mut self, key: KeyEvent) {
        let personas = &mut self.dashboard.personas;
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => personas.select_next(),
            KeyCode::Char('k') | KeyCode::Up => personas.select_prev(),
            KeyCode::Char('+') | KeyCode::Char('=') | KeyCode::Right => personas.raise_temperature(),
            KeyCode::Char('-') | KeyCode::Left => personas.lower_temperature(),
            KeyCode::Char(' ') => personas.toggle_active(),
            KeyCode::Char('s') => {
                let result = personas.save_current(&self.api);
                self.report("Save persona", result);
            }
            KeyCode::Char('g') => self.prompt(InputPurpose::PersonaDocument, ""),
            _ => {}
        }
    }

    fn handle_library_input(&mut self, key: KeyEvent) {
        let library = &mut self.dashboard.library;
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => library.select_next(),
            KeyCode::Char('k') | KeyCode::Up => library.select_prev(),
            KeyCode::Char('c') => library.cycle_category(),
            KeyCode::Char('n') | KeyCode::Char(']') => library.next_page(),
            KeyCode::Char('p') | KeyCode::Char('[') => library.prev_page(),
            KeyCode::Char('/') => self.searching = true,
            _ => {}
        }
    }

    fn confirm(&mut self, action: ConfirmAction) {
        match action {
            ConfirmAction::KillSwitch { active: true } => {
                self.prompt(InputPurpose::KillSwitchReason, "");
            }
            ConfirmAction::KillSwitch { active: false } => {
                let result = self
                    .dashboard
                    .settings
                    .set_kill_switch(&self.api, false, None);
                self.report("Resume posting", result);
            }
            ConfirmAction::Disconnect(platform) => {
                let result = self.dashboard.settings.disconnect_selected(&self.api);
                self.report(&format!("Disconnect {}", platform.display_name()), result);
            }
            ConfirmAction::RemovePost => {
                let result = self.dashboard.x.remove_post(&self.api);
                self.report("Remove post", result);
            }
        }
    }

    fn submit(&mut self, prompt: InputPrompt) {
        let text = prompt.buffer;
        match prompt.purpose {
            InputPurpose::EditReview => {
                if text.trim().is_empty() {
                    self.set_status("Edited reply is empty; nothing sent");
                    return;
                }
                let result = self.dashboard.review.edit(&self.api, &text);
                if let Some(Some(_)) = self.report("Approve edited reply", result) {
                    self.dashboard.sidebar.invalidate();
                }
            }
            InputPurpose::RejectReason => {
                let result = self.dashboard.review.reject(&self.api, Some(text));
                if let Some(Some(_)) = self.report("Reject", result) {
                    self.dashboard.sidebar.invalidate();
                }
            }
            InputPurpose::PostDraft => {
                let result = self.dashboard.x.save_post_draft(&self.api, &text);
                self.report("Save draft", result);
            }
            InputPurpose::KillSwitchReason => {
                let reason = Some(text).filter(|r| !r.trim().is_empty());
                let result = self
                    .dashboard
                    .settings
                    .set_kill_switch(&self.api, true, reason);
                self.report("Kill switch", result);
            }
            InputPurpose::OAuthCode => {
                let result = self
                    .dashboard
                    .settings
                    .submit_oauth_code(&self.api, &text, None);
                self.report("OAuth callback", result);
            }
            InputPurpose::VoiceTest => {
                let result = self.dashboard.settings.run_voice_test(&self.api, &text);
                self.report("Voice test", result);
            }
            InputPurpose::UploadPath => self.upload(text.trim()),
            InputPurpose::PersonaDocument => match std::fs::read_to_string(text.trim()) {
                Ok(document) => self.prompt(InputPurpose::PersonaName { document }, ""),
                Err(err) => self.set_status(format!("Cannot read {}: {err}", text.trim())),
            },
            InputPurpose::PersonaName { document } => {
                let name = if text.trim().is_empty() {
                    "New Persona"
                } else {
                    text.trim()
                };
                let result = self.dashboard.personas.generate(&self.api, name, &document);
                self.report("Generate persona", result);
            }
        }
    }

    fn upload(&mut self, path: &str) {
        let path = Path::new(path);
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if filename.is_empty() {
            self.set_status("Upload needs a file path");
            return;
        }
        match std::fs::read(path) {
            Ok(bytes) => {
                let result = self
                    .dashboard
                    .settings
                    .upload_knowledge(&self.api, &filename, &bytes);
                self.report(&format!("Upload {filename}"), result);
            }
            Err(err) => self.set_status(format!("Cannot read {}: {err}", path.display())),
        }
    }

    /// Background work for one loop iteration: badge polling, the library
    /// search debounce, and the current screen's pending fetch. Returns true
    /// when a screen fetch happened.
    fn tick(&mut self, now: Instant) -> bool {
        if self.dashboard.sidebar.poll_due(now) {
            self.dashboard.sidebar.refresh_pending(&self.api, now);
        }
        if self.dashboard.route == Route::CommentLibrary {
            self.dashboard.library.tick(now);
        }
        let fetched = self.dashboard.load_current(&self.api);
        if fetched && let Some(err) = self.dashboard.current_error() {
            warn!("{} failed to load: {err}", self.dashboard.route.path());
        }
        fetched
    }

    fn expire_status(&mut self) {
        let expired = self
            .status_message
            .as_ref()
            .is_some_and(|(_, time)| time.elapsed() >= STATUS_TTL);
        if expired {
            self.status_message = None;
        }
    }

    fn current_screen(&self) -> &dyn Screen {
        self.dashboard.screen(self.dashboard.route)
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).context("Failed to create terminal")
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;
    Ok(())
}

pub fn run_tui(mut app: App) -> Result<()> {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic_info);
    }));

    let mut terminal = setup_terminal()?;
    info!("dashboard started against {}", app.api.base_url());

    let result = (|| -> Result<()> {
        loop {
            app.expire_status();
            terminal
                .draw(|f| app.render(f))
                .context("Failed to draw frame")?;

            if app.should_quit {
                break;
            }

            // Redraw straight away so a finished fetch replaces "Loading".
            if app.tick(Instant::now()) {
                continue;
            }

            if event::poll(TICK).context("Failed to poll events")?
                && let Event::Key(key) = event::read().context("Failed to read event")?
                && key.kind == event::KeyEventKind::Press
            {
                app.handle_input(key)?;
            }
        }
        Ok(())
    })();

    restore_terminal(&mut terminal)?;

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Timeframe;
    use crate::config::{ApiSettings, DashboardSettings};
    use crossterm::event::KeyModifiers;

    fn app() -> App {
        let api = ApiClient::new(
            &ApiSettings {
                base_url: "http://127.0.0.1:9".to_string(),
                timeout_secs: 1,
            },
            None,
        );
        let dashboard = Dashboard::new(&DashboardSettings::default(), Timeframe::Day);
        App::new(api, LocalStore::in_memory().unwrap(), dashboard, None)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn starts_on_stored_route() {
        let mut store = LocalStore::in_memory().unwrap();
        store.set_last_route(Route::Personas).unwrap();
        let api = ApiClient::new(&ApiSettings::default(), None);
        let dashboard = Dashboard::new(&DashboardSettings::default(), Timeframe::Day);
        let app = App::new(api, store, dashboard, None);
        assert_eq!(app.dashboard.route, Route::Personas);
    }

    #[test]
    fn digit_keys_jump_and_persist() {
        let mut app = app();
        app.handle_input(key(KeyCode::Char('2'))).unwrap();
        assert_eq!(app.dashboard.route, Route::ReviewQueue);
        assert_eq!(app.store.last_route().unwrap(), Some(Route::ReviewQueue));
    }

    #[test]
    fn tab_wraps_around_sidebar() {
        let mut app = app();
        app.handle_input(key(KeyCode::BackTab)).unwrap();
        assert_eq!(app.dashboard.route, Route::AiLearning);
        app.handle_input(key(KeyCode::Tab)).unwrap();
        assert_eq!(app.dashboard.route, Route::Overview);
    }

    #[test]
    fn confirm_is_cancelled_by_other_keys() {
        let mut app = app();
        app.confirm_action = Some(ConfirmAction::RemovePost);
        app.handle_input(key(KeyCode::Char('n'))).unwrap();
        assert!(app.confirm_action.is_none());
        assert!(!app.should_quit);
    }

    #[test]
    fn prompt_collects_text_and_escape_discards() {
        let mut app = app();
        app.prompt(InputPurpose::VoiceTest, "ab");
        app.handle_input(key(KeyCode::Char('c'))).unwrap();
        app.handle_input(key(KeyCode::Backspace)).unwrap();
        app.handle_input(key(KeyCode::Backspace)).unwrap();
        assert_eq!(app.input.as_ref().map(|p| p.buffer.as_str()), Some("a"));
        app.handle_input(key(KeyCode::Esc)).unwrap();
        assert!(app.input.is_none());
        assert!(!app.should_quit);
    }

    #[test]
    fn library_search_mode_captures_letters() {
        let mut app = app();
        app.navigate(Route::CommentLibrary);
        app.handle_input(key(KeyCode::Char('/'))).unwrap();
        app.handle_input(key(KeyCode::Char('q'))).unwrap();
        assert!(!app.should_quit);
        assert_eq!(app.dashboard.library.search_input, "q");
        app.handle_input(key(KeyCode::Enter)).unwrap();
        app.handle_input(key(KeyCode::Char('q'))).unwrap();
        assert!(app.should_quit);
    }
}
