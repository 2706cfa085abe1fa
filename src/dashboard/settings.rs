use tracing::{info, warn};

use super::{Loadable, Screen, clamp_selection};
use crate::Platform;
use crate::api::{ApiClient, Result};
use crate::model::{
    Connection, ConnectionTest, ExecutionStatus, KillSwitch, SettingsFile, VoiceConfig,
    VoiceTestCandidate,
};

/// Settings section whose uploaded documents seed persona generation.
pub const KNOWLEDGE_SECTION: &str = "knowledge";

const DEFAULT_AUTH_METHOD: &str = "oauth";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SettingsTab {
    #[default]
    Connections,
    Voice,
    Knowledge,
    Execution,
}

impl SettingsTab {
    pub const ALL: [SettingsTab; 4] = [
        SettingsTab::Connections,
        SettingsTab::Voice,
        SettingsTab::Knowledge,
        SettingsTab::Execution,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SettingsTab::Connections => "Connections",
            SettingsTab::Voice => "Brand Voice",
            SettingsTab::Knowledge => "Knowledge",
            SettingsTab::Execution => "Execution",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Settings with four tabs; only the visible tab is fetched.
#[derive(Debug, Default)]
pub struct SettingsScreen {
    pub tab: SettingsTab,
    pub connections: Loadable<Vec<Connection>>,
    /// Cursor over [`Platform::ALL`] on the connections tab.
    pub platform_selected: usize,
    /// Authorization URL returned by the last OAuth connect, shown to the operator.
    pub pending_auth_url: Option<String>,
    pub last_test: Option<ConnectionTest>,
    pub voice: Loadable<VoiceConfig>,
    pub voice_test: Option<Vec<VoiceTestCandidate>>,
    pub files: Loadable<Vec<SettingsFile>>,
    pub file_selected: usize,
    pub execution: Loadable<ExecutionStatus>,
}

impl SettingsScreen {
    pub fn switch_tab(&mut self, tab: SettingsTab) {
        self.tab = tab;
        self.begin_load();
    }

    pub fn selected_platform(&self) -> Platform {
        Platform::ALL[self.platform_selected.min(Platform::ALL.len() - 1)]
    }

    pub fn connection(&self, platform: Platform) -> Option<&Connection> {
        self.connections
            .loaded()?
            .iter()
            .find(|c| c.platform.parse::<Platform>().ok() == Some(platform))
    }

    pub fn select_next(&mut self) {
        match self.tab {
            SettingsTab::Connections => {
                super::select_next(&mut self.platform_selected, Platform::ALL.len())
            }
            SettingsTab::Knowledge => {
                let len = self.files.loaded().map(Vec::len).unwrap_or(0);
                super::select_next(&mut self.file_selected, len)
            }
            _ => {}
        }
    }

    pub fn select_prev(&mut self) {
        match self.tab {
            SettingsTab::Connections => super::select_prev(&mut self.platform_selected),
            SettingsTab::Knowledge => super::select_prev(&mut self.file_selected),
            _ => {}
        }
    }

    pub fn kill_switch(&self) -> Option<&KillSwitch> {
        self.execution.loaded().map(|e| &e.kill_switch)
    }

    // --- Connections ---

    /// Start connecting the selected platform. An OAuth flow leaves its
    /// authorization URL in `pending_auth_url`; anything else refetches.
    pub fn connect_selected(&mut self, api: &ApiClient) -> Result<()> {
        let platform = self.selected_platform();
        let response = api
            .connect(platform, DEFAULT_AUTH_METHOD)
            .inspect_err(|err| warn!("connect {platform} failed: {err}"))?;
        info!("connect {platform}: {:?}", response.status);
        self.pending_auth_url = response.auth_url;
        if self.pending_auth_url.is_none() {
            self.connections = Loadable::Loading;
        }
        Ok(())
    }

    pub fn disconnect_selected(&mut self, api: &ApiClient) -> Result<()> {
        let platform = self.selected_platform();
        api.disconnect(platform)
            .inspect_err(|err| warn!("disconnect {platform} failed: {err}"))?;
        info!("disconnected {platform}");
        if let Some(connections) = self.connections.loaded_mut() {
            for conn in connections
                .iter_mut()
                .filter(|c| c.platform.parse::<Platform>().ok() == Some(platform))
            {
                conn.connected = false;
                conn.status = "disconnected".to_string();
                conn.workers_status.clear();
            }
        }
        Ok(())
    }

    pub fn test_selected(&mut self, api: &ApiClient) -> Result<&ConnectionTest> {
        let platform = self.selected_platform();
        let test = api.test_connection(platform)?;
        info!("connection test {platform}: healthy={}", test.healthy);
        Ok(self.last_test.insert(test))
    }

    /// Finish an OAuth flow with the code the provider redirected with.
    pub fn submit_oauth_code(&mut self, api: &ApiClient, code: &str, state: Option<&str>) -> Result<()> {
        let platform = self.selected_platform();
        api.oauth_callback(platform, code.trim(), state)
            .inspect_err(|err| warn!("oauth callback {platform} failed: {err}"))?;
        self.pending_auth_url = None;
        self.connections = Loadable::Loading;
        Ok(())
    }

    // --- Brand voice ---

    pub fn run_voice_test(&mut self, api: &ApiClient, video_context: &str) -> Result<usize> {
        let response = api.test_voice(video_context)?;
        let count = response.candidates.len();
        self.voice_test = Some(response.candidates);
        Ok(count)
    }

    // --- Knowledge ---

    pub fn upload_knowledge(&mut self, api: &ApiClient, filename: &str, contents: &[u8]) -> Result<()> {
        let file = api
            .upload_settings_file(KNOWLEDGE_SECTION, filename, contents)
            .inspect_err(|err| warn!("upload {filename} failed: {err}"))?;
        info!("uploaded {} ({} bytes)", file.filename, contents.len());
        if let Some(files) = self.files.loaded_mut() {
            files.push(file);
        } else {
            self.files = Loadable::Loaded(vec![file]);
        }
        Ok(())
    }

    // --- Execution ---

    pub fn set_kill_switch(&mut self, api: &ApiClient, active: bool, reason: Option<String>) -> Result<()> {
        let ack = api
            .set_kill_switch(active, reason)
            .inspect_err(|err| warn!("kill switch update failed: {err}"))?;
        info!("kill switch now {}", if ack.kill_switch.active { "on" } else { "off" });
        if let Some(execution) = self.execution.loaded_mut() {
            execution.kill_switch = ack.kill_switch;
        }
        Ok(())
    }
}

impl Screen for SettingsScreen {
    fn begin_load(&mut self) {
        match self.tab {
            SettingsTab::Connections => self.connections = Loadable::Loading,
            SettingsTab::Voice => self.voice = Loadable::Loading,
            SettingsTab::Knowledge => self.files = Loadable::Loading,
            SettingsTab::Execution => self.execution = Loadable::Loading,
        }
    }

    fn wants_load(&self) -> bool {
        match self.tab {
            SettingsTab::Connections => self.connections.is_loading(),
            SettingsTab::Voice => self.voice.is_loading(),
            SettingsTab::Knowledge => self.files.is_loading(),
            SettingsTab::Execution => self.execution.is_loading(),
        }
    }

    fn load(&mut self, api: &ApiClient) {
        match self.tab {
            SettingsTab::Connections => {
                self.connections = Loadable::from_result(api.connections());
            }
            SettingsTab::Voice => self.voice = Loadable::from_result(api.voice_config()),
            SettingsTab::Knowledge => {
                self.files = Loadable::from_result(api.settings_files(KNOWLEDGE_SECTION));
                let len = self.files.loaded().map(Vec::len).unwrap_or(0);
                clamp_selection(&mut self.file_selected, len);
            }
            SettingsTab::Execution => {
                self.execution = Loadable::from_result(api.execution_status());
            }
        }
    }

    fn error(&self) -> Option<&str> {
        match self.tab {
            SettingsTab::Connections => self.connections.error(),
            SettingsTab::Voice => self.voice.error(),
            SettingsTab::Knowledge => self.files.error(),
            SettingsTab::Execution => self.execution.error(),
        }
    }
}
