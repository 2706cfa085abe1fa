pub mod ai;
pub mod api;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod logging;
pub mod model;
pub mod state;
pub mod tui;
pub mod twitter;

use std::fmt;
use std::str::FromStr;

/// Social platforms the backend monitors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    TikTok,
    Instagram,
    X,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::TikTok, Platform::Instagram, Platform::X];

    /// Path segment used by the backend (`/hubs/{platform}/stats`).
    pub fn slug(self) -> &'static str {
        match self {
            Platform::TikTok => "tiktok",
            Platform::Instagram => "instagram",
            Platform::X => "x",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Platform::TikTok => "TikTok",
            Platform::Instagram => "Instagram",
            Platform::X => "X / Twitter",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tiktok" => Ok(Platform::TikTok),
            "instagram" => Ok(Platform::Instagram),
            "x" | "twitter" | "x / twitter" => Ok(Platform::X),
            other => Err(format!("unknown platform: {other}")),
        }
    }
}

/// Reporting window for the overview screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Timeframe {
    #[default]
    Day,
    Week,
    Month,
}

impl Timeframe {
    pub fn as_str(self) -> &'static str {
        match self {
            Timeframe::Day => "24h",
            Timeframe::Week => "7d",
            Timeframe::Month => "30d",
        }
    }

    /// Cycle 24h -> 7d -> 30d -> 24h.
    pub fn next(self) -> Self {
        match self {
            Timeframe::Day => Timeframe::Week,
            Timeframe::Week => Timeframe::Month,
            Timeframe::Month => Timeframe::Day,
        }
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "24h" => Ok(Timeframe::Day),
            "7d" => Ok(Timeframe::Week),
            "30d" => Ok(Timeframe::Month),
            other => Err(format!("unknown timeframe: {other}")),
        }
    }
}
