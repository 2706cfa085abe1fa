use tracing::info;

use super::{Loadable, Route, Screen, clamp_selection};
use crate::api::ApiClient;
use crate::model::{Overview, PlatformSummary};
use crate::{Platform, Timeframe};

#[derive(Debug)]
pub struct OverviewScreen {
    pub timeframe: Timeframe,
    pub data: Loadable<Overview>,
    pub selected: usize,
}

impl OverviewScreen {
    pub fn new(timeframe: Timeframe) -> Self {
        Self {
            timeframe,
            data: Loadable::Idle,
            selected: 0,
        }
    }

    pub fn summaries(&self) -> &[PlatformSummary] {
        self.data
            .loaded()
            .map(|o| o.platform_summaries.as_slice())
            .unwrap_or(&[])
    }

    pub fn select_next(&mut self) {
        let len = self.summaries().len();
        super::select_next(&mut self.selected, len);
    }

    pub fn select_prev(&mut self) {
        super::select_prev(&mut self.selected);
    }

    pub fn cycle_timeframe(&mut self) {
        self.timeframe = self.timeframe.next();
        self.begin_load();
    }

    /// Hub route for the highlighted platform summary.
    pub fn drill_in(&self) -> Option<Route> {
        let summary = self.summaries().get(self.selected)?;
        summary.platform.parse::<Platform>().ok().map(Route::hub)
    }
}

impl Screen for OverviewScreen {
    fn begin_load(&mut self) {
        self.data = Loadable::Loading;
    }

    fn wants_load(&self) -> bool {
        self.data.is_loading()
    }

    fn load(&mut self, api: &ApiClient) {
        info!("loading overview ({})", self.timeframe.as_str());
        self.data = Loadable::from_result(api.overview(self.timeframe));
        let len = self.summaries().len();
        clamp_selection(&mut self.selected, len);
    }

    fn error(&self) -> Option<&str> {
        self.data.error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(platform: &str) -> PlatformSummary {
        PlatformSummary {
            platform: platform.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn drill_in_maps_platform_to_hub() {
        let mut screen = OverviewScreen::new(Timeframe::Day);
        screen.data = Loadable::Loaded(Overview {
            platform_summaries: vec![summary("TikTok"), summary("twitter"), summary("myspace")],
            ..Default::default()
        });
        assert_eq!(screen.drill_in(), Some(Route::TikTokHub));
        screen.select_next();
        assert_eq!(screen.drill_in(), Some(Route::XHub));
        screen.select_next();
        assert_eq!(screen.drill_in(), None);
    }

    #[test]
    fn timeframe_cycle_reloads() {
        let mut screen = OverviewScreen::new(Timeframe::Month);
        screen.cycle_timeframe();
        assert_eq!(screen.timeframe, Timeframe::Day);
        assert!(screen.wants_load());
    }
}
