use super::{Loadable, Screen};
use crate::api::ApiClient;
use crate::model::{AccuracyTrend, FeedbackExamples, FeedbackStats};

/// AI learning: read-only feedback aggregates.
#[derive(Debug, Default)]
pub struct LearningScreen {
    pub stats: Loadable<FeedbackStats>,
    pub trend: Loadable<AccuracyTrend>,
    pub examples: Loadable<FeedbackExamples>,
}

impl LearningScreen {
    /// Approval rates of the trend (already percentages), oldest first.
    pub fn trend_percentages(&self) -> Vec<u64> {
        self.trend
            .loaded()
            .map(|t| {
                t.trend
                    .iter()
                    .map(|p| p.approval_rate.round().max(0.0) as u64)
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Screen for LearningScreen {
    fn begin_load(&mut self) {
        self.stats = Loadable::Loading;
        self.trend = Loadable::Loading;
        self.examples = Loadable::Loading;
    }

    fn wants_load(&self) -> bool {
        self.stats.is_loading() || self.trend.is_loading() || self.examples.is_loading()
    }

    fn load(&mut self, api: &ApiClient) {
        self.stats = Loadable::from_result(api.feedback_stats());
        self.trend = Loadable::from_result(api.accuracy_trend());
        self.examples = Loadable::from_result(api.feedback_examples());
    }

    fn error(&self) -> Option<&str> {
        self.stats
            .error()
            .or_else(|| self.trend.error())
            .or_else(|| self.examples.error())
    }
}
