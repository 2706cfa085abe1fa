use tracing::{info, warn};

use super::{Loadable, Screen, clamp_selection};
use crate::Platform;
use crate::api::{ApiClient, Result};
use crate::model::{
    DecisionAck, DecisionRequest, HubDraft, HubStats, PostFilter, PostStatus, ReviewPost,
};

/// Which list on a hub has the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HubFocus {
    #[default]
    Drafts,
    Posts,
}

/// Per-platform hub. The X hub additionally shows discovered review posts.
#[derive(Debug)]
pub struct HubScreen {
    pub platform: Platform,
    pub stats: Loadable<HubStats>,
    pub draft_selected: usize,
    pub posts: Loadable<Vec<ReviewPost>>,
    pub post_filter: PostFilter,
    pub post_selected: usize,
    pub focus: HubFocus,
}

impl HubScreen {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            stats: Loadable::Idle,
            draft_selected: 0,
            posts: Loadable::Idle,
            post_filter: PostFilter::default(),
            post_selected: 0,
            focus: HubFocus::Drafts,
        }
    }

    pub fn has_review_posts(&self) -> bool {
        self.platform == Platform::X
    }

    pub fn drafts(&self) -> &[HubDraft] {
        self.stats.loaded().map(|s| s.drafts.as_slice()).unwrap_or(&[])
    }

    pub fn selected_draft(&self) -> Option<&HubDraft> {
        self.drafts().get(self.draft_selected)
    }

    pub fn review_posts(&self) -> &[ReviewPost] {
        self.posts.loaded().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn selected_post(&self) -> Option<&ReviewPost> {
        self.review_posts().get(self.post_selected)
    }

    pub fn toggle_focus(&mut self) {
        if self.has_review_posts() {
            self.focus = match self.focus {
                HubFocus::Drafts => HubFocus::Posts,
                HubFocus::Posts => HubFocus::Drafts,
            };
        }
    }

    pub fn select_next(&mut self) {
        match self.focus {
            HubFocus::Drafts => {
                let len = self.drafts().len();
                super::select_next(&mut self.draft_selected, len)
            }
            HubFocus::Posts => {
                let len = self.review_posts().len();
                super::select_next(&mut self.post_selected, len)
            }
        }
    }

    pub fn select_prev(&mut self) {
        match self.focus {
            HubFocus::Drafts => super::select_prev(&mut self.draft_selected),
            HubFocus::Posts => super::select_prev(&mut self.post_selected),
        }
    }

    // --- Drafts (review-queue items surfaced on the hub) ---

    pub fn approve_draft(&mut self, api: &ApiClient) -> Result<Option<DecisionAck>> {
        self.decide_draft(api, DecisionRequest::approve())
    }

    pub fn reject_draft(&mut self, api: &ApiClient) -> Result<Option<DecisionAck>> {
        self.decide_draft(api, DecisionRequest::reject(None))
    }

    fn decide_draft(
        &mut self,
        api: &ApiClient,
        request: DecisionRequest,
    ) -> Result<Option<DecisionAck>> {
        let Some(id) = self.selected_draft().map(|d| d.id.clone()) else {
            return Ok(None);
        };
        let ack = api.decide(&id, &request).inspect_err(|err| {
            warn!("{} hub: decision on draft {id} failed: {err}", self.platform);
        })?;
        info!("{} hub: draft {id} {:?}", self.platform, request.decision);
        if let Some(stats) = self.stats.loaded_mut() {
            stats.drafts.retain(|d| d.id != id);
            let len = stats.drafts.len();
            clamp_selection(&mut self.draft_selected, len);
        }
        Ok(Some(ack))
    }

    // --- Review posts ---

    /// Cycle the status filter and refetch the posts panel.
    pub fn cycle_filter(&mut self) {
        self.post_filter = self.post_filter.next();
        self.post_selected = 0;
        self.posts = Loadable::Loading;
    }

    pub fn load_posts(&mut self, api: &ApiClient) {
        self.posts = Loadable::from_result(api.review_posts(self.post_filter));
        let len = self.review_posts().len();
        clamp_selection(&mut self.post_selected, len);
    }

    /// Store a draft comment on the selected post.
    pub fn save_post_draft(&mut self, api: &ApiClient, comment: &str) -> Result<bool> {
        let Some(id) = self.selected_post().map(|p| p.id.clone()) else {
            return Ok(false);
        };
        api.save_post_draft(&id, comment)
            .inspect_err(|err| warn!("saving draft for post {id} failed: {err}"))?;
        self.patch_post(&id, |post| {
            post.draft_comment = Some(comment.to_string());
            post.status = PostStatus::Draft;
        });
        Ok(true)
    }

    /// Approve the selected post with its draft comment (or `comment` if given).
    pub fn approve_post(&mut self, api: &ApiClient, comment: Option<&str>) -> Result<bool> {
        let Some(post) = self.selected_post() else {
            return Ok(false);
        };
        let id = post.id.clone();
        let comment = comment
            .map(str::to_string)
            .or_else(|| post.draft_comment.clone())
            .unwrap_or_default();
        api.approve_post(&id, &comment)
            .inspect_err(|err| warn!("approving post {id} failed: {err}"))?;
        self.patch_post(&id, |post| {
            post.draft_comment = Some(comment.clone());
            post.status = PostStatus::Approved;
        });
        Ok(true)
    }

    pub fn remove_post(&mut self, api: &ApiClient) -> Result<bool> {
        let Some(id) = self.selected_post().map(|p| p.id.clone()) else {
            return Ok(false);
        };
        api.remove_post(&id)
            .inspect_err(|err| warn!("removing post {id} failed: {err}"))?;
        if let Some(posts) = self.posts.loaded_mut() {
            posts.retain(|p| p.id != id);
        }
        let len = self.review_posts().len();
        clamp_selection(&mut self.post_selected, len);
        Ok(true)
    }

    /// Apply `update` to a post, dropping it if it no longer matches the filter.
    fn patch_post(&mut self, id: &str, update: impl FnOnce(&mut ReviewPost)) {
        let filter = self.post_filter;
        if let Some(posts) = self.posts.loaded_mut() {
            if let Some(post) = posts.iter_mut().find(|p| p.id == id) {
                update(post);
            }
            posts.retain(|p| filter.matches(p.status));
        }
        let len = self.review_posts().len();
        clamp_selection(&mut self.post_selected, len);
    }
}

impl Screen for HubScreen {
    fn begin_load(&mut self) {
        self.stats = Loadable::Loading;
        if self.has_review_posts() {
            self.posts = Loadable::Loading;
        }
    }

    fn wants_load(&self) -> bool {
        self.stats.is_loading() || self.posts.is_loading()
    }

    fn load(&mut self, api: &ApiClient) {
        if self.stats.is_loading() {
            self.stats = Loadable::from_result(api.hub_stats(self.platform));
            let len = self.drafts().len();
            clamp_selection(&mut self.draft_selected, len);
            info!("{} hub loaded", self.platform);
        }
        if self.posts.is_loading() {
            self.load_posts(api);
        }
    }

    fn error(&self) -> Option<&str> {
        self.stats.error().or_else(|| self.posts.error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(id: &str, status: PostStatus) -> ReviewPost {
        ReviewPost {
            id: id.to_string(),
            status,
            ..Default::default()
        }
    }

    #[test]
    fn only_x_hub_has_posts_panel() {
        let mut tiktok = HubScreen::new(Platform::TikTok);
        tiktok.begin_load();
        assert!(tiktok.stats.is_loading());
        assert!(!tiktok.posts.is_loading());
        tiktok.toggle_focus();
        assert_eq!(tiktok.focus, HubFocus::Drafts);

        let mut x = HubScreen::new(Platform::X);
        x.begin_load();
        assert!(x.posts.is_loading());
        x.toggle_focus();
        assert_eq!(x.focus, HubFocus::Posts);
    }

    #[test]
    fn patched_post_leaves_filtered_view() {
        let mut hub = HubScreen::new(Platform::X);
        hub.posts = Loadable::Loaded(vec![
            post("1", PostStatus::Pending),
            post("2", PostStatus::Pending),
        ]);
        hub.post_selected = 1;
        hub.patch_post("2", |p| p.status = PostStatus::Draft);
        assert_eq!(hub.review_posts().len(), 1);
        assert_eq!(hub.post_selected, 0);
    }

    #[test]
    fn patched_post_stays_under_all_filter() {
        let mut hub = HubScreen::new(Platform::X);
        hub.post_filter = PostFilter::All;
        hub.posts = Loadable::Loaded(vec![post("1", PostStatus::Pending)]);
        hub.patch_post("1", |p| p.status = PostStatus::Approved);
        assert_eq!(hub.review_posts()[0].status, PostStatus::Approved);
    }

    #[test]
    fn cycle_filter_requests_reload() {
        let mut hub = HubScreen::new(Platform::X);
        hub.cycle_filter();
        assert_eq!(hub.post_filter, PostFilter::Draft);
        assert!(hub.wants_load());
    }
}
