use tracing::{info, warn};

use super::{Loadable, Screen, clamp_selection};
use crate::ai::AiService;
use crate::api::{ApiClient, Result};
use crate::model::{DecisionAck, DecisionRequest, ReviewItem, ReviewQueue};

/// Review queue: one drafted reply at a time, stepped by index.
#[derive(Debug, Default)]
pub struct ReviewScreen {
    pub queue: Loadable<ReviewQueue>,
    pub index: usize,
}

impl ReviewScreen {
    pub fn items(&self) -> &[ReviewItem] {
        self.queue.loaded().map(|q| q.items.as_slice()).unwrap_or(&[])
    }

    pub fn current(&self) -> Option<&ReviewItem> {
        self.items().get(self.index)
    }

    pub fn next(&mut self) {
        let len = self.items().len();
        super::select_next(&mut self.index, len);
    }

    pub fn prev(&mut self) {
        super::select_prev(&mut self.index);
    }

    /// Approve the current draft as-is.
    pub fn approve(&mut self, api: &ApiClient) -> Result<Option<DecisionAck>> {
        self.decide_current(api, DecisionRequest::approve())
    }

    pub fn reject(&mut self, api: &ApiClient, reason: Option<String>) -> Result<Option<DecisionAck>> {
        let reason = reason.filter(|r| !r.trim().is_empty());
        self.decide_current(api, DecisionRequest::reject(reason))
    }

    /// Approve with operator-edited text.
    pub fn edit(&mut self, api: &ApiClient, text: &str) -> Result<Option<DecisionAck>> {
        self.decide_current(api, DecisionRequest::approve_edited(text.trim()))
    }

    /// Ask the backend for a fresh draft and replace the local proposed text.
    /// Nothing is persisted until the item is approved.
    pub fn regenerate(&mut self, api: &ApiClient) -> Result<Option<String>> {
        let Some(item) = self.current() else {
            return Ok(None);
        };
        let context = item.post_context();
        let draft = AiService::new(api).draft_comment(&context, item.author(), &[])?;
        let index = self.index;
        if let Some(item) = self
            .queue
            .loaded_mut()
            .and_then(|q| q.items.get_mut(index))
        {
            item.proposed_text = draft.clone();
        }
        Ok(Some(draft))
    }

    fn decide_current(
        &mut self,
        api: &ApiClient,
        request: DecisionRequest,
    ) -> Result<Option<DecisionAck>> {
        let Some(id) = self.current().map(|item| item.id.clone()) else {
            return Ok(None);
        };
        match api.decide(&id, &request) {
            Ok(ack) => {
                info!("review item {id}: {:?}", request.decision);
                self.remove(&id);
                Ok(Some(ack))
            }
            Err(err) => {
                warn!("decision on {id} failed: {err}");
                Err(err)
            }
        }
    }

    fn remove(&mut self, id: &str) {
        if let Some(queue) = self.queue.loaded_mut() {
            let before = queue.items.len();
            queue.items.retain(|item| item.id != id);
            if queue.items.len() < before
                && let Some(count) = queue.pending_count.as_mut()
            {
                *count = count.saturating_sub(1);
            }
            let len = queue.items.len();
            clamp_selection(&mut self.index, len);
        }
    }
}

impl Screen for ReviewScreen {
    fn begin_load(&mut self) {
        self.queue = Loadable::Loading;
    }

    fn wants_load(&self) -> bool {
        self.queue.is_loading()
    }

    fn load(&mut self, api: &ApiClient) {
        self.queue = Loadable::from_result(api.review_queue());
        if let Some(queue) = self.queue.loaded() {
            info!("review queue loaded: {} items", queue.items.len());
        }
        let len = self.items().len();
        clamp_selection(&mut self.index, len);
    }

    fn error(&self) -> Option<&str> {
        self.queue.error()
    }
}
