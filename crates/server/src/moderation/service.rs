use std::collections::HashMap;

use domain::{
    reconcile, Comment, CommentFilter, CommentStatus, LookupError, Page, ReconciliationRequest,
    ReconciliationResult,
};
use thiserror::Error;
use tracing::{debug, error, info};

use super::store::{CommentInvalidator, ModerationStore, ModerationWriter};
use super::view::{ManagementView, UpdateForm};

const LOOKUP_ERROR: &str = "Error looking up comments";
const BULK_DELETE_ERROR: &str = "Bulk delete failed due to unexpected error";
const UPDATE_SUCCESS: &str = "commentManagement.updateSuccess";
const UPDATE_ERROR: &str = "commentManagement.updateError";

#[derive(Debug, Error)]
pub enum ModerationError {
    #[error("comment not found: {0}")]
    NotFound(String),
    #[error("persistence failure: {0:#}")]
    Persistence(anyhow::Error),
    #[error("query failure: {0:#}")]
    Query(anyhow::Error),
}

impl From<LookupError> for ModerationError {
    fn from(e: LookupError) -> Self {
        match e {
            LookupError::NotFound(id) => ModerationError::NotFound(id),
        }
    }
}

/// Global comment management: listing, bulk delete and bulk update.
pub struct CommentModeration<S, C> {
    store: S,
    invalidator: C,
    page_size: i64,
}

impl<S, C> CommentModeration<S, C>
where
    S: ModerationStore,
    C: CommentInvalidator,
{
    pub fn new(store: S, invalidator: C, page_size: i64) -> Self {
        Self {
            store,
            invalidator,
            page_size,
        }
    }

    fn fresh_filter(&self) -> CommentFilter {
        CommentFilter::with_page_size(self.page_size)
    }

    /// Newest first; one extra row is fetched to detect a following page.
    pub async fn fetch_page(
        &self,
        filter: &CommentFilter,
    ) -> Result<Page<Comment>, ModerationError> {
        let page_size = filter.page_size();
        let rows = self
            .store
            .query_comments(
                filter,
                true,
                filter.offset(),
                Some(Page::<Comment>::overfetch_limit(page_size)),
            )
            .await
            .map_err(ModerationError::Query)?;
        Ok(Page::from_overfetch(rows, page_size))
    }

    async fn load_comments(&self, view: &mut ManagementView) {
        match self.fetch_page(&view.filter).await {
            Ok(page) => view.load_page(page),
            Err(e) => {
                error!("Error looking up comments: {:?}", e);
                view.errors.push(LOOKUP_ERROR.to_string());
            }
        }
    }

    pub async fn list(&self, filter: CommentFilter) -> ManagementView {
        let mut view = ManagementView::new(filter);
        self.load_comments(&mut view).await;
        view
    }

    /// Like [`list`](Self::list), also reporting how many comments a bulk
    /// delete would remove when the matches span more than one page.
    pub async fn query(&self, filter: CommentFilter) -> ManagementView {
        let mut view = self.list(filter).await;

        match self.store.count_matching_comments(&view.filter).await {
            Ok(total) if total > view.filter.page_size() => view.bulk_delete_count = total,
            Ok(_) => {}
            Err(e) => {
                error!("Error looking up comments: {:?}", e);
                view.errors.push(LOOKUP_ERROR.to_string());
            }
        }
        view
    }

    pub async fn bulk_delete(
        &self,
        filter: CommentFilter,
    ) -> Result<ManagementView, ManagementView> {
        match self.store.remove_matching_comments(&filter).await {
            Ok(removal) => {
                info!("Bulk delete removed {} comments", removal.removed);
                for (site_id, slug) in &removal.posts {
                    self.invalidator.invalidate_post(site_id, slug).await;
                }
                let mut view = self.list(self.fresh_filter()).await;
                view.messages
                    .insert(0, format!("Successfully deleted {} comments", removal.removed));
                Ok(view)
            }
            Err(e) => {
                error!("Error doing bulk delete: {:?}", e);
                let mut view = self.list(filter).await;
                view.errors.push(BULK_DELETE_ERROR.to_string());
                Err(view)
            }
        }
    }

    pub async fn update(&self, form: UpdateForm) -> Result<ManagementView, ManagementView> {
        let request =
            ReconciliationRequest::from_form(&form.ids, form.delete_comments, form.spam_comments);

        match self.apply_update(&request).await {
            Ok(_) => {
                let mut view = self.list(self.fresh_filter()).await;
                view.messages.insert(0, UPDATE_SUCCESS.to_string());
                Ok(view)
            }
            Err(e) => {
                error!("ERROR updating comments: {:?}", e);
                let mut view = self.list(form.filter).await;
                view.errors.push(format!("{}: {}", UPDATE_ERROR, e));
                Err(view)
            }
        }
    }

    /// Reconciles the submitted checkboxes against current statuses and commits
    /// the resulting writes in one session. Caches are only invalidated once
    /// the session has been flushed.
    pub async fn apply_update(
        &self,
        request: &ReconciliationRequest,
    ) -> Result<ReconciliationResult, ModerationError> {
        debug!(
            "Processing update - {} displayed, {} deletes, {} marked as spam",
            request.displayed_ids.len(),
            request.delete_ids.len(),
            request.spam_ids.len()
        );

        let mut wanted: Vec<String> = request
            .displayed_ids
            .iter()
            .chain(request.delete_ids.iter())
            .cloned()
            .collect();
        wanted.sort();
        wanted.dedup();

        let snapshot: HashMap<String, Comment> = self
            .store
            .comments_by_ids(&wanted)
            .await
            .map_err(ModerationError::Persistence)?
            .into_iter()
            .map(|c| (c.id.clone(), c))
            .collect();

        if let Some(missing) = request
            .delete_ids
            .iter()
            .find(|id| !snapshot.contains_key(id.as_str()))
        {
            return Err(ModerationError::NotFound(missing.clone()));
        }

        let result = reconcile(request, |id| {
            snapshot
                .get(id)
                .map(|c| c.status)
                .ok_or_else(|| LookupError::NotFound(id.to_string()))
        })?;

        if result.is_empty() {
            debug!("Nothing to update");
            return Ok(result);
        }

        let mut session = self
            .store
            .begin()
            .await
            .map_err(ModerationError::Persistence)?;

        for id in &result.to_delete {
            debug!("Deleting - {}", id);
            let removed = session
                .remove_comment(id)
                .await
                .map_err(ModerationError::Persistence)?;
            if !removed {
                return Err(ModerationError::NotFound(id.clone()));
            }
        }
        let status_changes = result
            .to_mark_spam
            .iter()
            .map(|id| (id, CommentStatus::Spam))
            .chain(
                result
                    .to_unmark_spam
                    .iter()
                    .map(|id| (id, CommentStatus::Approved)),
            );
        for (id, status) in status_changes {
            debug!("Marking as {} - {}", status, id);
            let saved = session
                .save_status(id, status)
                .await
                .map_err(ModerationError::Persistence)?;
            if !saved {
                return Err(ModerationError::NotFound(id.clone()));
            }
        }

        session.flush().await.map_err(ModerationError::Persistence)?;

        for id in &result.affected {
            if let Some(comment) = snapshot.get(id) {
                self.invalidator.invalidate(comment).await;
            }
        }

        info!(
            "Updated comments: {} deleted, {} marked as spam, {} approved",
            result.to_delete.len(),
            result.to_mark_spam.len(),
            result.to_unmark_spam.len()
        );
        Ok(result)
    }
}
